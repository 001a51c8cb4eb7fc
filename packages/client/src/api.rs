//! Client for the REST persistence API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use studyhall_shared::dto::{ErrorResponse, HistoryResponse, MessageDto, SendMessageRequest};

use crate::error::ClientError;

/// Persistence operations the chat client depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Persist a message and return the canonical record (id and timestamp set)
    async fn send_message(&self, request: SendMessageRequest) -> Result<MessageDto, ClientError>;

    /// Fetch up to `limit` of the most recent messages of a room
    async fn fetch_history(&self, room_id: &str, limit: usize) -> Result<Vec<MessageDto>, ClientError>;
}

/// [`ChatApi`] over HTTP, using reqwest
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpChatApi {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("'{}' cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn send_message(&self, request: SendMessageRequest) -> Result<MessageDto, ClientError> {
        let url = self.endpoint(&["chat", "send"])?;
        tracing::debug!("POST {} (room '{}')", url, request.room_id);

        let response = self.client.post(url).json(&request).send().await?;
        read_json(response).await
    }

    async fn fetch_history(&self, room_id: &str, limit: usize) -> Result<Vec<MessageDto>, ClientError> {
        let url = self.endpoint(&["chat", "group", room_id])?;
        tracing::debug!("GET {} (limit {})", url, limit);

        let response = self
            .client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        let history: HistoryResponse = read_json(response).await?;
        Ok(history.messages)
    }
}

/// Decode a success body, or turn an error status into [`ClientError::Api`]
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Protocol(e.to_string()));
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    tracing::warn!("Chat API returned {}: {}", status, message);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
