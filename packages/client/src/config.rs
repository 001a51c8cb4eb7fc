//! Client configuration.

use std::time::Duration;

use reqwest::Url;
use studyhall_shared::dto::AuthorDto;

use crate::{connection::BackoffPolicy, error::ClientError};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(250);
const DEFAULT_HISTORY_LIMIT: usize = 50;
const DEFAULT_TYPING_QUIET_PERIOD: Duration = Duration::from_secs(2);
const DEFAULT_TYPING_EXPIRY: Duration = Duration::from_secs(3);
const DEFAULT_TYPING_HEARTBEAT: Duration = Duration::from_secs(2);

/// Settings for a [`ChatClient`](crate::chat::ChatClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HTTP base URL of the chat server; the WebSocket URL is derived from it
    pub server_url: String,
    /// The local user, embedded in every sent message
    pub identity: AuthorDto,
    /// Upper bound for persistence API calls
    pub request_timeout: Duration,
    pub backoff: BackoffPolicy,
    /// How often typing deadlines are checked
    pub sweep_interval: Duration,
    /// Page size requested when a room's history is fetched
    pub history_limit: usize,
    /// Keystroke silence after which the local user stops typing
    pub typing_quiet_period: Duration,
    /// Age after which a remote typing entry without refresh is dropped
    pub typing_expiry: Duration,
    /// Interval at which `typing-start` is repeated during a long burst.
    /// Must stay below the peers' `typing_expiry`.
    pub typing_heartbeat: Duration,
}

impl ClientConfig {
    pub fn new(
        server_url: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            identity: AuthorDto {
                user_id: user_id.into(),
                user_name: user_name.into(),
                avatar: None,
            },
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            backoff: BackoffPolicy::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            history_limit: DEFAULT_HISTORY_LIMIT,
            typing_quiet_period: DEFAULT_TYPING_QUIET_PERIOD,
            typing_expiry: DEFAULT_TYPING_EXPIRY,
            typing_heartbeat: DEFAULT_TYPING_HEARTBEAT,
        }
    }

    /// Parsed HTTP base URL of the server
    pub fn base_url(&self) -> Result<Url, ClientError> {
        let url = Url::parse(&self.server_url)
            .map_err(|e| ClientError::Config(format!("invalid server url '{}': {}", self.server_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::Config(format!(
                "server url must use http or https, got '{}'",
                other
            ))),
        }
    }

    /// WebSocket endpoint carrying the user identity as query parameters
    ///
    /// `http://host:port` becomes `ws://host:port/ws?userId=..&userName=..`.
    pub fn websocket_url(&self) -> Result<String, ClientError> {
        let mut url = self.base_url()?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::Config(format!("cannot derive websocket url from '{}'", self.server_url)))?;
        url.set_path("/ws");
        url.query_pairs_mut()
            .clear()
            .append_pair("userId", &self.identity.user_id)
            .append_pair("userName", &self.identity.user_name);
        Ok(url.to_string())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL, "anonymous", "Anonymous")
    }
}
