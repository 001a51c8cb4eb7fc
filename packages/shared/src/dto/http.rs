//! DTOs for the REST persistence API (`POST /chat/send`, `GET /chat/group/{roomId}`).

use serde::{Deserialize, Serialize};

/// Message kind on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKindDto {
    #[default]
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "resource-share")]
    ResourceShare,
}

/// Denormalized author information carried with every message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDto {
    pub user_id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Shared learning resource attached to a `resource-share` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRefDto {
    pub resource_id: String,
    pub resource_link: String,
}

/// Snippet of the message being replied to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRefDto {
    pub id: String,
    pub author_name: String,
    pub snippet: String,
}

/// Canonical stored message record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub room_id: String,
    pub author: AuthorDto,
    pub body: String,
    #[serde(default)]
    pub kind: MessageKindDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceRefDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyRefDto>,
    /// Unix timestamp in milliseconds, assigned by the server
    pub created_at: i64,
}

/// `POST /chat/send` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub room_id: String,
    pub message: String,
    #[serde(default)]
    pub kind: MessageKindDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub author: AuthorDto,
}

/// `GET /chat/group/{roomId}` response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageDto>,
}

/// Error body returned with 4xx/5xx responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
