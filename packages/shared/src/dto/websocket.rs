//! WebSocket pub/sub event DTOs.
//!
//! Every frame is a JSON object tagged by `type`. Payloads are validated at the
//! connection boundary by deserializing into these enums; anything else is rejected.

use serde::{Deserialize, Serialize};

use super::http::MessageDto;

/// Client → Server events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Start receiving broadcasts for a room
    JoinGroup { room_id: String },
    /// Stop receiving broadcasts for a room
    LeaveGroup { room_id: String },
    /// Local user started (or keeps) typing
    TypingStart {
        room_id: String,
        user_id: String,
        user_name: String,
    },
    /// Local user stopped typing
    TypingStop { room_id: String, user_id: String },
}

/// Server → Client events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// First frame on every connection, carrying the server-assigned session id
    Connected { session_id: String },
    /// A message was persisted in a joined room
    NewMessage { message: MessageDto },
    /// Another member of a joined room is typing
    UserTyping {
        room_id: String,
        user_id: String,
        user_name: String,
    },
    /// Another member of a joined room stopped typing
    UserStopTyping { room_id: String, user_id: String },
    /// Out-of-band error (e.g. a malformed client frame)
    Error { message: String },
}

impl ClientEvent {
    /// Room the event refers to
    pub fn room_id(&self) -> &str {
        match self {
            Self::JoinGroup { room_id }
            | Self::LeaveGroup { room_id }
            | Self::TypingStart { room_id, .. }
            | Self::TypingStop { room_id, .. } => room_id,
        }
    }
}
