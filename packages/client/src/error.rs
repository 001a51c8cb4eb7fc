//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The WebSocket connection could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// No usable connection (never connected, disconnected, or retries exhausted)
    #[error("Disconnected from chat server")]
    Disconnected,

    /// The operation targets a room this client has not joined
    #[error("Room '{0}' is not joined")]
    NotJoined(String),

    /// The persistence API rejected the request
    #[error("Chat API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The persistence API could not be reached
    #[error("Request failed: {0}")]
    Transport(String),

    /// A request or handshake did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// The peer sent something that does not match the wire protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid client configuration (e.g. a malformed server URL)
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Protocol(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl ClientError {
    /// Whether retrying the same operation later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) | Self::Disconnected | Self::Connection(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::NotJoined(_) | Self::Protocol(_) | Self::Config(_) => false,
        }
    }
}
