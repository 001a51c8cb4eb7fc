//! Connection manager: one WebSocket per client, with automatic reconnect.

mod backoff;
mod manager;
#[cfg(test)]
pub(crate) mod test_server;

pub use backoff::BackoffPolicy;
#[cfg(test)]
pub(crate) use manager::LoopbackPeer;
pub use manager::ConnectionManager;

use studyhall_shared::dto::ServerEvent;

/// Observable state of the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected { session_id: String },
    /// Waiting for, or performing, the given reconnect attempt (1-indexed)
    Reconnecting { attempt: u32 },
    /// Reconnect attempts are exhausted; `connect` must be called again
    Failed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Whether the connection may still recover without a new `connect` call
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Disconnected | Self::Failed)
    }
}

/// What the connection delivers to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// A validated event from the server
    Server(ServerEvent),
    /// The link dropped unexpectedly; reconnecting has started
    Lost { reason: String },
    /// A new session replaced the lost one. Room subscriptions must be restored.
    Reconnected { session_id: String },
    /// Reconnect attempts are exhausted
    Failed,
}
