//! Studyhall group chat server.
//!
//! Provides the message persistence API (`POST /chat/send`, `GET /chat/group/{roomId}`)
//! and the WebSocket pub/sub layer that fans stored messages and typing signals out
//! to every connection joined to a room.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
