//! Real-time group chat client for Studyhall.
//!
//! The core is [`ChatClient`]: it keeps one WebSocket connection to the chat
//! server (reconnecting with backoff), tracks joined rooms, merges fetched
//! history with live broadcasts and its own sends without duplicates, and
//! maintains typing presence. The [`terminal`] module is a line-oriented
//! chat UI on top of it.

pub mod api;
pub mod channel;
pub mod chat;
pub mod config;
pub mod connection;
pub mod error;
pub mod reconcile;
pub mod room;
pub mod terminal;
pub mod typing;

pub use api::{ChatApi, HttpChatApi};
pub use channel::{HandlerId, MessageDraft};
pub use chat::{ChatClient, ChatUpdate};
pub use config::ClientConfig;
pub use connection::{BackoffPolicy, ConnectionState};
pub use error::ClientError;
