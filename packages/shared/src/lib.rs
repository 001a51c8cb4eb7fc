//! Code shared by the Studyhall chat server and client.
//!
//! - `dto`: wire formats for the REST persistence API and the WebSocket pub/sub events
//! - `time`: clock abstraction and timestamp helpers
//! - `logger`: tracing subscriber setup for the binaries

pub mod dto;
pub mod logger;
pub mod time;
