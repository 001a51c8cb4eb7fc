//! HTTP / WebSocket handlers.

mod http;
mod websocket;

pub use http::{fetch_history, health_check, send_message};
pub use websocket::websocket_handler;
