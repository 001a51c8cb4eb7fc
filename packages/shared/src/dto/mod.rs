//! Data Transfer Objects (DTOs) for the chat application.
//!
//! DTOs are organized by protocol:
//! - `http`: REST persistence API request/response DTOs (and the message record itself)
//! - `websocket`: pub/sub event DTOs

pub mod http;
pub mod websocket;

pub use http::{
    AuthorDto, ErrorResponse, HistoryResponse, MessageDto, MessageKindDto, ReplyRefDto,
    ResourceRefDto, SendMessageRequest,
};
pub use websocket::{ClientEvent, ServerEvent};
