//! UseCase 層
//!
//! 1 ファイル 1 ユースケース。UI 層（HTTP / WebSocket ハンドラ）から呼ばれ、
//! ドメイン層の trait（Repository, MembershipRegistry, MessagePusher）にのみ依存します。

mod connect_session;
mod disconnect_session;
mod error;
mod fetch_history;
mod join_room;
mod leave_room;
mod relay_typing;
mod send_message;

pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{FetchHistoryError, RelayTypingError, SendMessageError};
pub use fetch_history::{DEFAULT_HISTORY_LIMIT, FetchHistoryUseCase, MAX_HISTORY_LIMIT};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use relay_typing::RelayTypingUseCase;
pub use send_message::SendMessageUseCase;
