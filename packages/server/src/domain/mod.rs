//! ドメイン層
//!
//! - `value_object`: 検証済みの値オブジェクト（RoomId, UserId, MessageBody など）
//! - `entity`: メッセージエンティティ
//! - `membership`: セッションとルームの所属関係
//! - `repository` / `pusher` / `registry`: Infrastructure 層が実装する trait（依存性の逆転）

pub mod entity;
pub mod error;
pub mod membership;
pub mod pusher;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use entity::{Author, Message, MessageDraft, MessageKind, ReplyRef, ResourceRef};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use membership::RoomMembership;
pub use pusher::{MessagePusher, PusherChannel};
#[cfg(test)]
pub use pusher::MockMessagePusher;
pub use registry::MembershipRegistry;
pub use repository::MessageRepository;
pub use value_object::{
    DisplayName, MessageBody, MessageId, MessageIdFactory, RoomId, SessionId, SessionIdFactory,
    Timestamp, UserId,
};
