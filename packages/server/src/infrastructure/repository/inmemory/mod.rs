//! InMemory 実装

pub mod membership;
pub mod message;

pub use membership::InMemoryMembershipRegistry;
pub use message::InMemoryMessageRepository;
