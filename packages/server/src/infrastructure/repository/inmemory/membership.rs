//! InMemory Membership Registry 実装
//!
//! `RoomMembership` ドメインモデルを Mutex で保護して保持します。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{MembershipRegistry, RoomId, RoomMembership, SessionId};

/// インメモリ所属登録簿
#[derive(Debug, Default)]
pub struct InMemoryMembershipRegistry {
    membership: Mutex<RoomMembership>,
}

impl InMemoryMembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipRegistry for InMemoryMembershipRegistry {
    async fn join(&self, session_id: &SessionId, room_id: &RoomId) -> bool {
        self.membership.lock().await.join(session_id, room_id)
    }

    async fn leave(&self, session_id: &SessionId, room_id: &RoomId) -> bool {
        self.membership.lock().await.leave(session_id, room_id)
    }

    async fn leave_all(&self, session_id: &SessionId) -> Vec<RoomId> {
        self.membership.lock().await.leave_all(session_id)
    }

    async fn members(&self, room_id: &RoomId) -> Vec<SessionId> {
        self.membership.lock().await.members(room_id)
    }

    async fn is_member(&self, session_id: &SessionId, room_id: &RoomId) -> bool {
        self.membership.lock().await.is_member(session_id, room_id)
    }
}
