//! UseCase: ルーム退出処理

use std::sync::Arc;

use crate::domain::{MembershipRegistry, RoomId, SessionId};

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    registry: Arc<dyn MembershipRegistry>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(registry: Arc<dyn MembershipRegistry>) -> Self {
        Self { registry }
    }

    /// ルームから退出する（冪等）。退出後はそのルームの配信を受け取らない
    pub async fn execute(&self, session_id: &SessionId, room_id: &RoomId) -> bool {
        let left = self.registry.leave(session_id, room_id).await;
        if left {
            tracing::info!(
                "Session '{}' left room '{}'",
                session_id.as_str(),
                room_id.as_str()
            );
        }
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::SessionIdFactory, infrastructure::repository::InMemoryMembershipRegistry};

    #[tokio::test]
    async fn test_leave_when_not_joined_is_noop() {
        // テスト項目: 参加していないルームからの退出は何もしない
        // given (前提条件):
        let registry = Arc::new(InMemoryMembershipRegistry::new());
        let usecase = LeaveRoomUseCase::new(registry.clone());
        let session = SessionIdFactory::generate();
        let room = RoomId::new("R1".to_string()).unwrap();

        // when (操作):
        let result = usecase.execute(&session, &room).await;

        // then (期待する結果):
        assert!(!result);
        assert!(registry.members(&room).await.is_empty());
    }

    #[tokio::test]
    async fn test_leave_after_join() {
        // テスト項目: 参加済みのルームから退出できる
        // given (前提条件):
        let registry = Arc::new(InMemoryMembershipRegistry::new());
        let usecase = LeaveRoomUseCase::new(registry.clone());
        let session = SessionIdFactory::generate();
        let room = RoomId::new("R1".to_string()).unwrap();
        registry.join(&session, &room).await;

        // when (操作):
        let result = usecase.execute(&session, &room).await;

        // then (期待する結果):
        assert!(result);
        assert!(!registry.is_member(&session, &room).await);
    }
}
