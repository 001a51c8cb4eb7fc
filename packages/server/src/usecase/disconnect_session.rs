//! UseCase: セッション切断処理
//!
//! 切断されたセッションのルーム所属は全て破棄される。
//! 所属はサーバー側でユーザー単位に保存しないため、再接続したクライアントは
//! 自分で参加し直す必要がある。

use std::sync::Arc;

use crate::domain::{MembershipRegistry, MessagePusher, RoomId, SessionId};

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    registry: Arc<dyn MembershipRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectSessionUseCase {
    /// 新しい DisconnectSessionUseCase を作成
    pub fn new(
        registry: Arc<dyn MembershipRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// セッション切断を実行
    ///
    /// # Returns
    ///
    /// 切断時に参加していたルームのリスト
    pub async fn execute(&self, session_id: &SessionId) -> Vec<RoomId> {
        let rooms = self.registry.leave_all(session_id).await;
        self.message_pusher.unregister_session(session_id).await;
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryMembershipRegistry,
    };

    #[tokio::test]
    async fn test_disconnect_drops_all_memberships() {
        // テスト項目: 切断すると全ルームの所属と送信チャンネルが破棄される
        // given (前提条件):
        let registry = Arc::new(InMemoryMembershipRegistry::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = DisconnectSessionUseCase::new(registry.clone(), pusher.clone());

        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let session = crate::domain::SessionIdFactory::generate();
        pusher.register_session(session.clone(), tx).await;
        let r1 = RoomId::new("R1".to_string()).unwrap();
        let r2 = RoomId::new("R2".to_string()).unwrap();
        registry.join(&session, &r1).await;
        registry.join(&session, &r2).await;

        // when (操作):
        let left = usecase.execute(&session).await;

        // then (期待する結果):
        assert_eq!(left, vec![r1.clone(), r2.clone()]);
        assert!(registry.members(&r1).await.is_empty());
        assert!(registry.members(&r2).await.is_empty());
        assert_eq!(pusher.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_session_is_noop() {
        // テスト項目: 未知のセッションの切断は何もしない
        // given (前提条件):
        let registry = Arc::new(InMemoryMembershipRegistry::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = DisconnectSessionUseCase::new(registry, pusher);

        // when (操作):
        let left = usecase
            .execute(&crate::domain::SessionIdFactory::generate())
            .await;

        // then (期待する結果):
        assert!(left.is_empty());
    }
}
