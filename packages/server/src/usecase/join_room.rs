//! UseCase: ルーム参加処理

use std::sync::Arc;

use crate::domain::{MembershipRegistry, RoomId, SessionId};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    registry: Arc<dyn MembershipRegistry>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(registry: Arc<dyn MembershipRegistry>) -> Self {
        Self { registry }
    }

    /// ルームに参加する（冪等）
    ///
    /// # Returns
    ///
    /// 新規に参加した場合 `true`、既に参加済みの場合 `false`
    pub async fn execute(&self, session_id: &SessionId, room_id: &RoomId) -> bool {
        let joined = self.registry.join(session_id, room_id).await;
        if joined {
            tracing::info!(
                "Session '{}' joined room '{}'",
                session_id.as_str(),
                room_id.as_str()
            );
        } else {
            tracing::debug!(
                "Session '{}' already in room '{}'",
                session_id.as_str(),
                room_id.as_str()
            );
        }
        joined
    }
}
