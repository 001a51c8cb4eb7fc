//! UseCase: タイピング通知の中継
//!
//! typing-start / typing-stop を同じルームの他のセッションへ中継する。
//! タイピング状態はサーバーでは保持しない（有効期限の管理は受信側クライアントが行う）。

use std::sync::Arc;

use crate::domain::{MembershipRegistry, MessagePusher, RoomId, SessionId};

use super::error::RelayTypingError;

/// タイピング通知中継のユースケース
pub struct RelayTypingUseCase {
    registry: Arc<dyn MembershipRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelayTypingUseCase {
    /// 新しい RelayTypingUseCase を作成
    pub fn new(
        registry: Arc<dyn MembershipRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// タイピング通知を中継
    ///
    /// # Arguments
    ///
    /// * `from` - 送信元セッション（中継対象から除外される）
    /// * `room_id` - 対象ルーム
    /// * `json_event` - 送信する JSON（DTO 層で生成されたもの）
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SessionId>)` - 中継先のセッション
    /// * `Err(RelayTypingError::NotJoined)` - 送信元がルームに参加していない
    pub async fn execute(
        &self,
        from: &SessionId,
        room_id: &RoomId,
        json_event: &str,
    ) -> Result<Vec<SessionId>, RelayTypingError> {
        if !self.registry.is_member(from, room_id).await {
            return Err(RelayTypingError::NotJoined(room_id.as_str().to_string()));
        }

        let targets: Vec<SessionId> = self
            .registry
            .members(room_id)
            .await
            .into_iter()
            .filter(|session| session != from)
            .collect();

        self.message_pusher
            .broadcast(targets.clone(), json_event)
            .await
            .map_err(|e| RelayTypingError::BroadcastFailed(e.to_string()))?;

        Ok(targets)
    }
}
