//! UseCase: メッセージ送信処理
//!
//! ## 処理の流れ
//!
//! 1. 返信先があれば同じルーム内から検索し、返信参照（スニペット）を作成
//! 2. ID とタイムスタンプを採番して永続化（同期的な書き込み）
//! 3. UI 層が DTO に変換した JSON を、ルームに参加中の全セッションへブロードキャスト
//!
//! 送信者自身のセッションもブロードキャスト対象に含まれる。
//! 送信者側のクライアントはメッセージ ID による重複排除でエコーを吸収する。

use std::sync::Arc;

use studyhall_shared::time::Clock;

use crate::domain::{
    MembershipRegistry, Message, MessageDraft, MessageIdFactory, MessagePusher,
    MessageRepository, RoomId, SessionId, Timestamp,
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn MessageRepository>,
    /// ルーム所属の登録簿
    registry: Arc<dyn MembershipRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// タイムスタンプの採番に使う時計
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        registry: Arc<dyn MembershipRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            registry,
            message_pusher,
            clock,
        }
    }

    /// メッセージを永続化し、正規のレコードを返す
    ///
    /// # Returns
    ///
    /// * `Ok(Message)` - ID・タイムスタンプ採番済みのメッセージ
    /// * `Err(SendMessageError)` - 返信先が存在しない、または永続化に失敗
    pub async fn execute(&self, draft: MessageDraft) -> Result<Message, SendMessageError> {
        // 1. 返信参照を解決
        let reply_to = match &draft.reply_to_id {
            Some(reply_to_id) => {
                let target = self
                    .repository
                    .find(&draft.room_id, reply_to_id)
                    .await
                    .map_err(|e| SendMessageError::Repository(e.to_string()))?
                    .ok_or_else(|| {
                        SendMessageError::ReplyTargetNotFound(reply_to_id.as_str().to_string())
                    })?;
                Some(target.reply_ref())
            }
            None => None,
        };

        // 2. 採番して永続化
        let message = draft.into_message(
            MessageIdFactory::generate(),
            Timestamp::new(self.clock.now_millis()),
            reply_to,
        );
        self.repository
            .insert(message.clone())
            .await
            .map_err(|e| SendMessageError::Repository(e.to_string()))?;

        tracing::info!(
            "Stored message '{}' in room '{}' from '{}'",
            message.id.as_str(),
            message.room_id.as_str(),
            message.author.user_id.as_str()
        );

        Ok(message)
    }

    /// 永続化済みメッセージをルームの全メンバーにブロードキャスト
    ///
    /// # Arguments
    ///
    /// * `room_id` - 対象ルーム
    /// * `json_message` - 送信する JSON（DTO 層で生成されたもの）
    ///
    /// # Returns
    ///
    /// ブロードキャスト対象のセッション
    pub async fn broadcast_new_message(
        &self,
        room_id: &RoomId,
        json_message: &str,
    ) -> Result<Vec<SessionId>, SendMessageError> {
        let targets = self.registry.members(room_id).await;
        self.message_pusher
            .broadcast(targets.clone(), json_message)
            .await
            .map_err(|e| SendMessageError::BroadcastFailed(e.to_string()))?;
        Ok(targets)
    }
}
