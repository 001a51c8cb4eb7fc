//! UseCase: 履歴取得処理

use std::sync::Arc;

use crate::domain::{Message, MessageRepository, RoomId};

use super::error::FetchHistoryError;

/// `limit` 省略時の取得件数
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
/// 一度に取得できる最大件数
pub const MAX_HISTORY_LIMIT: usize = 200;

/// 履歴取得のユースケース
pub struct FetchHistoryUseCase {
    repository: Arc<dyn MessageRepository>,
}

impl FetchHistoryUseCase {
    /// 新しい FetchHistoryUseCase を作成
    pub fn new(repository: Arc<dyn MessageRepository>) -> Self {
        Self { repository }
    }

    /// ルームの最新メッセージを時系列順で取得
    ///
    /// `limit` は 1..=200 に丸められる（省略時は 50）。
    pub async fn execute(
        &self,
        room_id: &RoomId,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, FetchHistoryError> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        self.repository
            .recent(room_id, limit)
            .await
            .map_err(|e| FetchHistoryError::Repository(e.to_string()))
    }
}
