//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{Message, MessageId, RepositoryError, RoomId};

/// Message Repository trait
///
/// メッセージの永続化ストアへのインターフェース。
/// メッセージは追記のみで、作成後に更新・削除されることはない。
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを保存（同じ ID が既に存在する場合はエラー）
    async fn insert(&self, message: Message) -> Result<(), RepositoryError>;

    /// ルーム内のメッセージを ID で検索
    async fn find(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
    ) -> Result<Option<Message>, RepositoryError>;

    /// ルームの最新 `limit` 件を時系列順（古い順）で取得
    async fn recent(&self, room_id: &RoomId, limit: usize) -> Result<Vec<Message>, RepositoryError>;
}
