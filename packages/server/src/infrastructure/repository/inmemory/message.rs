//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する MessageRepository trait の具体的な実装。
//! ルームごとのメッセージ列を HashMap に保持します。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Message, MessageId, MessageRepository, RepositoryError, RoomId};

/// ルームごとのメッセージ列（追記のみ）
#[derive(Debug, Default)]
struct RoomLog {
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
}

/// インメモリ Message Repository 実装
#[derive(Debug, Default)]
pub struct InMemoryMessageRepository {
    rooms: Mutex<HashMap<RoomId, RoomLog>>,
}

impl InMemoryMessageRepository {
    /// 新しい InMemoryMessageRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: Message) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let log = rooms.entry(message.room_id.clone()).or_default();
        if !log.ids.insert(message.id.clone()) {
            return Err(RepositoryError::DuplicateMessageId(
                message.id.as_str().to_string(),
            ));
        }
        log.messages.push(message);
        Ok(())
    }

    async fn find(
        &self,
        room_id: &RoomId,
        message_id: &MessageId,
    ) -> Result<Option<Message>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .get(room_id)
            .and_then(|log| log.messages.iter().find(|m| &m.id == message_id))
            .cloned())
    }

    async fn recent(&self, room_id: &RoomId, limit: usize) -> Result<Vec<Message>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let Some(log) = rooms.get(room_id) else {
            return Ok(Vec::new());
        };
        let start = log.messages.len().saturating_sub(limit);
        Ok(log.messages[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Author, DisplayName, MessageBody, MessageDraft, MessageIdFactory, MessageKind, Timestamp,
        UserId,
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryMessageRepository の追記・検索・最新 N 件取得
    //
    // 【なぜこのテストが必要か】
    // - 履歴取得 API は「最新 N 件を時系列順」で返す必要がある
    // - メッセージ ID はルーム内で一意でなければならない
    //
    // 【どのようなシナリオをテストするか】
    // 1. 追記と検索
    // 2. 同じ ID の二重保存（エラーケース）
    // 3. 最新 N 件の取得（古い順で返される）
    // 4. 存在しないルームの取得
    // ========================================

    fn message(room: &str, body: &str, at: i64) -> Message {
        MessageDraft::new(
            RoomId::new(room.to_string()).unwrap(),
            Author {
                user_id: UserId::new("alice".to_string()).unwrap(),
                display_name: DisplayName::new("Alice".to_string()).unwrap(),
                avatar: None,
            },
            MessageBody::new(body.to_string()).unwrap(),
            MessageKind::Text,
            None,
            None,
        )
        .unwrap()
        .into_message(MessageIdFactory::generate(), Timestamp::new(at), None)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        // テスト項目: 保存したメッセージを ID で検索できる
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();
        let msg = message("R1", "hi", 1000);

        // when (操作):
        repo.insert(msg.clone()).await.unwrap();
        let found = repo.find(&msg.room_id, &msg.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(found, Some(msg));
    }

    #[tokio::test]
    async fn test_find_is_scoped_to_room() {
        // テスト項目: 別ルームのメッセージは検索されない
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();
        let msg = message("R1", "hi", 1000);
        repo.insert(msg.clone()).await.unwrap();

        // when (操作):
        let other_room = RoomId::new("R2".to_string()).unwrap();
        let found = repo.find(&other_room, &msg.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_is_rejected() {
        // テスト項目: 同じ ID のメッセージを二重に保存できない
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();
        let msg = message("R1", "hi", 1000);
        repo.insert(msg.clone()).await.unwrap();

        // when (操作):
        let result = repo.insert(msg.clone()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::DuplicateMessageId(msg.id.as_str().to_string()))
        );
        assert_eq!(repo.recent(&msg.room_id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recent_returns_newest_in_chronological_order() {
        // テスト項目: 最新 N 件が古い順で返される
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();
        for (i, body) in ["one", "two", "three", "four"].iter().enumerate() {
            repo.insert(message("R1", body, 1000 + i as i64)).await.unwrap();
        }

        // when (操作):
        let room = RoomId::new("R1".to_string()).unwrap();
        let result = repo.recent(&room, 2).await.unwrap();

        // then (期待する結果):
        let bodies: Vec<&str> = result.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["three", "four"]);
    }

    #[tokio::test]
    async fn test_recent_for_unknown_room_is_empty() {
        // テスト項目: メッセージのないルームの履歴は空
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();

        // when (操作):
        let room = RoomId::new("empty".to_string()).unwrap();
        let result = repo.recent(&room, 50).await.unwrap();

        // then (期待する結果):
        assert!(result.is_empty());
    }
}
