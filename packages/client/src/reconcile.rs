//! Reconciliation of fetched history, live broadcasts and local echoes.
//!
//! A message may reach the client three ways: as part of a history page, as a
//! `new-message` broadcast, and as the response to its own send. All three
//! paths end in [`RoomTimeline`], which keeps exactly one copy per message id.

use std::collections::HashSet;

use studyhall_shared::dto::MessageDto;

/// The messages of one joined room, unique by id
#[derive(Debug, Default, Clone)]
pub struct RoomTimeline {
    messages: Vec<MessageDto>,
    ids: HashSet<String>,
}

impl RoomTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a broadcast message; `false` if it is already present
    pub fn apply_broadcast(&mut self, message: MessageDto) -> bool {
        self.append_unique(message)
    }

    /// Append the persisted copy of a message this client sent; `false` if
    /// its broadcast already arrived
    pub fn apply_local_echo(&mut self, message: MessageDto) -> bool {
        self.append_unique(message)
    }

    /// Merge a history page, returning how many messages were new
    ///
    /// The page is put in chronological order first. Each new message is
    /// inserted before the first present message with a later `created_at`,
    /// so fetched history reads chronologically and live arrivals keep their
    /// relative order.
    pub fn apply_history(&mut self, page: Vec<MessageDto>) -> usize {
        let mut added = 0;
        for message in normalize_history(page) {
            if self.ids.contains(&message.id) {
                continue;
            }
            let position = self
                .messages
                .iter()
                .position(|present| present.created_at > message.created_at)
                .unwrap_or(self.messages.len());
            self.ids.insert(message.id.clone());
            self.messages.insert(position, message);
            added += 1;
        }
        added
    }

    /// Messages in the order they were accepted
    pub fn messages(&self) -> &[MessageDto] {
        &self.messages
    }

    /// Messages ordered by server timestamp (stable for equal timestamps)
    pub fn sorted_by_time(&self) -> Vec<&MessageDto> {
        let mut sorted: Vec<&MessageDto> = self.messages.iter().collect();
        sorted.sort_by_key(|message| message.created_at);
        sorted
    }

    pub fn find(&self, message_id: &str) -> Option<&MessageDto> {
        if !self.ids.contains(message_id) {
            return None;
        }
        self.messages.iter().find(|message| message.id == message_id)
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.ids.contains(message_id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn append_unique(&mut self, message: MessageDto) -> bool {
        if !self.ids.insert(message.id.clone()) {
            tracing::debug!("Absorbed duplicate message '{}'", message.id);
            return false;
        }
        self.messages.push(message);
        true
    }
}

/// Put a history page in chronological order and drop repeated ids
///
/// Servers may answer newest-first; the sort is stable so equal timestamps
/// keep the page's order.
pub fn normalize_history(mut page: Vec<MessageDto>) -> Vec<MessageDto> {
    page.sort_by_key(|message| message.created_at);
    let mut seen = HashSet::new();
    page.retain(|message| seen.insert(message.id.clone()));
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhall_shared::dto::{AuthorDto, MessageKindDto};

    fn message(id: &str, created_at: i64) -> MessageDto {
        MessageDto {
            id: id.to_string(),
            room_id: "R1".to_string(),
            author: AuthorDto {
                user_id: "bob".to_string(),
                user_name: "Bob".to_string(),
                avatar: None,
            },
            body: format!("body of {}", id),
            kind: MessageKindDto::Text,
            resource: None,
            reply_to: None,
            created_at,
        }
    }

    fn ids(timeline: &RoomTimeline) -> Vec<&str> {
        timeline.messages().iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_broadcast_after_local_echo_is_absorbed() {
        // テスト項目: 自分の送信結果を追加した後に届いた同じメッセージのブロードキャストは無視される
        // given (前提条件):
        let mut timeline = RoomTimeline::new();
        timeline.apply_local_echo(message("m1", 10));

        // when (操作):
        let appended = timeline.apply_broadcast(message("m1", 10));

        // then (期待する結果):
        assert!(!appended);
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_local_echo_after_broadcast_is_absorbed() {
        // テスト項目: ブロードキャストが送信結果より先に届いた場合も 1 件だけ保持される
        // given (前提条件):
        let mut timeline = RoomTimeline::new();
        timeline.apply_broadcast(message("m1", 10));

        // when (操作):
        let appended = timeline.apply_local_echo(message("m1", 10));

        // then (期待する結果):
        assert!(!appended);
        assert_eq!(ids(&timeline), vec!["m1"]);
    }

    #[test]
    fn test_history_is_normalized_to_chronological_order() {
        // テスト項目: 新しい順で返された履歴は時系列順に並べ替えられる
        // given (前提条件):
        let mut timeline = RoomTimeline::new();
        let page = vec![message("m3", 30), message("m2", 20), message("m1", 10)];

        // when (操作):
        let added = timeline.apply_history(page);

        // then (期待する結果):
        assert_eq!(added, 3);
        assert_eq!(ids(&timeline), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_history_overlapping_live_broadcast_is_deduplicated() {
        // テスト項目: 履歴取得中に届いたブロードキャストと履歴が重複しても 1 件になる
        // given (前提条件):
        let mut timeline = RoomTimeline::new();
        timeline.apply_broadcast(message("m3", 30));

        // when (操作):
        let added = timeline.apply_history(vec![message("m1", 10), message("m2", 20), message("m3", 30)]);

        // then (期待する結果):
        assert_eq!(added, 2);
        assert_eq!(ids(&timeline), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_history_gap_is_filled_in_chronological_position() {
        // テスト項目: 再接続後の履歴で欠けていたメッセージが時系列の位置に補完される
        // given (前提条件):
        let mut timeline = RoomTimeline::new();
        timeline.apply_history(vec![message("m1", 10), message("m2", 20)]);
        timeline.apply_broadcast(message("m5", 50));

        // when (操作):
        let added = timeline.apply_history(vec![
            message("m2", 20),
            message("m3", 30),
            message("m4", 40),
            message("m5", 50),
        ]);

        // then (期待する結果):
        assert_eq!(added, 2);
        assert_eq!(ids(&timeline), vec!["m1", "m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn test_sorted_by_time_keeps_arrival_order_for_ties() {
        // テスト項目: 時刻順の表示では、同時刻のメッセージは受信順を保つ
        // given (前提条件):
        let mut timeline = RoomTimeline::new();
        timeline.apply_broadcast(message("late", 30));
        timeline.apply_broadcast(message("tie-a", 10));
        timeline.apply_broadcast(message("tie-b", 10));

        // when (操作):
        let sorted: Vec<&str> = timeline.sorted_by_time().iter().map(|m| m.id.as_str()).collect();

        // then (期待する結果):
        assert_eq!(sorted, vec!["tie-a", "tie-b", "late"]);
        assert_eq!(ids(&timeline), vec!["late", "tie-a", "tie-b"]);
    }

    #[test]
    fn test_normalize_history_drops_repeated_ids() {
        // テスト項目: 履歴ページ内の重複 ID は 1 件にまとめられる
        // given (前提条件):
        let page = vec![message("m1", 10), message("m1", 10), message("m2", 20)];

        // when (操作):
        let normalized = normalize_history(page);

        // then (期待する結果):
        assert_eq!(normalized.len(), 2);
    }

    #[test]
    fn test_find_returns_message_by_id() {
        // テスト項目: ID でメッセージを検索できる
        // given (前提条件):
        let mut timeline = RoomTimeline::new();
        timeline.apply_broadcast(message("m1", 10));

        // when (操作):
        let found = timeline.find("m1");
        let missing = timeline.find("m9");

        // then (期待する結果):
        assert_eq!(found.map(|m| m.created_at), Some(10));
        assert!(missing.is_none());
    }
}
