//! Room membership of the local client.

use std::collections::BTreeSet;

/// The set of rooms this client has joined
///
/// Only tracks membership; the server-side subscription is driven by
/// [`ChatClient`](crate::chat::ChatClient).
#[derive(Debug, Default, Clone)]
pub struct RoomTracker {
    rooms: BTreeSet<String>,
}

impl RoomTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the room was already joined
    pub fn join(&mut self, room_id: &str) -> bool {
        self.rooms.insert(room_id.to_string())
    }

    /// Returns `false` if the room was not joined
    pub fn leave(&mut self, room_id: &str) -> bool {
        self.rooms.remove(room_id)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains(room_id)
    }

    /// Joined rooms in sorted order
    pub fn rooms(&self) -> Vec<String> {
        self.rooms.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_idempotent() {
        // テスト項目: 同じルームへの 2 回目の参加は何もしない
        // given (前提条件):
        let mut tracker = RoomTracker::new();
        tracker.join("R1");

        // when (操作):
        let joined_again = tracker.join("R1");

        // then (期待する結果):
        assert!(!joined_again);
        assert_eq!(tracker.rooms(), vec!["R1".to_string()]);
    }

    #[test]
    fn test_leave_unjoined_room_is_noop() {
        // テスト項目: 参加していないルームからの退出は何もしない
        // given (前提条件):
        let mut tracker = RoomTracker::new();
        tracker.join("R1");

        // when (操作):
        let left = tracker.leave("R2");

        // then (期待する結果):
        assert!(!left);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_rooms_are_sorted() {
        // テスト項目: 参加中のルーム一覧はソートされて返される
        // given (前提条件):
        let mut tracker = RoomTracker::new();

        // when (操作):
        tracker.join("math");
        tracker.join("biology");
        tracker.join("chemistry");
        tracker.leave("chemistry");

        // then (期待する結果):
        assert_eq!(tracker.rooms(), vec!["biology".to_string(), "math".to_string()]);
        assert!(tracker.contains("math"));
        assert!(!tracker.contains("chemistry"));
    }
}
