//! Typing presence.
//!
//! [`TypingTracker`] holds who else is typing, per room, and expires entries
//! that stop being refreshed. [`LocalTyping`] debounces the local user's
//! keystrokes into one start and one stop per burst, re-sending the start
//! while a long burst lasts. Both take the current
//! instant as a parameter; the periodic sweep lives in
//! [`ChatClient`](crate::chat::ChatClient).

use std::{collections::HashMap, time::Duration};

use tokio::time::Instant;

#[derive(Debug, Clone)]
struct TypingEntry {
    display_name: String,
    refreshed_at: Instant,
}

/// Remote users currently typing, keyed by room and user id
#[derive(Debug, Clone)]
pub struct TypingTracker {
    expiry: Duration,
    rooms: HashMap<String, HashMap<String, TypingEntry>>,
}

impl TypingTracker {
    pub fn new(expiry: Duration) -> Self {
        Self {
            expiry,
            rooms: HashMap::new(),
        }
    }

    /// Record a typing signal; returns `true` if the user was not typing before
    pub fn refresh(&mut self, room_id: &str, user_id: &str, display_name: &str, now: Instant) -> bool {
        let entries = self.rooms.entry(room_id.to_string()).or_default();
        let entry = TypingEntry {
            display_name: display_name.to_string(),
            refreshed_at: now,
        };
        entries.insert(user_id.to_string(), entry).is_none()
    }

    /// Returns `true` if the user was typing
    pub fn remove(&mut self, room_id: &str, user_id: &str) -> bool {
        let Some(entries) = self.rooms.get_mut(room_id) else {
            return false;
        };
        let removed = entries.remove(user_id).is_some();
        if entries.is_empty() {
            self.rooms.remove(room_id);
        }
        removed
    }

    /// Drop entries not refreshed within the expiry window
    ///
    /// Returns the rooms whose set of typing users changed, sorted.
    pub fn sweep(&mut self, now: Instant) -> Vec<String> {
        let expiry = self.expiry;
        let mut changed = Vec::new();

        self.rooms.retain(|room_id, entries| {
            let before = entries.len();
            entries.retain(|_, entry| now.saturating_duration_since(entry.refreshed_at) < expiry);
            if entries.len() != before {
                changed.push(room_id.clone());
            }
            !entries.is_empty()
        });

        changed.sort();
        changed
    }

    /// Forget a room entirely; returns `true` if anyone was typing in it
    pub fn clear_room(&mut self, room_id: &str) -> bool {
        self.rooms.remove(room_id).is_some()
    }

    /// Forget every room, returning those that had typing users, sorted
    pub fn clear_all(&mut self) -> Vec<String> {
        let mut rooms: Vec<String> = self.rooms.drain().map(|(room_id, _)| room_id).collect();
        rooms.sort();
        rooms
    }

    /// Display names of users typing in the room, sorted
    pub fn typing_names(&self, room_id: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .rooms
            .get(room_id)
            .map(|entries| entries.values().map(|e| e.display_name.as_str()).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    pub fn is_typing(&self, room_id: &str, user_id: &str) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|entries| entries.contains_key(user_id))
    }

    /// Human-readable indicator for the room, `None` when nobody is typing
    pub fn indicator(&self, room_id: &str) -> Option<String> {
        indicator_text(&self.typing_names(room_id))
    }
}

/// Render typing users as a short phrase
///
/// ```
/// use studyhall_client::typing::indicator_text;
///
/// assert_eq!(indicator_text(&["Bob"]).as_deref(), Some("Bob is typing…"));
/// assert_eq!(indicator_text(&[]), None);
/// ```
pub fn indicator_text(names: &[&str]) -> Option<String> {
    match names {
        [] => None,
        [one] => Some(format!("{} is typing…", one)),
        [first, second] => Some(format!("{} and {} are typing…", first, second)),
        [first, second, rest @ ..] => {
            let others = if rest.len() == 1 { "other" } else { "others" };
            Some(format!(
                "{}, {} and {} {} are typing…",
                first,
                second,
                rest.len(),
                others
            ))
        }
    }
}

/// Debounce state for the local user's typing, per room
///
/// A room is "typing" from the first keystroke until `quiet_period` passes
/// without another one. Each room holds at most one pending deadline. While
/// the burst lasts, a keystroke at least `heartbeat` after the last
/// `typing-start` asks for it to be sent again so peers do not expire it.
#[derive(Debug, Clone)]
pub struct LocalTyping {
    quiet_period: Duration,
    heartbeat: Duration,
    bursts: HashMap<String, Burst>,
}

#[derive(Debug, Clone, Copy)]
struct Burst {
    deadline: Instant,
    last_start: Instant,
}

impl LocalTyping {
    pub fn new(quiet_period: Duration, heartbeat: Duration) -> Self {
        Self {
            quiet_period,
            heartbeat,
            bursts: HashMap::new(),
        }
    }

    /// Register a keystroke; returns `true` if `typing-start` should be sent
    ///
    /// That is the case for the first keystroke of a burst and for the first
    /// one after each `heartbeat` interval.
    pub fn keystroke(&mut self, room_id: &str, now: Instant) -> bool {
        let deadline = now + self.quiet_period;
        match self.bursts.get_mut(room_id) {
            Some(burst) => {
                burst.deadline = deadline;
                if now.saturating_duration_since(burst.last_start) < self.heartbeat {
                    return false;
                }
                burst.last_start = now;
                true
            }
            None => {
                self.bursts.insert(
                    room_id.to_string(),
                    Burst {
                        deadline,
                        last_start: now,
                    },
                );
                true
            }
        }
    }

    /// Rooms whose quiet period has elapsed, sorted; they are no longer typing
    pub fn due(&mut self, now: Instant) -> Vec<String> {
        let mut due: Vec<String> = self
            .bursts
            .iter()
            .filter(|(_, burst)| burst.deadline <= now)
            .map(|(room_id, _)| room_id.clone())
            .collect();
        for room_id in &due {
            self.bursts.remove(room_id);
        }
        due.sort();
        due
    }

    /// End the burst immediately; returns `true` if the room was typing
    pub fn stop(&mut self, room_id: &str) -> bool {
        self.bursts.remove(room_id).is_some()
    }

    pub fn is_typing(&self, room_id: &str) -> bool {
        self.bursts.contains_key(room_id)
    }

    /// End every burst, returning the rooms that were typing, sorted
    pub fn clear_all(&mut self) -> Vec<String> {
        let mut rooms: Vec<String> = self.bursts.drain().map(|(room_id, _)| room_id).collect();
        rooms.sort();
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPIRY: Duration = Duration::from_secs(3);
    const QUIET: Duration = Duration::from_secs(2);
    const HEARTBEAT: Duration = Duration::from_secs(2);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_refresh_reports_only_new_typists() {
        // テスト項目: 入力中の通知は初回のみ「新規」と判定され、再通知は更新扱いになる
        // given (前提条件):
        let mut tracker = TypingTracker::new(EXPIRY);
        let start = Instant::now();

        // when (操作):
        let first = tracker.refresh("R1", "bob", "Bob", start);
        let second = tracker.refresh("R1", "bob", "Bob", start + ms(500));

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(tracker.typing_names("R1"), vec!["Bob"]);
    }

    #[test]
    fn test_entry_expires_without_refresh() {
        // テスト項目: 3 秒以上更新のない入力中エントリは削除される
        // given (前提条件):
        let mut tracker = TypingTracker::new(EXPIRY);
        let start = Instant::now();
        tracker.refresh("R1", "bob", "Bob", start);

        // when (操作):
        let before_expiry = tracker.sweep(start + ms(2900));
        let after_expiry = tracker.sweep(start + ms(3100));

        // then (期待する結果):
        assert!(before_expiry.is_empty());
        assert_eq!(after_expiry, vec!["R1".to_string()]);
        assert_eq!(tracker.indicator("R1"), None);
    }

    #[test]
    fn test_refresh_extends_expiry() {
        // テスト項目: 更新された入力中エントリは最後の更新から 3 秒間保持される
        // given (前提条件):
        let mut tracker = TypingTracker::new(EXPIRY);
        let start = Instant::now();
        tracker.refresh("R1", "bob", "Bob", start);
        tracker.refresh("R1", "bob", "Bob", start + ms(2000));

        // when (操作):
        let changed = tracker.sweep(start + ms(4000));

        // then (期待する結果):
        assert!(changed.is_empty());
        assert!(tracker.is_typing("R1", "bob"));
    }

    #[test]
    fn test_remove_stops_typing() {
        // テスト項目: 入力停止の通知でエントリが削除される
        // given (前提条件):
        let mut tracker = TypingTracker::new(EXPIRY);
        tracker.refresh("R1", "bob", "Bob", Instant::now());

        // when (操作):
        let removed = tracker.remove("R1", "bob");
        let removed_again = tracker.remove("R1", "bob");

        // then (期待する結果):
        assert!(removed);
        assert!(!removed_again);
        assert!(tracker.typing_names("R1").is_empty());
    }

    #[test]
    fn test_rooms_are_tracked_independently() {
        // テスト項目: ルームごとに入力中のユーザーが独立して管理される
        // given (前提条件):
        let mut tracker = TypingTracker::new(EXPIRY);
        let now = Instant::now();
        tracker.refresh("R1", "bob", "Bob", now);
        tracker.refresh("R2", "carol", "Carol", now);

        // when (操作):
        let cleared = tracker.clear_room("R1");

        // then (期待する結果):
        assert!(cleared);
        assert!(tracker.typing_names("R1").is_empty());
        assert_eq!(tracker.typing_names("R2"), vec!["Carol"]);
    }

    #[test]
    fn test_clear_all_returns_affected_rooms() {
        // テスト項目: すべてのルームの入力中状態を消去し、影響したルームを返す
        // given (前提条件):
        let mut tracker = TypingTracker::new(EXPIRY);
        let now = Instant::now();
        tracker.refresh("R2", "bob", "Bob", now);
        tracker.refresh("R1", "carol", "Carol", now);

        // when (操作):
        let cleared = tracker.clear_all();

        // then (期待する結果):
        assert_eq!(cleared, vec!["R1".to_string(), "R2".to_string()]);
        assert_eq!(tracker.indicator("R1"), None);
    }

    #[test]
    fn test_indicator_text_variants() {
        // テスト項目: 入力中の人数に応じて表示文言が変わる
        // given (前提条件):

        // when (操作):

        // then (期待する結果):
        assert_eq!(indicator_text(&[]), None);
        assert_eq!(indicator_text(&["Bob"]).as_deref(), Some("Bob is typing…"));
        assert_eq!(
            indicator_text(&["Bob", "Carol"]).as_deref(),
            Some("Bob and Carol are typing…")
        );
        assert_eq!(
            indicator_text(&["Bob", "Carol", "Dave"]).as_deref(),
            Some("Bob, Carol and 1 other are typing…")
        );
        assert_eq!(
            indicator_text(&["Bob", "Carol", "Dave", "Erin"]).as_deref(),
            Some("Bob, Carol and 2 others are typing…")
        );
    }

    #[test]
    fn test_indicator_names_are_sorted() {
        // テスト項目: 表示名はソートされて表示される
        // given (前提条件):
        let mut tracker = TypingTracker::new(EXPIRY);
        let now = Instant::now();
        tracker.refresh("R1", "carol", "Carol", now);
        tracker.refresh("R1", "alice", "Alice", now);

        // when (操作):
        let indicator = tracker.indicator("R1");

        // then (期待する結果):
        assert_eq!(indicator.as_deref(), Some("Alice and Carol are typing…"));
    }

    #[test]
    fn test_keystroke_burst_starts_once() {
        // テスト項目: 2 秒以内に続くキー入力では入力開始は 1 回だけ判定される
        // given (前提条件):
        let mut local = LocalTyping::new(QUIET, HEARTBEAT);
        let start = Instant::now();

        // when (操作):
        let starts: Vec<bool> = (0..5)
            .map(|i| local.keystroke("R1", start + ms(i * 400)))
            .collect();

        // then (期待する結果):
        assert_eq!(starts, vec![true, false, false, false, false]);
    }

    #[test]
    fn test_quiet_period_restarts_on_keystroke() {
        // テスト項目: 入力停止の期限は最後のキー入力から 2 秒後に延長される
        // given (前提条件):
        let mut local = LocalTyping::new(QUIET, HEARTBEAT);
        let start = Instant::now();
        local.keystroke("R1", start);
        local.keystroke("R1", start + ms(1500));

        // when (操作):
        let due_early = local.due(start + ms(2500));
        let due_late = local.due(start + ms(3500));

        // then (期待する結果):
        assert!(due_early.is_empty());
        assert_eq!(due_late, vec!["R1".to_string()]);
        assert!(!local.is_typing("R1"));
    }

    #[test]
    fn test_stop_ends_burst() {
        // テスト項目: 明示的な停止で入力中状態が解除され、期限切れは発生しない
        // given (前提条件):
        let mut local = LocalTyping::new(QUIET, HEARTBEAT);
        let start = Instant::now();
        local.keystroke("R1", start);

        // when (操作):
        let stopped = local.stop("R1");
        let due = local.due(start + ms(5000));

        // then (期待する結果):
        assert!(stopped);
        assert!(due.is_empty());
        assert!(local.keystroke("R1", start + ms(5000)));
    }

    #[test]
    fn test_long_burst_repeats_start_before_peers_expire_it() {
        // テスト項目: 入力が続く間は 2 秒ごとに入力開始が再送され、間隔は受信側の有効期限より短い
        // given (前提条件):
        let mut local = LocalTyping::new(QUIET, HEARTBEAT);
        let start = Instant::now();

        // when (操作):
        let starts: Vec<u64> = (0..15)
            .map(|i| i * 400)
            .filter(|&at| local.keystroke("R1", start + ms(at)))
            .collect();

        // then (期待する結果):
        assert_eq!(starts, vec![0, 2000, 4000]);
        assert!(starts.windows(2).all(|pair| ms(pair[1] - pair[0]) < EXPIRY));
        assert!(local.is_typing("R1"));
    }
}
