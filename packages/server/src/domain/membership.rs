//! セッションとルームの所属関係
//!
//! ルームへの所属は接続（セッション）単位で、ユーザー単位では永続化しない。
//! 切断されたセッションの所属は全て破棄され、再接続後にクライアントが明示的に再参加する。

use std::collections::{BTreeSet, HashMap};

use super::value_object::{RoomId, SessionId};

/// 所属関係（双方向のインデックスを保持）
#[derive(Debug, Clone, Default)]
pub struct RoomMembership {
    /// セッション → 参加中のルーム
    rooms_by_session: HashMap<SessionId, BTreeSet<RoomId>>,
    /// ルーム → 参加中のセッション
    sessions_by_room: HashMap<RoomId, BTreeSet<SessionId>>,
}

impl RoomMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// ルームに参加する。既に参加済みなら何もせず `false` を返す（冪等）
    pub fn join(&mut self, session_id: &SessionId, room_id: &RoomId) -> bool {
        let newly_joined = self
            .rooms_by_session
            .entry(session_id.clone())
            .or_default()
            .insert(room_id.clone());
        if newly_joined {
            self.sessions_by_room
                .entry(room_id.clone())
                .or_default()
                .insert(session_id.clone());
        }
        newly_joined
    }

    /// ルームから退出する。参加していなければ何もせず `false` を返す（冪等）
    pub fn leave(&mut self, session_id: &SessionId, room_id: &RoomId) -> bool {
        let removed = match self.rooms_by_session.get_mut(session_id) {
            Some(rooms) => {
                let removed = rooms.remove(room_id);
                if rooms.is_empty() {
                    self.rooms_by_session.remove(session_id);
                }
                removed
            }
            None => false,
        };
        if removed {
            self.remove_from_room_index(session_id, room_id);
        }
        removed
    }

    /// セッションの所属を全て破棄し、退出したルームを返す
    pub fn leave_all(&mut self, session_id: &SessionId) -> Vec<RoomId> {
        let rooms: Vec<RoomId> = self
            .rooms_by_session
            .remove(session_id)
            .map(|rooms| rooms.into_iter().collect())
            .unwrap_or_default();
        for room_id in &rooms {
            self.remove_from_room_index(session_id, room_id);
        }
        rooms
    }

    /// ルームに参加中のセッション
    pub fn members(&self, room_id: &RoomId) -> Vec<SessionId> {
        self.sessions_by_room
            .get(room_id)
            .map(|sessions| sessions.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// セッションが参加中のルーム
    pub fn rooms_of(&self, session_id: &SessionId) -> Vec<RoomId> {
        self.rooms_by_session
            .get(session_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, session_id: &SessionId, room_id: &RoomId) -> bool {
        self.rooms_by_session
            .get(session_id)
            .is_some_and(|rooms| rooms.contains(room_id))
    }

    fn remove_from_room_index(&mut self, session_id: &SessionId, room_id: &RoomId) {
        if let Some(sessions) = self.sessions_by_room.get_mut(room_id) {
            sessions.remove(session_id);
            if sessions.is_empty() {
                self.sessions_by_room.remove(room_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionIdFactory;

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_join_twice_yields_single_membership() {
        // テスト項目: 同じルームに 2 回参加しても所属は 1 つだけ
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let session = SessionIdFactory::generate();

        // when (操作):
        let first = membership.join(&session, &room("R1"));
        let second = membership.join(&session, &room("R1"));

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(membership.members(&room("R1")), vec![session.clone()]);
        assert_eq!(membership.rooms_of(&session), vec![room("R1")]);
    }

    #[test]
    fn test_leave_when_not_joined_is_noop() {
        // テスト項目: 参加していないルームからの退出は何もしない
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let session = SessionIdFactory::generate();
        membership.join(&session, &room("R1"));

        // when (操作):
        let result = membership.leave(&session, &room("R2"));

        // then (期待する結果):
        assert!(!result);
        assert!(membership.is_member(&session, &room("R1")));
    }

    #[test]
    fn test_leave_stops_membership_immediately() {
        // テスト項目: 退出するとそのルームのメンバーから即座に外れる
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let alice = SessionIdFactory::generate();
        let bob = SessionIdFactory::generate();
        membership.join(&alice, &room("R1"));
        membership.join(&bob, &room("R1"));

        // when (操作):
        let result = membership.leave(&alice, &room("R1"));

        // then (期待する結果):
        assert!(result);
        assert_eq!(membership.members(&room("R1")), vec![bob]);
        assert!(membership.rooms_of(&alice).is_empty());
    }

    #[test]
    fn test_leave_all_drops_every_room() {
        // テスト項目: 切断時に全てのルームの所属が破棄される
        // given (前提条件):
        let mut membership = RoomMembership::new();
        let session = SessionIdFactory::generate();
        membership.join(&session, &room("R2"));
        membership.join(&session, &room("R1"));

        // when (操作):
        let left = membership.leave_all(&session);

        // then (期待する結果): ルーム ID 順で返される
        assert_eq!(left, vec![room("R1"), room("R2")]);
        assert!(membership.members(&room("R1")).is_empty());
        assert!(membership.members(&room("R2")).is_empty());
    }
}
