//! Message channel: outgoing drafts and per-room broadcast handlers.

use std::collections::HashMap;

use studyhall_shared::dto::{AuthorDto, MessageDto, MessageKindDto, SendMessageRequest};

/// A message the local user wants to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub body: String,
    pub kind: MessageKindDto,
    pub resource_id: Option<String>,
    pub resource_link: Option<String>,
    pub reply_to: Option<String>,
}

impl MessageDraft {
    /// A plain text message
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            kind: MessageKindDto::Text,
            resource_id: None,
            resource_link: None,
            reply_to: None,
        }
    }

    /// A shared study resource with an optional comment
    pub fn resource_share(
        body: impl Into<String>,
        resource_id: impl Into<String>,
        resource_link: impl Into<String>,
    ) -> Self {
        Self {
            body: body.into(),
            kind: MessageKindDto::ResourceShare,
            resource_id: Some(resource_id.into()),
            resource_link: Some(resource_link.into()),
            reply_to: None,
        }
    }

    /// Mark this draft as a reply to an existing message
    pub fn replying_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }

    /// Build the persistence request for the given room and author
    pub fn into_request(self, room_id: &str, author: &AuthorDto) -> SendMessageRequest {
        SendMessageRequest {
            room_id: room_id.to_string(),
            message: self.body,
            kind: self.kind,
            resource_id: self.resource_id,
            resource_link: self.resource_link,
            reply_to: self.reply_to,
            author: author.clone(),
        }
    }
}

/// Identifies a registered broadcast handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// Callback invoked once for each new broadcast message of a room
pub type BroadcastHandler = Box<dyn FnMut(&MessageDto) + Send>;

/// Broadcast handlers keyed by room
#[derive(Default)]
pub struct BroadcastHandlers {
    next_id: u64,
    by_room: HashMap<String, Vec<(HandlerId, BroadcastHandler)>>,
}

impl BroadcastHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, room_id: &str, handler: BroadcastHandler) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.by_room
            .entry(room_id.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    /// Returns `false` if no handler has this id
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let mut removed = false;
        self.by_room.retain(|_, handlers| {
            let before = handlers.len();
            handlers.retain(|(handler_id, _)| *handler_id != id);
            removed |= handlers.len() != before;
            !handlers.is_empty()
        });
        removed
    }

    /// Drop every handler of the room, returning how many were registered
    pub fn remove_room(&mut self, room_id: &str) -> usize {
        self.by_room.remove(room_id).map_or(0, |handlers| handlers.len())
    }

    /// Invoke the room's handlers in registration order, returning how many ran
    pub fn dispatch(&mut self, room_id: &str, message: &MessageDto) -> usize {
        let Some(handlers) = self.by_room.get_mut(room_id) else {
            return 0;
        };
        for (_, handler) in handlers.iter_mut() {
            handler(message);
        }
        handlers.len()
    }

    pub fn count(&self, room_id: &str) -> usize {
        self.by_room.get(room_id).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for BroadcastHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self
            .by_room
            .iter()
            .map(|(room_id, handlers)| (room_id.as_str(), handlers.len()))
            .collect();
        f.debug_struct("BroadcastHandlers")
            .field("next_id", &self.next_id)
            .field("by_room", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn message(room_id: &str, id: &str) -> MessageDto {
        MessageDto {
            id: id.to_string(),
            room_id: room_id.to_string(),
            author: AuthorDto {
                user_id: "bob".to_string(),
                user_name: "Bob".to_string(),
                avatar: None,
            },
            body: "hello".to_string(),
            kind: MessageKindDto::Text,
            resource: None,
            reply_to: None,
            created_at: 1,
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, BroadcastHandler) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: BroadcastHandler = Box::new(move |m: &MessageDto| {
            sink.lock().unwrap().push(m.id.clone());
        });
        (seen, handler)
    }

    #[test]
    fn test_draft_into_request() {
        // テスト項目: 返信付きのリソース共有ドラフトから送信リクエストが組み立てられる
        // given (前提条件):
        let author = AuthorDto {
            user_id: "alice".to_string(),
            user_name: "Alice".to_string(),
            avatar: None,
        };
        let draft = MessageDraft::resource_share("notes", "res-1", "https://example.com/n.pdf")
            .replying_to("m1");

        // when (操作):
        let request = draft.into_request("R1", &author);

        // then (期待する結果):
        assert_eq!(request.room_id, "R1");
        assert_eq!(request.message, "notes");
        assert_eq!(request.kind, MessageKindDto::ResourceShare);
        assert_eq!(request.resource_id.as_deref(), Some("res-1"));
        assert_eq!(request.reply_to.as_deref(), Some("m1"));
        assert_eq!(request.author, author);
    }

    #[test]
    fn test_dispatch_only_reaches_room_handlers() {
        // テスト項目: ハンドラは登録したルームのメッセージに対してのみ呼ばれる
        // given (前提条件):
        let mut handlers = BroadcastHandlers::new();
        let (seen_r1, handler_r1) = recorder();
        let (seen_r2, handler_r2) = recorder();
        handlers.register("R1", handler_r1);
        handlers.register("R2", handler_r2);

        // when (操作):
        let invoked = handlers.dispatch("R1", &message("R1", "m1"));

        // then (期待する結果):
        assert_eq!(invoked, 1);
        assert_eq!(*seen_r1.lock().unwrap(), vec!["m1".to_string()]);
        assert!(seen_r2.lock().unwrap().is_empty());
    }

    #[test]
    fn test_removed_handler_is_not_invoked() {
        // テスト項目: 解除したハンドラは呼ばれない
        // given (前提条件):
        let mut handlers = BroadcastHandlers::new();
        let (seen, handler) = recorder();
        let id = handlers.register("R1", handler);

        // when (操作):
        let removed = handlers.remove(id);
        handlers.dispatch("R1", &message("R1", "m1"));

        // then (期待する結果):
        assert!(removed);
        assert!(!handlers.remove(id));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_room_drops_all_handlers() {
        // テスト項目: ルーム単位でハンドラをまとめて解除できる
        // given (前提条件):
        let mut handlers = BroadcastHandlers::new();
        let (_, first) = recorder();
        let (_, second) = recorder();
        handlers.register("R1", first);
        handlers.register("R1", second);

        // when (操作):
        let removed = handlers.remove_room("R1");

        // then (期待する結果):
        assert_eq!(removed, 2);
        assert_eq!(handlers.count("R1"), 0);
    }
}
