//! エンティティ
//!
//! `Message` は作成後に変更されない（編集・削除はこのドメインの範囲外）。

use super::{
    error::ValueObjectError,
    value_object::{DisplayName, MessageBody, MessageId, RoomId, Timestamp, UserId},
};

/// 返信スニペットの最大文字数
pub const REPLY_SNIPPET_LEN: usize = 100;

/// メッセージの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    ResourceShare,
}

/// メッセージの投稿者（表示用に非正規化された情報を含む）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub avatar: Option<String>,
}

/// 共有された学習リソースへの参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub resource_id: String,
    pub resource_link: String,
}

/// 返信先メッセージへの参照（投稿者名と切り詰めた本文を含む）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRef {
    pub id: MessageId,
    pub author_name: String,
    pub snippet: String,
}

/// 永続化済みのメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub author: Author,
    pub body: MessageBody,
    pub kind: MessageKind,
    pub resource: Option<ResourceRef>,
    pub reply_to: Option<ReplyRef>,
    pub created_at: Timestamp,
}

impl Message {
    /// このメッセージへの返信に埋め込む参照を作成
    pub fn reply_ref(&self) -> ReplyRef {
        ReplyRef {
            id: self.id.clone(),
            author_name: self.author.display_name.as_str().to_string(),
            snippet: truncate_snippet(self.body.as_str()),
        }
    }
}

fn truncate_snippet(body: &str) -> String {
    if body.chars().count() <= REPLY_SNIPPET_LEN {
        return body.to_string();
    }
    let mut snippet: String = body.chars().take(REPLY_SNIPPET_LEN).collect();
    snippet.push('…');
    snippet
}

/// 永続化前のメッセージ（ID とタイムスタンプは未採番）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub room_id: RoomId,
    pub author: Author,
    pub body: MessageBody,
    pub kind: MessageKind,
    pub resource: Option<ResourceRef>,
    pub reply_to_id: Option<MessageId>,
}

impl MessageDraft {
    /// 種類ごとの整合性を検証してドラフトを作成
    ///
    /// - text: 本文が空でないこと、リソースを持たないこと
    /// - resource-share: リソース ID とリンクの両方を持つこと
    pub fn new(
        room_id: RoomId,
        author: Author,
        body: MessageBody,
        kind: MessageKind,
        resource: Option<ResourceRef>,
        reply_to_id: Option<MessageId>,
    ) -> Result<Self, ValueObjectError> {
        match kind {
            MessageKind::Text => {
                if body.is_blank() {
                    return Err(ValueObjectError::EmptyTextBody);
                }
                if resource.is_some() {
                    return Err(ValueObjectError::UnexpectedResource);
                }
            }
            MessageKind::ResourceShare => match &resource {
                Some(r) if !r.resource_id.trim().is_empty() && !r.resource_link.trim().is_empty() => {}
                _ => return Err(ValueObjectError::MissingResource),
            },
        }

        Ok(Self {
            room_id,
            author,
            body,
            kind,
            resource,
            reply_to_id,
        })
    }

    /// 採番済みの ID・タイムスタンプ・返信参照を与えてメッセージを確定
    pub fn into_message(
        self,
        id: MessageId,
        created_at: Timestamp,
        reply_to: Option<ReplyRef>,
    ) -> Message {
        Message {
            id,
            room_id: self.room_id,
            author: self.author,
            body: self.body,
            kind: self.kind,
            resource: self.resource,
            reply_to,
            created_at,
        }
    }
}
