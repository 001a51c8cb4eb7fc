//! Conversion logic between DTOs and domain entities.

use studyhall_shared::dto::{
    AuthorDto, MessageDto, MessageKindDto, ReplyRefDto, ResourceRefDto, SendMessageRequest,
};

use crate::domain::{
    Author, DisplayName, Message, MessageBody, MessageDraft, MessageId, MessageKind, ReplyRef,
    ResourceRef, RoomId, UserId, ValueObjectError,
};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<MessageKindDto> for MessageKind {
    fn from(dto: MessageKindDto) -> Self {
        match dto {
            MessageKindDto::Text => Self::Text,
            MessageKindDto::ResourceShare => Self::ResourceShare,
        }
    }
}

impl TryFrom<AuthorDto> for Author {
    type Error = ValueObjectError;

    fn try_from(dto: AuthorDto) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(dto.user_id)?,
            display_name: DisplayName::new(dto.user_name)?,
            avatar: dto.avatar.filter(|avatar| !avatar.trim().is_empty()),
        })
    }
}

impl TryFrom<SendMessageRequest> for MessageDraft {
    type Error = ValueObjectError;

    fn try_from(dto: SendMessageRequest) -> Result<Self, Self::Error> {
        let resource = match (dto.resource_id, dto.resource_link) {
            (None, None) => None,
            (resource_id, resource_link) => Some(ResourceRef {
                resource_id: resource_id.unwrap_or_default(),
                resource_link: resource_link.unwrap_or_default(),
            }),
        };
        let reply_to_id = dto.reply_to.map(MessageId::new).transpose()?;

        MessageDraft::new(
            RoomId::new(dto.room_id)?,
            Author::try_from(dto.author)?,
            MessageBody::new(dto.message)?,
            dto.kind.into(),
            resource,
            reply_to_id,
        )
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<MessageKind> for MessageKindDto {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Text => Self::Text,
            MessageKind::ResourceShare => Self::ResourceShare,
        }
    }
}

impl From<Author> for AuthorDto {
    fn from(model: Author) -> Self {
        Self {
            user_id: model.user_id.into_string(),
            user_name: model.display_name.into_string(),
            avatar: model.avatar,
        }
    }
}

impl From<ReplyRef> for ReplyRefDto {
    fn from(model: ReplyRef) -> Self {
        Self {
            id: model.id.into_string(),
            author_name: model.author_name,
            snippet: model.snippet,
        }
    }
}

impl From<Message> for MessageDto {
    fn from(model: Message) -> Self {
        Self {
            id: model.id.into_string(),
            room_id: model.room_id.into_string(),
            author: model.author.into(),
            body: model.body.into_string(),
            kind: model.kind.into(),
            resource: model.resource.map(|r| ResourceRefDto {
                resource_id: r.resource_id,
                resource_link: r.resource_link,
            }),
            reply_to: model.reply_to.map(Into::into),
            created_at: model.created_at.value(),
        }
    }
}
