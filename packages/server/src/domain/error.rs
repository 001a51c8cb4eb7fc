//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクト・エンティティ生成時の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("text messages must have a non-empty body")]
    EmptyTextBody,

    #[error("resource-share messages require a resource id and link")]
    MissingResource,

    #[error("only resource-share messages may carry a resource")]
    UnexpectedResource,
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("message '{0}' already exists")]
    DuplicateMessageId(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// メッセージ通知（push）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("session '{0}' is not registered")]
    SessionNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
