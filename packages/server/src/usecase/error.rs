//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::ValueObjectError;

/// メッセージ送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// リクエストの内容が不正
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] ValueObjectError),

    /// 返信先のメッセージがルーム内に存在しない
    #[error("reply target '{0}' not found in room")]
    ReplyTargetNotFound(String),

    /// 永続化に失敗
    #[error("failed to store message: {0}")]
    Repository(String),

    /// ブロードキャストに失敗
    #[error("failed to broadcast message: {0}")]
    BroadcastFailed(String),
}

/// 履歴取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchHistoryError {
    #[error("failed to load history: {0}")]
    Repository(String),
}

/// タイピング通知の中継エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayTypingError {
    /// 送信元セッションがルームに参加していない
    #[error("session is not a member of room '{0}'")]
    NotJoined(String),

    #[error("failed to relay typing signal: {0}")]
    BroadcastFailed(String),
}
