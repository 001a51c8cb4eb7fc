//! MessagePusher trait 定義
//!
//! 接続中のセッションへイベントを通知するためのインターフェース。
//! WebSocket による実装は Infrastructure 層にあります。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{MessagePushError, SessionId};

/// セッションへのイベント送信チャンネル（シリアライズ済み JSON）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// セッションへのメッセージ通知
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// セッションを登録
    async fn register_session(&self, session_id: SessionId, sender: PusherChannel);

    /// セッションの登録を解除
    async fn unregister_session(&self, session_id: &SessionId);

    /// 特定のセッションに送信
    async fn push_to(&self, session_id: &SessionId, content: &str) -> Result<(), MessagePushError>;

    /// 複数のセッションに送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<SessionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
