//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - セッションごとの `UnboundedSender` を管理
//! - セッションへのイベント送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、イベント送信に使用します。
//! どのセッションに送るか（ルームの所属）は UseCase 層が決定します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{MessagePushError, MessagePusher, PusherChannel, SessionId};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_session(session_id.clone(), tx).await;
///
/// // セッションに送信
/// pusher.push_to(&session_id, "{\"type\":\"connected\",\"sessionId\":\"...\"}").await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のセッションの WebSocket sender
    sessions: Mutex<HashMap<SessionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中のセッション数
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_session(&self, session_id: SessionId, sender: PusherChannel) {
        let mut sessions = self.sessions.lock().await;
        tracing::debug!("Session '{}' registered to MessagePusher", session_id.as_str());
        sessions.insert(session_id, sender);
    }

    async fn unregister_session(&self, session_id: &SessionId) {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id);
        tracing::debug!(
            "Session '{}' unregistered from MessagePusher",
            session_id.as_str()
        );
    }

    async fn push_to(&self, session_id: &SessionId, content: &str) -> Result<(), MessagePushError> {
        let sessions = self.sessions.lock().await;

        let Some(sender) = sessions.get(session_id) else {
            return Err(MessagePushError::SessionNotFound(
                session_id.as_str().to_string(),
            ));
        };
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed event to session '{}'", session_id.as_str());
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<SessionId>,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let sessions = self.sessions.lock().await;

        for target in targets {
            match sessions.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!(
                            "Failed to push event to session '{}': {}",
                            target.as_str(),
                            e
                        );
                    }
                }
                None => {
                    tracing::warn!(
                        "Session '{}' not found during broadcast, skipping",
                        target.as_str()
                    );
                }
            }
        }

        Ok(())
    }
}
