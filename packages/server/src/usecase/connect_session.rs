//! UseCase: セッション接続処理

use std::sync::Arc;

use crate::domain::{MessagePusher, PusherChannel, SessionId, SessionIdFactory};

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectSessionUseCase {
    /// 新しい ConnectSessionUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// セッション ID を採番し、送信チャンネルを登録する
    ///
    /// 接続直後はどのルームにも所属していない。
    pub async fn execute(&self, sender: PusherChannel) -> SessionId {
        let session_id = SessionIdFactory::generate();
        self.message_pusher
            .register_session(session_id.clone(), sender)
            .await;
        session_id
    }
}
