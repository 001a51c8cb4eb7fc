//! Server state shared by all handlers.

use std::sync::Arc;

use studyhall_shared::time::Clock;

use crate::{
    domain::{MembershipRegistry, MessagePusher, MessageRepository},
    usecase::{
        ConnectSessionUseCase, DisconnectSessionUseCase, FetchHistoryUseCase, JoinRoomUseCase,
        LeaveRoomUseCase, RelayTypingUseCase, SendMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectSessionUseCase（セッション接続）
    pub connect_session_usecase: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（セッション切断）
    pub disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// JoinRoomUseCase（ルーム参加）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム退出）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// RelayTypingUseCase（タイピング通知の中継）
    pub relay_typing_usecase: Arc<RelayTypingUseCase>,
    /// SendMessageUseCase（メッセージ送信）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// FetchHistoryUseCase（履歴取得）
    pub fetch_history_usecase: Arc<FetchHistoryUseCase>,
}

impl AppState {
    /// Wire every use case from the given collaborators
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        registry: Arc<dyn MembershipRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            connect_session_usecase: Arc::new(ConnectSessionUseCase::new(message_pusher.clone())),
            disconnect_session_usecase: Arc::new(DisconnectSessionUseCase::new(
                registry.clone(),
                message_pusher.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(registry.clone())),
            leave_room_usecase: Arc::new(LeaveRoomUseCase::new(registry.clone())),
            relay_typing_usecase: Arc::new(RelayTypingUseCase::new(
                registry.clone(),
                message_pusher.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                repository.clone(),
                registry,
                message_pusher,
                clock,
            )),
            fetch_history_usecase: Arc::new(FetchHistoryUseCase::new(repository)),
        }
    }
}
