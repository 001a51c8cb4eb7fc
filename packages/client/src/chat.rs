//! The chat client.
//!
//! [`ChatClient`] ties the connection, room membership, message timelines and
//! typing presence together. It has a single owner (`&mut self` everywhere),
//! so operations on one client never interleave.
//!
//! Inbound traffic is applied while the owner awaits
//! [`ChatClient::next_update`], which also drives typing deadlines and the
//! history refetch after a reconnect. `next_update` is cancel-safe, so it can
//! sit in a `tokio::select!` next to user input.

use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    sync::Arc,
    time::Duration,
};

use studyhall_shared::dto::{AuthorDto, ClientEvent, MessageDto, ServerEvent};
use tokio::{
    sync::watch,
    time::{Instant, Interval, MissedTickBehavior},
};

use crate::{
    api::{ChatApi, HttpChatApi},
    channel::{BroadcastHandlers, HandlerId, MessageDraft},
    config::ClientConfig,
    connection::{ConnectionEvent, ConnectionManager, ConnectionState},
    error::ClientError,
    reconcile::RoomTimeline,
    room::RoomTracker,
    typing::{LocalTyping, TypingTracker},
};

/// A change the UI should render
#[derive(Debug, Clone, PartialEq)]
pub enum ChatUpdate {
    /// A message was added to a room's timeline
    MessageAppended { room_id: String, message: MessageDto },
    /// A history page was merged into a room's timeline
    HistoryMerged { room_id: String, added: usize },
    /// The typing indicator of a room changed
    TypingChanged {
        room_id: String,
        indicator: Option<String>,
    },
    ConnectionChanged(ConnectionState),
    /// An error reported by the server or raised while restoring rooms
    Error(String),
}

impl ChatUpdate {
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::MessageAppended { room_id, .. }
            | Self::HistoryMerged { room_id, .. }
            | Self::TypingChanged { room_id, .. } => Some(room_id),
            Self::ConnectionChanged(_) | Self::Error(_) => None,
        }
    }
}

/// Group chat client for one user
pub struct ChatClient {
    config: ClientConfig,
    api: Arc<dyn ChatApi>,
    connection: ConnectionManager,
    rooms: RoomTracker,
    timelines: HashMap<String, RoomTimeline>,
    handlers: BroadcastHandlers,
    typing: TypingTracker,
    local_typing: LocalTyping,
    pending: VecDeque<ChatUpdate>,
    /// Rooms whose history must be refetched after a reconnect
    resync: VecDeque<String>,
    sweep: Option<Interval>,
}

impl ChatClient {
    /// Connect to the server described by `config`, using the HTTP API
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let api = HttpChatApi::new(config.base_url()?, config.request_timeout)?;
        Self::connect_with_api(config, Arc::new(api)).await
    }

    /// Connect using a custom persistence API
    pub async fn connect_with_api(
        config: ClientConfig,
        api: Arc<dyn ChatApi>,
    ) -> Result<Self, ClientError> {
        let connection = ConnectionManager::new(config.websocket_url()?, config.backoff.clone());
        let mut client = Self::with_connection(config, api, connection);
        client.connection.connect().await?;
        Ok(client)
    }

    fn with_connection(
        config: ClientConfig,
        api: Arc<dyn ChatApi>,
        connection: ConnectionManager,
    ) -> Self {
        let typing = TypingTracker::new(config.typing_expiry);
        let local_typing = LocalTyping::new(config.typing_quiet_period, config.typing_heartbeat);
        Self {
            config,
            api,
            connection,
            rooms: RoomTracker::new(),
            timelines: HashMap::new(),
            handlers: BroadcastHandlers::new(),
            typing,
            local_typing,
            pending: VecDeque::new(),
            resync: VecDeque::new(),
            sweep: None,
        }
    }

    pub fn identity(&self) -> &AuthorDto {
        &self.config.identity
    }

    pub fn session_id(&self) -> Option<String> {
        self.connection.session_id()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn subscribe_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe_state()
    }

    /// Open a new connection after a failure and restore every joined room
    ///
    /// Rooms are re-subscribed right away and their history is refetched
    /// by [`next_update`](Self::next_update). A no-op while connected.
    pub async fn reconnect(&mut self) -> Result<String, ClientError> {
        if let ConnectionState::Connected { session_id } = self.connection.state() {
            return Ok(session_id);
        }
        let session_id = self.connection.connect().await?;
        self.pending
            .push_back(ChatUpdate::ConnectionChanged(self.connection.state()));
        self.restore_rooms();
        Ok(session_id)
    }

    /// Close the connection, ending any local typing burst first
    pub async fn disconnect(&mut self) {
        for room_id in self.local_typing.clear_all() {
            self.send_typing_stop(&room_id);
        }
        self.typing.clear_all();
        self.resync.clear();
        self.connection.disconnect().await;
    }

    /// Join a room and load its recent history
    ///
    /// The subscription is sent before the history request so no broadcast
    /// can fall between the two; overlaps are absorbed by id. Returns
    /// `Ok(false)` if the room was already joined. If the history cannot be
    /// loaded the join is rolled back.
    pub async fn join(&mut self, room_id: &str) -> Result<bool, ClientError> {
        if self.rooms.contains(room_id) {
            return Ok(false);
        }

        self.connection.send(ClientEvent::JoinGroup {
            room_id: room_id.to_string(),
        })?;
        self.rooms.join(room_id);
        self.timelines
            .insert(room_id.to_string(), RoomTimeline::new());
        tracing::info!("Joined room '{}'", room_id);

        match self.fetch_history(room_id).await {
            Ok(page) => {
                self.merge_history(room_id, page);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Failed to load history of room '{}': {}", room_id, e);
                self.send_best_effort(ClientEvent::LeaveGroup {
                    room_id: room_id.to_string(),
                });
                self.forget_room(room_id);
                Err(e)
            }
        }
    }

    /// Leave a room, dropping its messages, handlers and typing state
    ///
    /// Returns `false` if the room was not joined.
    pub fn leave(&mut self, room_id: &str) -> bool {
        if !self.rooms.contains(room_id) {
            return false;
        }

        if self.local_typing.stop(room_id) {
            self.send_typing_stop(room_id);
        }
        self.send_best_effort(ClientEvent::LeaveGroup {
            room_id: room_id.to_string(),
        });
        self.forget_room(room_id);
        tracing::info!("Left room '{}'", room_id);
        true
    }

    /// Joined rooms, sorted
    pub fn rooms(&self) -> Vec<String> {
        self.rooms.rooms()
    }

    pub fn is_joined(&self, room_id: &str) -> bool {
        self.rooms.contains(room_id)
    }

    /// Messages of a room in the order they were accepted
    pub fn messages(&self, room_id: &str) -> &[MessageDto] {
        self.timelines
            .get(room_id)
            .map(RoomTimeline::messages)
            .unwrap_or_default()
    }

    /// Messages of a room ordered by server timestamp
    pub fn sorted_by_time(&self, room_id: &str) -> Vec<&MessageDto> {
        self.timelines
            .get(room_id)
            .map(RoomTimeline::sorted_by_time)
            .unwrap_or_default()
    }

    pub fn find_message(&self, room_id: &str, message_id: &str) -> Option<&MessageDto> {
        self.timelines.get(room_id)?.find(message_id)
    }

    /// Persist a message and add it to the room's timeline
    ///
    /// Ends the local typing burst in the room first. On failure the
    /// timeline is left untouched and nothing is retried.
    pub async fn send_message(
        &mut self,
        room_id: &str,
        draft: MessageDraft,
    ) -> Result<MessageDto, ClientError> {
        if !self.rooms.contains(room_id) {
            return Err(ClientError::NotJoined(room_id.to_string()));
        }
        if !self.connection.state().is_usable() {
            return Err(ClientError::Disconnected);
        }

        if self.local_typing.stop(room_id) {
            self.send_typing_stop(room_id);
        }

        let request = draft.into_request(room_id, &self.config.identity);
        let message = with_timeout(
            self.config.request_timeout,
            self.api.send_message(request),
        )
        .await?;
        tracing::debug!("Message '{}' persisted in room '{}'", message.id, room_id);

        if let Some(timeline) = self.timelines.get_mut(room_id)
            && timeline.apply_local_echo(message.clone())
        {
            self.pending.push_back(ChatUpdate::MessageAppended {
                room_id: room_id.to_string(),
                message: message.clone(),
            });
        }

        Ok(message)
    }

    /// Register a handler for new broadcast messages of a joined room
    ///
    /// The handler runs once per message id and never for this client's own
    /// sends once their persisted copy is in the timeline. Handlers are
    /// dropped when the room is left.
    pub fn on_message_broadcast<F>(&mut self, room_id: &str, handler: F) -> Result<HandlerId, ClientError>
    where
        F: FnMut(&MessageDto) + Send + 'static,
    {
        if !self.rooms.contains(room_id) {
            return Err(ClientError::NotJoined(room_id.to_string()));
        }
        Ok(self.handlers.register(room_id, Box::new(handler)))
    }

    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(id)
    }

    /// Report a keystroke in a room's composer
    pub fn keystroke(&mut self, room_id: &str) -> Result<(), ClientError> {
        self.keystroke_at(room_id, Instant::now())
    }

    /// Report a keystroke that happened at `now`
    ///
    /// The first keystroke of a burst sends `typing-start`; later ones push
    /// the stop deadline back and repeat the start once per heartbeat so
    /// peers keep the entry alive. While disconnected the keystroke is
    /// dropped.
    pub fn keystroke_at(&mut self, room_id: &str, now: Instant) -> Result<(), ClientError> {
        if !self.rooms.contains(room_id) {
            return Err(ClientError::NotJoined(room_id.to_string()));
        }
        if !self.local_typing.keystroke(room_id, now) {
            return Ok(());
        }

        let event = ClientEvent::TypingStart {
            room_id: room_id.to_string(),
            user_id: self.config.identity.user_id.clone(),
            user_name: self.config.identity.user_name.clone(),
        };
        if let Err(e) = self.connection.send(event) {
            tracing::debug!("Dropped typing start in room '{}': {}", room_id, e);
            self.local_typing.stop(room_id);
        }
        Ok(())
    }

    /// Whether the local user is currently typing in the room
    pub fn is_typing(&self, room_id: &str) -> bool {
        self.local_typing.is_typing(room_id)
    }

    /// Indicator for the other users typing in a room
    pub fn typing_indicator(&self, room_id: &str) -> Option<String> {
        self.typing.indicator(room_id)
    }

    /// Display names of the other users typing in a room, sorted
    pub fn typing_users(&self, room_id: &str) -> Vec<&str> {
        self.typing.typing_names(room_id)
    }

    /// Fire typing deadlines that are due at `now`
    ///
    /// Sends `typing-stop` for local bursts whose quiet period elapsed and
    /// expires remote entries that were not refreshed.
    pub fn poll_timers_at(&mut self, now: Instant) {
        for room_id in self.local_typing.due(now) {
            self.send_typing_stop(&room_id);
        }
        for room_id in self.typing.sweep(now) {
            self.push_typing_changed(&room_id);
        }
    }

    /// Wait for the next change to render
    ///
    /// Returns `None` once the connection is closed (after `disconnect`).
    /// After a `ConnectionChanged(Failed)` update it keeps waiting, so the
    /// owner can call [`reconnect`](Self::reconnect) and carry on.
    pub async fn next_update(&mut self) -> Option<ChatUpdate> {
        loop {
            if let Some(update) = self.pending.pop_front() {
                return Some(update);
            }

            // The room stays queued until its fetch completes, so a
            // cancelled call retries it.
            if let Some(room_id) = self.resync.front().cloned() {
                let result = self.fetch_history(&room_id).await;
                self.resync.pop_front();
                self.apply_resync(&room_id, result);
                continue;
            }

            let open = self.connection.is_open();
            if !open && self.connection.state() != ConnectionState::Failed {
                return None;
            }

            let period = self.config.sweep_interval;
            let sweep = self.sweep.get_or_insert_with(|| sweep_interval(period));

            tokio::select! {
                event = self.connection.next_event(), if open => match event {
                    Some(event) => self.handle_connection_event(event),
                    None if self.connection.state() == ConnectionState::Failed => {
                        tracing::debug!("Connection closed after failure, waiting for reconnect");
                    }
                    None => return None,
                },
                _ = sweep.tick() => self.poll_timers_at(Instant::now()),
            }
        }
    }

    fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Server(event) => self.handle_server_event(event, Instant::now()),
            ConnectionEvent::Lost { reason } => {
                tracing::warn!("Connection lost ({}), clearing typing state", reason);
                self.clear_typing();
                self.pending
                    .push_back(ChatUpdate::ConnectionChanged(self.connection.state()));
            }
            ConnectionEvent::Reconnected { session_id } => {
                tracing::info!(
                    "Reconnected as session '{}', restoring {} room(s)",
                    session_id,
                    self.rooms.len()
                );
                self.pending.push_back(ChatUpdate::ConnectionChanged(
                    ConnectionState::Connected { session_id },
                ));
                self.restore_rooms();
            }
            ConnectionEvent::Failed => {
                tracing::error!("Connection failed, sends are blocked until reconnect");
                self.clear_typing();
                self.pending
                    .push_back(ChatUpdate::ConnectionChanged(ConnectionState::Failed));
            }
        }
    }

    fn handle_server_event(&mut self, event: ServerEvent, now: Instant) {
        match event {
            ServerEvent::NewMessage { message } => {
                let room_id = message.room_id.clone();
                let Some(timeline) = self.timelines.get_mut(&room_id) else {
                    tracing::debug!("Dropping message for room '{}' (not joined)", room_id);
                    return;
                };
                if !timeline.apply_broadcast(message.clone()) {
                    return;
                }
                self.handlers.dispatch(&room_id, &message);
                self.pending
                    .push_back(ChatUpdate::MessageAppended { room_id, message });
            }
            ServerEvent::UserTyping {
                room_id,
                user_id,
                user_name,
            } => {
                if !self.rooms.contains(&room_id) || user_id == self.config.identity.user_id {
                    return;
                }
                if self.typing.refresh(&room_id, &user_id, &user_name, now) {
                    self.push_typing_changed(&room_id);
                }
            }
            ServerEvent::UserStopTyping { room_id, user_id } => {
                if self.typing.remove(&room_id, &user_id) {
                    self.push_typing_changed(&room_id);
                }
            }
            ServerEvent::Error { message } => {
                tracing::warn!("Server reported an error: {}", message);
                self.pending.push_back(ChatUpdate::Error(message));
            }
            ServerEvent::Connected { .. } => {}
        }
    }

    /// Re-subscribe every joined room and queue its history for refetch
    fn restore_rooms(&mut self) {
        self.resync.clear();
        for room_id in self.rooms.rooms() {
            if let Err(e) = self.connection.send(ClientEvent::JoinGroup {
                room_id: room_id.clone(),
            }) {
                tracing::warn!("Could not restore room '{}': {}", room_id, e);
                return;
            }
            self.resync.push_back(room_id);
        }
    }

    fn apply_resync(&mut self, room_id: &str, result: Result<Vec<MessageDto>, ClientError>) {
        match result {
            Ok(page) => self.merge_history(room_id, page),
            Err(e) => {
                tracing::warn!("Failed to reload history of room '{}': {}", room_id, e);
                self.pending.push_back(ChatUpdate::Error(format!(
                    "Failed to reload history of '{}': {}",
                    room_id, e
                )));
            }
        }
    }

    async fn fetch_history(&self, room_id: &str) -> Result<Vec<MessageDto>, ClientError> {
        with_timeout(
            self.config.request_timeout,
            self.api.fetch_history(room_id, self.config.history_limit),
        )
        .await
    }

    fn merge_history(&mut self, room_id: &str, page: Vec<MessageDto>) {
        let Some(timeline) = self.timelines.get_mut(room_id) else {
            return;
        };
        let added = timeline.apply_history(page);
        tracing::debug!("Merged {} message(s) into room '{}'", added, room_id);
        self.pending.push_back(ChatUpdate::HistoryMerged {
            room_id: room_id.to_string(),
            added,
        });
    }

    fn forget_room(&mut self, room_id: &str) {
        self.rooms.leave(room_id);
        self.timelines.remove(room_id);
        self.handlers.remove_room(room_id);
        self.typing.clear_room(room_id);
        self.local_typing.stop(room_id);
        self.resync.retain(|queued| queued != room_id);
        self.pending
            .retain(|update| update.room_id() != Some(room_id));
    }

    fn clear_typing(&mut self) {
        self.local_typing.clear_all();
        for room_id in self.typing.clear_all() {
            self.pending.push_back(ChatUpdate::TypingChanged {
                room_id,
                indicator: None,
            });
        }
    }

    fn push_typing_changed(&mut self, room_id: &str) {
        let indicator = self.typing.indicator(room_id);
        self.pending.push_back(ChatUpdate::TypingChanged {
            room_id: room_id.to_string(),
            indicator,
        });
    }

    fn send_typing_stop(&self, room_id: &str) {
        self.send_best_effort(ClientEvent::TypingStop {
            room_id: room_id.to_string(),
            user_id: self.config.identity.user_id.clone(),
        });
    }

    fn send_best_effort(&self, event: ClientEvent) {
        if let Err(e) = self.connection.send(event) {
            tracing::debug!("Skipped sending event: {}", e);
        }
    }
}

fn sweep_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn with_timeout<T, F>(limit: Duration, request: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    match tokio::time::timeout(limit, request).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout),
    }
}
