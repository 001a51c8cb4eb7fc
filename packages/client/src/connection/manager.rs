//! WebSocket connection lifecycle.
//!
//! `ConnectionManager` owns the socket through a supervisor task. The
//! supervisor pumps frames in both directions, and when the link drops it
//! reconnects with [`BackoffPolicy`], reporting progress as
//! [`ConnectionEvent`]s and through a `watch` channel of [`ConnectionState`].

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use studyhall_shared::dto::{ClientEvent, ServerEvent};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use super::{BackoffPolicy, ConnectionEvent, ConnectionState};
use crate::error::ClientError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for the server's `connected` frame after the upgrade
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// How long `disconnect` waits for the supervisor to close the socket
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Manages the single WebSocket connection of a client
pub struct ConnectionManager {
    url: String,
    backoff: BackoffPolicy,
    state: Arc<watch::Sender<ConnectionState>>,
    outgoing: Option<mpsc::UnboundedSender<ClientEvent>>,
    events: Option<mpsc::UnboundedReceiver<ConnectionEvent>>,
    supervisor: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>, backoff: BackoffPolicy) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            url: url.into(),
            backoff,
            state: Arc::new(state),
            outgoing: None,
            events: None,
            supervisor: None,
        }
    }

    /// Open the connection and return the server-assigned session id
    ///
    /// Calling this while connected returns the current session id. Calling
    /// it after the connection failed tears the old supervisor down first.
    pub async fn connect(&mut self) -> Result<String, ClientError> {
        if let ConnectionState::Connected { session_id } = self.state() {
            return Ok(session_id);
        }
        if self.supervisor.is_some() {
            self.disconnect().await;
        }

        self.state.send_replace(ConnectionState::Connecting);
        tracing::info!("Connecting to {}", self.url);

        let (stream, session_id) = match open_session(&self.url).await {
            Ok(opened) => opened,
            Err(e) => {
                self.state.send_replace(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        tracing::info!("Connected to chat server (session '{}')", session_id);
        self.state.send_replace(ConnectionState::Connected {
            session_id: session_id.clone(),
        });

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor {
            url: self.url.clone(),
            backoff: self.backoff.clone(),
            state: Arc::clone(&self.state),
            outgoing: outgoing_rx,
            events: events_tx,
        };
        self.supervisor = Some(tokio::spawn(supervisor.run(stream)));
        self.outgoing = Some(outgoing_tx);
        self.events = Some(events_rx);

        Ok(session_id)
    }

    /// Queue an event for the server
    ///
    /// Fails with `Disconnected` unless the connection is currently up; events
    /// are never buffered across an outage.
    pub fn send(&self, event: ClientEvent) -> Result<(), ClientError> {
        if !self.state().is_connected() {
            return Err(ClientError::Disconnected);
        }
        let Some(outgoing) = &self.outgoing else {
            return Err(ClientError::Disconnected);
        };
        outgoing.send(event).map_err(|_| ClientError::Disconnected)
    }

    /// Wait for the next event; `None` once the connection is closed
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        let events = self.events.as_mut()?;
        let event = events.recv().await;
        if event.is_none() {
            self.events = None;
        }
        event
    }

    /// Whether events may still arrive from the current connection
    pub fn is_open(&self) -> bool {
        self.events.is_some()
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn session_id(&self) -> Option<String> {
        match &*self.state.borrow() {
            ConnectionState::Connected { session_id } => Some(session_id.clone()),
            _ => None,
        }
    }

    /// Close the connection without reconnecting
    pub async fn disconnect(&mut self) {
        // Dropping the sender tells the supervisor to close the socket.
        self.outgoing.take();

        if let Some(handle) = self.supervisor.take() {
            let abort = handle.abort_handle();
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Connection supervisor did not stop in time, aborting");
                abort.abort();
            }
        }

        self.events.take();
        self.state.send_replace(ConnectionState::Disconnected);
        tracing::info!("Disconnected from chat server");
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.supervisor.take() {
            handle.abort();
        }
    }
}

/// Open a socket and read the `connected` frame that carries the session id
async fn open_session(url: &str) -> Result<(WsStream, String), ClientError> {
    let (mut stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

    let first = tokio::time::timeout(HANDSHAKE_TIMEOUT, stream.next())
        .await
        .map_err(|_| ClientError::Timeout)?;

    match first {
        Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerEvent>(&text) {
            Ok(ServerEvent::Connected { session_id }) => Ok((stream, session_id)),
            Ok(other) => Err(ClientError::Protocol(format!(
                "expected a connected frame, got {:?}",
                other
            ))),
            Err(e) => Err(ClientError::Protocol(e.to_string())),
        },
        Some(Ok(other)) => Err(ClientError::Protocol(format!(
            "expected a connected frame, got {:?}",
            other
        ))),
        Some(Err(e)) => Err(ClientError::Connection(e.to_string())),
        None => Err(ClientError::Connection(
            "connection closed during handshake".to_string(),
        )),
    }
}

enum SessionEnd {
    /// The owner closed the connection
    Shutdown,
    /// The link dropped
    Lost(String),
}

struct Supervisor {
    url: String,
    backoff: BackoffPolicy,
    state: Arc<watch::Sender<ConnectionState>>,
    outgoing: mpsc::UnboundedReceiver<ClientEvent>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl Supervisor {
    async fn run(mut self, mut stream: WsStream) {
        loop {
            match self.pump(stream).await {
                SessionEnd::Shutdown => {
                    tracing::debug!("Connection supervisor stopped");
                    return;
                }
                SessionEnd::Lost(reason) => {
                    tracing::warn!("Connection lost: {}", reason);
                    self.state
                        .send_replace(ConnectionState::Reconnecting { attempt: 1 });
                    if self.events.send(ConnectionEvent::Lost { reason }).is_err() {
                        return;
                    }
                    match self.reconnect().await {
                        Some(next) => stream = next,
                        None => return,
                    }
                }
            }
        }
    }

    /// Forward frames until the link drops or the owner goes away
    async fn pump(&mut self, stream: WsStream) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(ServerEvent::Connected { .. }) => {
                                tracing::debug!("Ignoring repeated connected frame");
                            }
                            Ok(event) => {
                                if self.events.send(ConnectionEvent::Server(event)).is_err() {
                                    let _ = write.send(Message::Close(None)).await;
                                    return SessionEnd::Shutdown;
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Dropping malformed server frame: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        return SessionEnd::Lost("server closed the connection".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
                    None => return SessionEnd::Lost("stream ended".to_string()),
                },
                outgoing = self.outgoing.recv() => match outgoing {
                    Some(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!("Failed to serialize client event: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(json.into())).await {
                            return SessionEnd::Lost(e.to_string());
                        }
                    }
                    None => {
                        let _ = write.send(Message::Close(None)).await;
                        return SessionEnd::Shutdown;
                    }
                },
            }
        }
    }

    /// Reconnect with backoff; `None` when giving up or shutting down
    async fn reconnect(&mut self) -> Option<WsStream> {
        let max_attempts = self.backoff.max_attempts;
        let mut attempt = 0;

        while self.backoff.should_retry(attempt) {
            attempt += 1;
            self.state
                .send_replace(ConnectionState::Reconnecting { attempt });

            let delay = self.backoff.delay_for(attempt);
            tracing::info!(
                "Reconnecting in {:?}... (attempt {}/{})",
                delay,
                attempt,
                max_attempts
            );
            if !self.wait_discarding(delay).await {
                return None;
            }

            match open_session(&self.url).await {
                Ok((stream, session_id)) => {
                    self.discard_queued();
                    tracing::info!("Reconnected to chat server (session '{}')", session_id);
                    self.state.send_replace(ConnectionState::Connected {
                        session_id: session_id.clone(),
                    });
                    if self
                        .events
                        .send(ConnectionEvent::Reconnected { session_id })
                        .is_err()
                    {
                        return None;
                    }
                    return Some(stream);
                }
                Err(e) => {
                    tracing::warn!("Reconnect attempt {} failed: {}", attempt, e);
                }
            }
        }

        tracing::error!("Failed to reconnect after {} attempts", max_attempts);
        self.state.send_replace(ConnectionState::Failed);
        let _ = self.events.send(ConnectionEvent::Failed);
        None
    }

    /// Sleep for `delay`, dropping stale outbound events meanwhile
    ///
    /// Returns `false` if the owner closed the connection during the wait.
    async fn wait_discarding(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                outgoing = self.outgoing.recv() => match outgoing {
                    Some(event) => tracing::debug!("Discarding {:?} while disconnected", event),
                    None => return false,
                },
            }
        }
    }

    fn discard_queued(&mut self) {
        while let Ok(event) = self.outgoing.try_recv() {
            tracing::debug!("Discarding stale {:?} queued before reconnect", event);
        }
    }
}

/// The far side of a connection that is not backed by a socket
#[cfg(test)]
pub(crate) struct LoopbackPeer {
    pub outgoing: mpsc::UnboundedReceiver<ClientEvent>,
    pub events: mpsc::UnboundedSender<ConnectionEvent>,
    pub state: Arc<watch::Sender<ConnectionState>>,
}

#[cfg(test)]
impl LoopbackPeer {
    /// Drain every event the client has queued so far
    pub fn sent(&mut self) -> Vec<ClientEvent> {
        let mut sent = Vec::new();
        while let Ok(event) = self.outgoing.try_recv() {
            sent.push(event);
        }
        sent
    }

    pub fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }
}

#[cfg(test)]
impl ConnectionManager {
    /// A connected manager whose traffic is routed to a [`LoopbackPeer`]
    pub(crate) fn loopback(session_id: &str) -> (Self, LoopbackPeer) {
        let mut manager = Self::new("ws://loopback/ws", BackoffPolicy::default());
        manager.state.send_replace(ConnectionState::Connected {
            session_id: session_id.to_string(),
        });

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        manager.outgoing = Some(outgoing_tx);
        manager.events = Some(events_rx);

        let peer = LoopbackPeer {
            outgoing: outgoing_rx,
            events: events_tx,
            state: Arc::clone(&manager.state),
        };
        (manager, peer)
    }
}
