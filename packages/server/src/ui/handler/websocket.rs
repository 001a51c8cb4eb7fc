//! WebSocket connection handlers (room pub/sub).

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use studyhall_shared::dto::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;

use crate::{
    domain::{DisplayName, PusherChannel, RoomId, SessionId, UserId},
    ui::state::AppState,
    usecase::RelayTypingError,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectQuery {
    pub user_id: String,
    pub user_name: String,
}

/// Identity of the user behind a connection
#[derive(Debug, Clone)]
struct ConnectionIdentity {
    user_id: UserId,
    display_name: DisplayName,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Domain Model
    let identity = match (
        UserId::new(query.user_id.clone()),
        DisplayName::new(query.user_name),
    ) {
        (Ok(user_id), Ok(display_name)) => ConnectionIdentity {
            user_id,
            display_name,
        },
        _ => {
            tracing::warn!("Invalid connection identity for '{}'", query.user_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

/// Spawns a task that receives events from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound flow: events addressed to this session
/// (broadcasts, typing relays, errors) are written to its WebSocket connection.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Serialize and queue an event for this session only
fn push_event(tx: &PusherChannel, event: &ServerEvent) {
    match serde_json::to_string(event) {
        Ok(json) => {
            if tx.send(json).is_err() {
                tracing::debug!("Session channel closed, dropping event");
            }
        }
        Err(e) => tracing::error!("Failed to serialize server event: {}", e),
    }
}

fn push_error(tx: &PusherChannel, message: impl Into<String>) {
    push_event(
        tx,
        &ServerEvent::Error {
            message: message.into(),
        },
    );
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: ConnectionIdentity) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this session to receive events
    let (tx, rx) = mpsc::unbounded_channel();
    let session_id = state.connect_session_usecase.execute(tx.clone()).await;
    tracing::info!(
        "Session '{}' connected for user '{}'",
        session_id.as_str(),
        identity.user_id.as_str()
    );

    // First frame: the server-assigned session id
    push_event(
        &tx,
        &ServerEvent::Connected {
            session_id: session_id.as_str().to_string(),
        },
    );

    let state_clone = state.clone();
    let session_id_clone = session_id.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        handle_client_event(&state_clone, &session_id_clone, &identity, event, &tx)
                            .await
                    }
                    Err(e) => {
                        tracing::warn!("Rejected malformed frame: {}", e);
                        push_error(&tx, format!("malformed event: {}", e));
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Session '{}' requested close", session_id_clone.as_str());
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push events addressed to this session
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let rooms = state.disconnect_session_usecase.execute(&session_id).await;
    tracing::info!(
        "Session '{}' disconnected, dropped membership of {} room(s)",
        session_id.as_str(),
        rooms.len()
    );
}

async fn handle_client_event(
    state: &AppState,
    session_id: &SessionId,
    identity: &ConnectionIdentity,
    event: ClientEvent,
    tx: &PusherChannel,
) {
    let room_id = match RoomId::new(event.room_id().to_string()) {
        Ok(room_id) => room_id,
        Err(e) => {
            push_error(tx, e.to_string());
            return;
        }
    };

    match event {
        ClientEvent::JoinGroup { .. } => {
            state.join_room_usecase.execute(session_id, &room_id).await;
        }
        ClientEvent::LeaveGroup { .. } => {
            state.leave_room_usecase.execute(session_id, &room_id).await;
        }
        ClientEvent::TypingStart { user_id, .. } => {
            if user_id != identity.user_id.as_str() {
                push_error(tx, "typing signal user does not match connection");
                return;
            }
            let relay = ServerEvent::UserTyping {
                room_id: room_id.as_str().to_string(),
                user_id,
                user_name: identity.display_name.as_str().to_string(),
            };
            relay_typing(state, session_id, &room_id, &relay).await;
        }
        ClientEvent::TypingStop { user_id, .. } => {
            if user_id != identity.user_id.as_str() {
                push_error(tx, "typing signal user does not match connection");
                return;
            }
            let relay = ServerEvent::UserStopTyping {
                room_id: room_id.as_str().to_string(),
                user_id,
            };
            relay_typing(state, session_id, &room_id, &relay).await;
        }
    }
}

async fn relay_typing(state: &AppState, session_id: &SessionId, room_id: &RoomId, event: &ServerEvent) {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize typing event: {}", e);
            return;
        }
    };

    match state
        .relay_typing_usecase
        .execute(session_id, room_id, &json)
        .await
    {
        Ok(targets) => tracing::debug!(
            "Relayed typing signal in '{}' to {} session(s)",
            room_id.as_str(),
            targets.len()
        ),
        Err(RelayTypingError::NotJoined(room)) => tracing::debug!(
            "Ignoring typing signal from '{}' for unjoined room '{}'",
            session_id.as_str(),
            room
        ),
        Err(e) => tracing::warn!("Failed to relay typing signal: {}", e),
    }
}
