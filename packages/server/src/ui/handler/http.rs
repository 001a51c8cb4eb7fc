//! HTTP API endpoint handlers (message persistence).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use studyhall_shared::dto::{
    ErrorResponse, HistoryResponse, MessageDto, SendMessageRequest, ServerEvent,
};

use crate::{
    domain::{MessageDraft, RoomId},
    ui::state::AppState,
    usecase::SendMessageError,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Query parameters for history fetch
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// `POST /chat/send`
///
/// Stores the message synchronously and returns the canonical record. The stored
/// record is then broadcast as `new-message` to every session joined to the room;
/// a broadcast failure does not fail the request.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<MessageDto>, ApiError> {
    let draft = MessageDraft::try_from(request)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let message = match state.send_message_usecase.execute(draft).await {
        Ok(message) => message,
        Err(e @ SendMessageError::InvalidMessage(_)) => {
            return Err(api_error(StatusCode::BAD_REQUEST, e));
        }
        Err(e @ SendMessageError::ReplyTargetNotFound(_)) => {
            return Err(api_error(StatusCode::NOT_FOUND, e));
        }
        Err(e) => {
            tracing::error!("Failed to store message: {}", e);
            return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e));
        }
    };

    let room_id = message.room_id.clone();
    // Domain Model から DTO への変換
    let dto: MessageDto = message.into();
    let event = ServerEvent::NewMessage {
        message: dto.clone(),
    };
    match serde_json::to_string(&event) {
        Ok(json) => {
            match state
                .send_message_usecase
                .broadcast_new_message(&room_id, &json)
                .await
            {
                Ok(targets) => tracing::debug!(
                    "Broadcasted message '{}' to {} session(s)",
                    dto.id,
                    targets.len()
                ),
                Err(e) => tracing::warn!("Failed to broadcast message '{}': {}", dto.id, e),
            }
        }
        Err(e) => tracing::error!("Failed to serialize new-message event: {}", e),
    }

    Ok(Json(dto))
}

/// `GET /chat/group/{room_id}?limit=N`
///
/// Returns the newest N messages of the room in chronological order.
pub async fn fetch_history(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let room_id = RoomId::new(room_id).map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let messages = state
        .fetch_history_usecase
        .execute(&room_id, query.limit)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch history for '{}': {}", room_id.as_str(), e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        })?;

    Ok(Json(HistoryResponse {
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}
