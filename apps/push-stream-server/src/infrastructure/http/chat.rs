//! Chat endpoints.
//!
//! - `POST /api/chat/message` - `{"userName": "...", "message": "..."}`
//! - `GET /api/chat/history` - bounded history, oldest first
//! - `GET /api/chat/stream` - history replay, then live messages

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use super::{ApiError, AppState, sse};
use crate::domain::chat::{ChatMessage, PostedMessage};

/// Acknowledgement returned for an accepted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostAck {
    /// Always `true`.
    pub success: bool,
}

/// `POST /api/chat/message`
pub async fn post_message(
    State(state): State<AppState>,
    Json(posted): Json<PostedMessage>,
) -> Result<Json<PostAck>, ApiError> {
    state.chat.publish(posted)?;
    Ok(Json(PostAck { success: true }))
}

/// `GET /api/chat/history`
pub async fn history(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(state.chat.snapshot())
}

/// `GET /api/chat/stream`
pub async fn stream(State(state): State<AppState>) -> Response {
    sse::stream_response(Arc::clone(&state.chat), state.shutdown.clone())
}
