//! Counter endpoints.
//!
//! - `GET /api/numbers/current` - latest 26-counter snapshot
//! - `GET /api/numbers/stream` - current snapshot, then one per tick

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::Response;

use super::{AppState, sse};
use crate::domain::numbers::Counters;

/// `GET /api/numbers/current`
pub async fn current(State(state): State<AppState>) -> Json<Counters> {
    Json(state.numbers.snapshot())
}

/// `GET /api/numbers/stream`
pub async fn stream(State(state): State<AppState>) -> Response {
    sse::stream_response(Arc::clone(&state.numbers), state.shutdown.clone())
}
