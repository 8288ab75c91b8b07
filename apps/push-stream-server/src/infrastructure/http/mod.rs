//! Feed API Server
//!
//! HTTP surface for both feeds.
//!
//! # Endpoints
//!
//! - `POST /api/chat/message` - Publish a chat message
//! - `GET /api/chat/history` - Current chat history
//! - `GET /api/chat/stream` - Chat event stream (SSE)
//! - `GET /api/numbers/current` - Current counter snapshot
//! - `GET /api/numbers/stream` - Counter event stream (SSE)
//!
//! CORS is fully permissive so browser clients on any origin can connect.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::chat::ChatValidationError;
use crate::infrastructure::broadcast::{SharedChatHub, SharedNumbersHub};

/// Chat endpoint handlers.
pub mod chat;

/// Counter endpoint handlers.
pub mod numbers;

/// Generic SSE stream adapter.
pub mod sse;

// =============================================================================
// State
// =============================================================================

/// Shared state for API handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Chat feed hub.
    pub chat: SharedChatHub,
    /// Counter feed hub.
    pub numbers: SharedNumbersHub,
    /// Cancelled on process shutdown; ends every open stream.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create handler state.
    #[must_use]
    pub const fn new(
        chat: SharedChatHub,
        numbers: SharedNumbersHub,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            chat,
            numbers,
            shutdown,
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat/message", post(chat::post_message))
        .route("/api/chat/history", get(chat::history))
        .route("/api/chat/stream", get(chat::stream))
        .route("/api/numbers/current", get(numbers::current))
        .route("/api/numbers/stream", get(numbers::stream))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// API Server
// =============================================================================

/// Feed API HTTP server.
pub struct ApiServer {
    port: u16,
    state: AppState,
}

impl ApiServer {
    /// Create a new API server. Shutdown follows `state.shutdown`.
    #[must_use]
    pub const fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }

    /// Run the API server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), ServerError> {
        let cancel = self.state.shutdown.clone();
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(cancel.cancelled_owned())
            .await
            .map_err(|e| ServerError::ServerFailed(e.to_string()))?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// API server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

/// Request-level errors returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request failed validation.
    #[error(transparent)]
    Validation(#[from] ChatValidationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(e) => {
                tracing::debug!(error = %e, "Rejected chat message");
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
