//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint for health checks, feed status reporting, and Prometheus metrics.
//! Used by container orchestrators, load balancers, and monitoring systems.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON health status
//! - `GET /healthz` - Kubernetes liveness probe (simple OK)
//! - `GET /readyz` - Kubernetes readiness probe (checks the ticker)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::broadcast::{SharedChatHub, SharedNumbersHub};
use crate::infrastructure::metrics::get_metrics_handle;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded".
    pub status: HealthStatus,
    /// Server version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Per-feed status.
    pub feeds: FeedsStatus,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All feeds operational.
    Healthy,
    /// The counter ticker is not running; chat still works.
    Degraded,
}

/// Status of both feeds.
#[derive(Debug, Clone, Serialize)]
pub struct FeedsStatus {
    /// Chat feed status.
    pub chat: ChatFeedInfo,
    /// Counter feed status.
    pub numbers: NumbersFeedInfo,
}

/// Chat feed status.
#[derive(Debug, Clone, Serialize)]
pub struct ChatFeedInfo {
    /// Live stream subscribers.
    pub subscribers: usize,
    /// Messages currently retained in history.
    pub history_len: usize,
}

/// Counter feed status.
#[derive(Debug, Clone, Serialize)]
pub struct NumbersFeedInfo {
    /// Live stream subscribers.
    pub subscribers: usize,
    /// Snapshots published since start.
    pub ticks_published: u64,
    /// Whether the ticker task is running.
    pub ticker_running: bool,
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the health server.
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    chat: SharedChatHub,
    numbers: SharedNumbersHub,
}

impl HealthServerState {
    /// Create new health server state.
    #[must_use]
    pub fn new(version: String, chat: SharedChatHub, numbers: SharedNumbersHub) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            chat,
            numbers,
        }
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Health check HTTP server.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new health server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Health server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

/// Build the health router.
pub fn router(state: Arc<HealthServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(build_health_response(&state)))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    if state.numbers.is_ticker_running() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    let numbers = NumbersFeedInfo {
        subscribers: state.numbers.subscriber_count(),
        ticks_published: state.numbers.ticks_published(),
        ticker_running: state.numbers.is_ticker_running(),
    };
    let chat = ChatFeedInfo {
        subscribers: state.chat.subscriber_count(),
        history_len: state.chat.history_len(),
    };

    HealthResponse {
        status: determine_health_status(&numbers),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        feeds: FeedsStatus { chat, numbers },
    }
}

const fn determine_health_status(numbers: &NumbersFeedInfo) -> HealthStatus {
    if numbers.ticker_running {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::application::ports::CounterPublisher;
    use crate::domain::chat::PostedMessage;
    use crate::domain::numbers::Counters;
    use crate::infrastructure::broadcast::{ChatHub, NumbersHub};

    fn state() -> Arc<HealthServerState> {
        let counters: Counters = [('A', 1)].into_iter().collect();
        Arc::new(HealthServerState::new(
            "test-0.0.1".to_string(),
            Arc::new(ChatHub::with_defaults()),
            Arc::new(NumbersHub::new(counters)),
        ))
    }

    async fn get(state: Arc<HealthServerState>, uri: &str) -> (StatusCode, String) {
        let response = router(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }

    #[test]
    fn determine_status_follows_ticker() {
        let mut info = NumbersFeedInfo {
            subscribers: 0,
            ticks_published: 10,
            ticker_running: true,
        };
        assert_eq!(determine_health_status(&info), HealthStatus::Healthy);

        info.ticker_running = false;
        assert_eq!(determine_health_status(&info), HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        assert_eq!(get(state(), "/healthz").await, (StatusCode::OK, "OK".to_string()));
    }

    #[tokio::test]
    async fn readiness_tracks_ticker() {
        let state = state();
        let (status, _) = get(Arc::clone(&state), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        state.numbers.set_ticker_running(true);
        let (status, body) = get(state, "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "READY");
    }

    #[tokio::test]
    async fn health_reports_feed_counts() {
        let state = state();
        state.chat.publish(PostedMessage::new("alice", "hi")).unwrap();
        let _sub = state.chat.subscribe();

        let (status, body) = get(state, "/health").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["version"], "test-0.0.1");
        assert_eq!(json["feeds"]["chat"]["subscribers"], 1);
        assert_eq!(json["feeds"]["chat"]["history_len"], 1);
        assert_eq!(json["feeds"]["numbers"]["ticker_running"], false);
    }
}
