#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Push Stream Server - Real-time Chat and Counter Feeds
//!
//! An HTTP service that keeps two independent in-memory feeds and streams
//! them to any number of Server-Sent Events clients:
//!
//! - **Chat**: posted messages, stamped by the server, with the last 100
//!   replayed to every new viewer
//! - **Numbers**: 26 counters (`A`-`Z`) ticking down once per second
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Feed event types and rules
//!   - `chat`: Messages, validation, bounded history
//!   - `numbers`: Counter set and tick rule
//!   - `subscription`: Subscriber identity
//!
//! - **Application**: Ports and services
//!   - `ports`: `FeedHub` and `CounterPublisher` interfaces
//!   - `services`: The counter `Ticker`
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `broadcast`: Subscriber fan-out, chat and numbers hubs
//!   - `http`: API routes and the SSE stream adapter
//!   - `config`: Environment configuration
//!   - `health`: Health check HTTP endpoint
//!
//! # Data Flow
//!
//! ```text
//! POST /api/chat/message ──► ChatHub ────┐
//!                                        ├──► subscriber queues ──► SSE ──► Client 1
//! Ticker (1s) ─────────────► NumbersHub ─┘                                ──► Client N
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Feed types with no transport knowledge.
pub mod domain;

/// Application layer - Ports and services.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::chat::{
    ChatHistory, ChatMessage, ChatValidationError, PostedMessage, ValidatedMessage,
};
pub use domain::numbers::Counters;
pub use domain::subscription::SubscriberId;

// Ports and services
pub use application::ports::{CounterPublisher, FeedHub, Subscription};
pub use application::services::Ticker;

// Hubs
pub use infrastructure::broadcast::{
    ChatHub, NumbersHub, SharedChatHub, SharedNumbersHub, SubscriberSet,
};

// HTTP
pub use infrastructure::http::{ApiError, ApiServer, AppState, ServerError, router};

// Infrastructure config
pub use infrastructure::config::{ConfigError, FeedSettings, PushConfig, ServerSettings};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::{FeedKind, init_metrics};

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
