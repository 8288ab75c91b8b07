//! Prometheus Metrics Module
//!
//! Exposes feed metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Events**: Counts of events published, delivered, and rejected per feed
//! - **Subscribers**: Live subscriber gauge and pruned subscriber counter
//! - **Streams**: SSE frames written to clients
//! - **Ticker**: Counter ticks published
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Until
//! [`init_metrics`] is called the recording functions are no-ops.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Subsequent calls return the handle created by the first call.
///
/// # Panics
///
/// Panics if another global recorder was already installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            #[allow(clippy::expect_used)]
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "push_events_published_total",
        "Total events published to a feed"
    );
    describe_counter!(
        "push_events_delivered_total",
        "Total events enqueued to subscriber queues"
    );
    describe_counter!(
        "push_publish_rejected_total",
        "Total publish attempts rejected by validation"
    );
    describe_gauge!("push_subscribers", "Number of live feed subscribers");
    describe_counter!(
        "push_subscribers_pruned_total",
        "Subscribers removed during fan-out because their queue was gone"
    );
    describe_counter!(
        "push_stream_frames_written_total",
        "Total SSE frames written to clients"
    );
    describe_counter!("push_ticks_total", "Total counter ticks published");
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// Chat message feed.
    Chat,
    /// A-Z counter feed.
    Numbers,
}

impl FeedKind {
    /// Label value for this feed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Numbers => "numbers",
        }
    }
}

/// Record an event accepted by a feed and how many queues received it.
pub fn record_published(feed: FeedKind, delivered: usize) {
    counter!("push_events_published_total", "feed" => feed.as_str()).increment(1);
    counter!("push_events_delivered_total", "feed" => feed.as_str()).increment(delivered as u64);
}

/// Record a publish rejected by validation.
pub fn record_publish_rejected(feed: FeedKind) {
    counter!("push_publish_rejected_total", "feed" => feed.as_str()).increment(1);
}

/// Update the live subscriber count for a feed.
#[allow(clippy::cast_precision_loss)]
pub fn set_subscribers(feed: FeedKind, count: usize) {
    gauge!("push_subscribers", "feed" => feed.as_str()).set(count as f64);
}

/// Record subscribers dropped during fan-out.
pub fn record_subscribers_pruned(feed: FeedKind, count: usize) {
    counter!("push_subscribers_pruned_total", "feed" => feed.as_str()).increment(count as u64);
}

/// Record one SSE frame written to a client.
pub fn record_frame_written(feed: &'static str) {
    counter!("push_stream_frames_written_total", "feed" => feed).increment(1);
}

/// Record a counter tick.
pub fn record_tick() {
    counter!("push_ticks_total").increment(1);
}

// =============================================================================
// Tests
// =============================================================================
