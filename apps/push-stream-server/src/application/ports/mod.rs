//! Port Interfaces
//!
//! Defines the contract between feed hubs and the transports that stream
//! them. The SSE adapter only sees a [`FeedHub`]; it never knows whether it
//! is draining chat messages or counter snapshots.
//!
//! ## Driven Ports
//!
//! - `FeedHub`: subscribe to a feed, receive a private event queue, and
//!   release it again when the connection ends.
//! - `CounterPublisher`: where the ticker sends each new counter snapshot.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::domain::numbers::Counters;
use crate::domain::subscription::SubscriberId;

// =============================================================================
// Subscription Handle
// =============================================================================

/// A subscriber's private, ordered event queue.
///
/// The queue is unbounded: publishers never wait on a slow reader.
#[derive(Debug)]
pub struct Subscription<T> {
    id: SubscriberId,
    receiver: mpsc::UnboundedReceiver<Arc<T>>,
}

impl<T> Subscription<T> {
    /// Wrap a receiver registered under `id`.
    #[must_use]
    pub const fn new(id: SubscriberId, receiver: mpsc::UnboundedReceiver<Arc<T>>) -> Self {
        Self { id, receiver }
    }

    /// Identifier to pass back to [`FeedHub::unsubscribe`].
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the hub has dropped this subscriber and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<Arc<T>> {
        self.receiver.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<T>> {
        self.receiver.try_recv().ok()
    }

    /// Number of events waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

// =============================================================================
// Feed Hub Port
// =============================================================================

/// A broadcast hub that can be streamed to clients.
pub trait FeedHub: Send + Sync + 'static {
    /// Event type delivered to subscribers.
    type Event: Serialize + Send + Sync + 'static;

    /// Short feed name used in logs and metric labels.
    fn feed_name(&self) -> &'static str;

    /// Register a new subscriber. The returned queue is already seeded with
    /// whatever initial state the feed replays to new viewers.
    fn subscribe(&self) -> Subscription<Self::Event>;

    /// Remove a subscriber. Unknown or already-removed ids are ignored.
    fn unsubscribe(&self, id: SubscriberId);
}

// =============================================================================
// Counter Publisher Port
// =============================================================================

/// Sink for counter snapshots produced by the ticker.
pub trait CounterPublisher: Send + Sync + 'static {
    /// Publish a full snapshot. Returns the number of subscribers reached.
    fn publish_counters(&self, counters: Counters) -> usize;

    /// Report whether the ticker feeding this sink is running.
    fn set_ticker_running(&self, _running: bool) {}
}
