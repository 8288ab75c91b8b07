//! Broadcast Hub Adapters
//!
//! Implements feed fan-out using one unbounded tokio mpsc queue per
//! subscriber.
//!
//! # Architecture
//!
//! Each hub guards its state (history or counters) and its
//! [`SubscriberSet`] with a single mutex, so a publish, a subscribe and an
//! unsubscribe are totally ordered:
//! - publish appends state and enqueues to every member under the lock
//! - subscribe seeds the new queue from state and registers it under the lock
//! - unsubscribe removes the member under the lock
//!
//! Enqueueing never blocks, so holding the lock across fan-out only costs
//! one channel push per subscriber.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::ports::Subscription;
use crate::domain::subscription::SubscriberId;
use crate::infrastructure::metrics::{self, FeedKind};

/// Chat feed hub.
pub mod chat;

/// Counter feed hub.
pub mod numbers;

pub use chat::{ChatHub, SharedChatHub};
pub use numbers::{NumbersHub, SharedNumbersHub};

// =============================================================================
// Subscriber Set
// =============================================================================

/// Membership set of one feed: a sender per live subscriber queue.
///
/// Not synchronized on its own; the owning hub serializes access.
#[derive(Debug)]
pub struct SubscriberSet<T> {
    feed: FeedKind,
    senders: HashMap<SubscriberId, mpsc::UnboundedSender<Arc<T>>>,
}

impl<T> SubscriberSet<T> {
    /// Create an empty set for the given feed.
    #[must_use]
    pub fn new(feed: FeedKind) -> Self {
        Self {
            feed,
            senders: HashMap::new(),
        }
    }

    /// Register a new subscriber whose queue starts with `seed`, in order.
    pub fn register(&mut self, seed: impl IntoIterator<Item = Arc<T>>) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in seed {
            // The receiver is held right here, so the send cannot fail.
            let _ = tx.send(event);
        }

        let id = SubscriberId::new();
        self.senders.insert(id, tx);
        metrics::set_subscribers(self.feed, self.senders.len());
        tracing::debug!(
            feed = self.feed.as_str(),
            subscriber = %id,
            subscribers = self.senders.len(),
            "Subscriber registered"
        );

        Subscription::new(id, rx)
    }

    /// Remove a subscriber. Returns whether it was a member.
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        let removed = self.senders.remove(&id).is_some();
        if removed {
            metrics::set_subscribers(self.feed, self.senders.len());
            tracing::debug!(
                feed = self.feed.as_str(),
                subscriber = %id,
                subscribers = self.senders.len(),
                "Subscriber removed"
            );
        }
        removed
    }

    /// Enqueue `event` to every member.
    ///
    /// Members whose receiving side is gone are pruned. Returns the number
    /// of queues that received the event.
    pub fn broadcast(&mut self, event: &Arc<T>) -> usize {
        let before = self.senders.len();
        self.senders
            .retain(|_, tx| tx.send(Arc::clone(event)).is_ok());

        let pruned = before - self.senders.len();
        if pruned > 0 {
            metrics::record_subscribers_pruned(self.feed, pruned);
            metrics::set_subscribers(self.feed, self.senders.len());
            tracing::debug!(feed = self.feed.as_str(), pruned, "Pruned closed subscribers");
        }

        self.senders.len()
    }

    /// Drop every member, closing their queues. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.senders.len();
        self.senders.clear();
        metrics::set_subscribers(self.feed, 0);
        count
    }

    /// Whether `id` is a current member.
    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.senders.contains_key(&id)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
