//! Numbers Hub
//!
//! Holds the latest counter snapshot and the counter subscriber set. The
//! ticker is the only writer; it hands each new snapshot to
//! [`NumbersHub::publish`]. New subscribers get the latest snapshot at once
//! instead of waiting for the next tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::SubscriberSet;
use crate::application::ports::{CounterPublisher, FeedHub, Subscription};
use crate::application::services::Ticker;
use crate::domain::numbers::Counters;
use crate::domain::subscription::SubscriberId;
use crate::infrastructure::metrics::{self, FeedKind};

#[derive(Debug)]
struct NumbersState {
    current: Arc<Counters>,
    subscribers: SubscriberSet<Counters>,
}

/// Broadcast hub for the counter feed.
#[derive(Debug)]
pub struct NumbersHub {
    state: Mutex<NumbersState>,
    ticks_published: AtomicU64,
    ticker_running: AtomicBool,
}

/// Shared numbers hub reference.
pub type SharedNumbersHub = Arc<NumbersHub>;

impl NumbersHub {
    /// Create a hub whose current snapshot is `initial`.
    #[must_use]
    pub fn new(initial: Counters) -> Self {
        Self {
            state: Mutex::new(NumbersState {
                current: Arc::new(initial),
                subscribers: SubscriberSet::new(FeedKind::Numbers),
            }),
            ticks_published: AtomicU64::new(0),
            ticker_running: AtomicBool::new(false),
        }
    }

    /// Create a hub with freshly randomized counters and start its ticker.
    ///
    /// The ticker runs until `shutdown` is cancelled.
    #[must_use]
    pub fn start(period: Duration, shutdown: CancellationToken) -> (Arc<Self>, JoinHandle<()>) {
        let mut rng = StdRng::from_rng(&mut rand::rng());
        let counters = Counters::random(&mut rng);
        let hub = Arc::new(Self::new(counters.clone()));
        let ticker = Ticker::new(counters, Arc::clone(&hub), rng, period).spawn(shutdown);
        (hub, ticker)
    }

    /// Replace the current snapshot and fan it out. Returns the number of
    /// subscribers that received it.
    pub fn publish(&self, counters: Counters) -> usize {
        let snapshot = Arc::new(counters);
        let delivered = {
            let mut state = self.state.lock();
            state.current = Arc::clone(&snapshot);
            state.subscribers.broadcast(&snapshot)
        };

        self.ticks_published.fetch_add(1, Ordering::Relaxed);
        metrics::record_published(FeedKind::Numbers, delivered);
        delivered
    }

    /// Copy of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> Counters {
        Counters::clone(&self.state.lock().current)
    }

    /// Register a subscriber seeded with the current snapshot.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<Counters> {
        let mut state = self.state.lock();
        let seed = Arc::clone(&state.current);
        state.subscribers.register([seed])
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.state.lock().subscribers.remove(id);
    }

    /// Drop every subscriber, closing their queues.
    pub fn close(&self) {
        let closed = self.state.lock().subscribers.clear();
        tracing::info!(closed, "Numbers hub closed");
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Number of snapshots published since construction.
    #[must_use]
    pub fn ticks_published(&self) -> u64 {
        self.ticks_published.load(Ordering::Relaxed)
    }

    /// Whether a ticker is currently driving this hub.
    #[must_use]
    pub fn is_ticker_running(&self) -> bool {
        self.ticker_running.load(Ordering::Relaxed)
    }
}

impl CounterPublisher for NumbersHub {
    fn publish_counters(&self, counters: Counters) -> usize {
        self.publish(counters)
    }

    fn set_ticker_running(&self, running: bool) {
        self.ticker_running.store(running, Ordering::Relaxed);
    }
}

impl FeedHub for NumbersHub {
    type Event = Counters;

    fn feed_name(&self) -> &'static str {
        FeedKind::Numbers.as_str()
    }

    fn subscribe(&self) -> Subscription<Counters> {
        Self::subscribe(self)
    }

    fn unsubscribe(&self, id: SubscriberId) {
        Self::unsubscribe(self, id);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(value: u32) -> Counters {
        crate::domain::numbers::COUNTER_KEYS
            .map(|k| (k, value))
            .collect()
    }

    #[test]
    fn subscribe_seeds_current_snapshot() {
        let hub = NumbersHub::new(counters(10));
        let mut sub = hub.subscribe();

        let seeded = sub.try_recv().unwrap();
        assert_eq!(*seeded, counters(10));
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn publish_replaces_snapshot_and_fans_out() {
        let hub = NumbersHub::new(counters(10));
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        a.try_recv();
        b.try_recv();

        assert_eq!(hub.publish(counters(9)), 2);
        assert_eq!(hub.snapshot(), counters(9));
        assert_eq!(*a.try_recv().unwrap(), counters(9));
        assert_eq!(*b.try_recv().unwrap(), counters(9));
        assert_eq!(hub.ticks_published(), 1);
    }

    #[test]
    fn late_subscriber_sees_latest_not_initial() {
        let hub = NumbersHub::new(counters(10));
        hub.publish(counters(8));
        let mut sub = hub.subscribe();
        assert_eq!(*sub.try_recv().unwrap(), counters(8));
    }

    #[test]
    fn unsubscribe_is_idempotent_and_stops_delivery() {
        let hub = NumbersHub::new(counters(10));
        let mut sub = hub.subscribe();
        let mut other = hub.subscribe();
        sub.try_recv();
        other.try_recv();

        hub.unsubscribe(sub.id());
        hub.unsubscribe(sub.id());
        hub.unsubscribe(SubscriberId::new());
        hub.publish(counters(1));

        assert!(sub.try_recv().is_none());
        assert_eq!(*other.try_recv().unwrap(), counters(1));
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_publishes_ticks_to_subscribers() {
        let shutdown = CancellationToken::new();
        let (hub, ticker) = NumbersHub::start(Duration::from_secs(1), shutdown.clone());
        let mut sub = hub.subscribe();
        let seeded = sub.recv().await.unwrap();
        assert_eq!(seeded.len(), crate::domain::numbers::COUNTER_COUNT);

        let next = sub.recv().await.unwrap();
        assert!(hub.is_ticker_running());
        assert!(
            seeded
                .iter()
                .zip(next.iter())
                .all(|((_, before), (_, after))| after < before || before == 0)
        );

        shutdown.cancel();
        ticker.await.unwrap();
        assert!(!hub.is_ticker_running());
    }

    #[test]
    fn ticker_running_flag() {
        let hub = NumbersHub::new(counters(1));
        assert!(!hub.is_ticker_running());
        hub.set_ticker_running(true);
        assert!(hub.is_ticker_running());
    }
}
