//! Counter Ticker
//!
//! A single background task that exclusively owns the counters. Every
//! period it advances them one tick and hands an immutable snapshot to its
//! [`CounterPublisher`]. Nothing else writes the counters, so they need no
//! lock of their own.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::application::ports::CounterPublisher;
use crate::domain::numbers::Counters;
use crate::infrastructure::metrics;

/// Default tick period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic producer for the counter feed.
#[derive(Debug)]
pub struct Ticker<P, R> {
    counters: Counters,
    publisher: Arc<P>,
    rng: R,
    period: Duration,
}

impl<P, R> Ticker<P, R>
where
    P: CounterPublisher,
    R: Rng + Send + 'static,
{
    /// Create a ticker that starts from `counters`.
    #[must_use]
    pub const fn new(counters: Counters, publisher: Arc<P>, rng: R, period: Duration) -> Self {
        Self {
            counters,
            publisher,
            rng,
            period,
        }
    }

    /// The counters as of the last tick.
    #[must_use]
    pub const fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Advance the counters once and publish the result. Returns the number
    /// of subscribers reached.
    pub fn tick_once(&mut self) -> usize {
        self.counters.tick(&mut self.rng);
        metrics::record_tick();
        self.publisher.publish_counters(self.counters.clone())
    }

    /// Tick every period until `shutdown` is cancelled.
    ///
    /// The first tick fires immediately.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.publisher.set_ticker_running(true);
        tracing::info!(
            period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX),
            "Ticker started"
        );

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let delivered = self.tick_once();
                    tracing::trace!(delivered, "Counters ticked");
                }
            }
        }

        self.publisher.set_ticker_running(false);
        tracing::info!("Ticker stopped");
    }

    /// Spawn [`Ticker::run`] on the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

// =============================================================================
// Tests
// =============================================================================
