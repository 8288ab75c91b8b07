//! Application Services
//!
//! Services that orchestrate domain logic and drive the ports.
//!
//! - `Ticker`: owns the counter set and publishes a snapshot every period

mod ticker;

pub use ticker::{DEFAULT_TICK_INTERVAL, Ticker};
