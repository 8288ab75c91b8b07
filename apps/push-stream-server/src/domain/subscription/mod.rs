//! Subscriber Identity
//!
//! Every live subscription to a feed is keyed by a random identifier so
//! that membership can be removed without holding on to the queue itself.

use std::fmt;

use uuid::Uuid;

/// Unique identifier for a feed subscriber (one streaming connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
