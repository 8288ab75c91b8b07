//! Counter Feed Types
//!
//! Twenty-six counters keyed `A` through `Z` start at random values and
//! tick down once per period until they reach zero, where they stay.
//!
//! # Wire Format
//!
//! A snapshot is a flat JSON object with one entry per letter:
//!
//! ```json
//! {"A": 431552, "B": 120045, "...": 0, "Z": 299871}
//! ```

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Keys of the counter set.
pub const COUNTER_KEYS: RangeInclusive<char> = 'A'..='Z';

/// Number of counters in a full snapshot.
pub const COUNTER_COUNT: usize = 26;

/// Range of initial counter values.
pub const INITIAL_RANGE: RangeInclusive<u32> = 100_000..=500_000;

/// Range of the amount subtracted from a live counter on each tick.
pub const DECREMENT_RANGE: RangeInclusive<u32> = 1..=9;

/// A full snapshot of the counter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counters(BTreeMap<char, u32>);

impl Counters {
    /// Draw every counter independently from [`INITIAL_RANGE`].
    #[must_use]
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(
            COUNTER_KEYS
                .map(|key| (key, rng.random_range(INITIAL_RANGE)))
                .collect(),
        )
    }

    /// Advance one tick.
    ///
    /// Every counter above zero loses a random amount from
    /// [`DECREMENT_RANGE`], clamped at zero. Counters already at zero are
    /// left untouched.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for value in self.0.values_mut().filter(|v| **v > 0) {
            *value = value.saturating_sub(rng.random_range(DECREMENT_RANGE));
        }
    }

    /// Value of a single counter.
    #[must_use]
    pub fn get(&self, key: char) -> Option<u32> {
        self.0.get(&key).copied()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (char, u32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Number of counters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no counters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every counter has reached zero.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.0.values().all(|v| *v == 0)
    }
}

impl FromIterator<(char, u32)> for Counters {
    fn from_iter<I: IntoIterator<Item = (char, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
