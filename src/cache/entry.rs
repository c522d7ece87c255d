//! Cache Entry Module
//!
//! Defines the bookkeeping wrapped around each cached value.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion time, the baseline for age expiry
    pub created_at: Instant,
    /// Time of the most recent touch
    pub last_access: Instant,
    /// Touches since insertion or the last refresh
    pub access_count: u32,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new, untouched entry.
    pub fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            created_at: now,
            last_access: now,
            access_count: 0,
        }
    }

    // == Refresh ==
    /// Restarts the entry's age clock and access counter after a value refresh.
    pub fn refresh(&mut self, now: Instant) {
        self.created_at = now;
        self.last_access = now;
        self.access_count = 0;
    }

    // == Record Access ==
    /// Records a touch and returns the updated access count.
    pub fn record_access(&mut self, now: Instant) -> u32 {
        self.last_access = now;
        self.access_count = self.access_count.saturating_add(1);
        self.access_count
    }

    // == Age ==
    /// Time elapsed since insertion.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    // == Is Expired ==
    /// Checks whether the entry has outlived `max_age`.
    ///
    /// Boundary condition: an entry whose age equals `max_age` is still
    /// valid; it expires once its age is strictly greater.
    pub fn is_expired(&self, max_age: Duration, now: Instant) -> bool {
        self.age(now) > max_age
    }
}
