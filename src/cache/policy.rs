//! Eviction Policy Module
//!
//! The set of independently switchable eviction rules applied on every touch.

use std::time::{Duration, Instant};

use crate::cache::CacheEntry;

// == Eviction Policy ==
/// Enabled eviction rules. A zero limit or `None` age disables that rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Maximum number of entries kept in recency order
    pub max_size: usize,
    /// Age limit measured from entry creation
    pub max_entry_age: Option<Duration>,
    /// Touches allowed before an entry is evicted
    pub max_access_count: u32,
}

impl EvictionPolicy {
    /// Only the recency/size rule.
    pub fn size_only(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }

    pub fn is_size_bounded(&self) -> bool {
        self.max_size > 0
    }

    pub fn is_age_bounded(&self) -> bool {
        self.max_entry_age.is_some()
    }

    pub fn is_access_bounded(&self) -> bool {
        self.max_access_count > 0
    }

    /// Checks whether more than `len` entries breach the size rule.
    pub fn exceeds_size(&self, len: usize) -> bool {
        self.is_size_bounded() && len > self.max_size
    }

    /// Checks the age rule for an entry.
    pub fn is_expired<V>(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        self.max_entry_age
            .map_or(false, |max_age| entry.is_expired(max_age, now))
    }

    /// Checks the access-count rule against a freshly incremented counter.
    pub fn is_exhausted(&self, access_count: u32) -> bool {
        self.is_access_bounded() && access_count > self.max_access_count
    }
}

// == Eviction Reason ==
/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// Pushed out of the recency list by the size rule
    SizeLimit,
    /// Found age-expired on access
    Expired,
    /// Touched more than the access limit
    AccessLimit,
    /// Age-expired and removed by the background sweeper
    Swept,
    /// Removed by an explicit invalidate
    Invalidated,
}
