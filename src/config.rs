//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use serde::Serialize;

use crate::cache::EvictionPolicy;

/// Cache configuration parameters.
///
/// Every rule is independently switchable: a zero size or count, or a
/// `None`/zero duration, disables it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheConfig {
    /// Maximum number of entries; 0 disables size-based eviction
    pub max_size: usize,
    /// Age after which an entry expires, measured from insertion
    pub max_entry_age: Option<Duration>,
    /// Number of touches after which an entry is evicted; 0 disables the rule
    pub max_access_count: u32,
    /// Period of the background sweeper
    pub sweep_interval: Option<Duration>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_MAX_ENTRY_AGE_MS` - Entry age limit in milliseconds (default: 600000)
    /// - `CACHE_MAX_ACCESS_COUNT` - Access limit per entry (default: 50)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweeper period in milliseconds (default: 600000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: env_parse("CACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            max_entry_age: env_parse("CACHE_MAX_ENTRY_AGE_MS")
                .map(millis)
                .unwrap_or(defaults.max_entry_age),
            max_access_count: env_parse("CACHE_MAX_ACCESS_COUNT")
                .unwrap_or(defaults.max_access_count),
            sweep_interval: env_parse("CACHE_SWEEP_INTERVAL_MS")
                .map(millis)
                .unwrap_or(defaults.sweep_interval),
        }
    }

    /// Configuration that only bounds the number of entries.
    pub fn size_limited(max_size: usize) -> Self {
        Self {
            max_size,
            max_entry_age: None,
            max_access_count: 0,
            sweep_interval: None,
        }
    }

    /// The eviction rules carried by this configuration.
    pub fn policy(&self) -> EvictionPolicy {
        EvictionPolicy {
            max_size: self.max_size,
            max_entry_age: self.max_entry_age.filter(|age| !age.is_zero()),
            max_access_count: self.max_access_count,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            max_entry_age: Some(Duration::from_secs(600)),
            max_access_count: 50,
            sweep_interval: Some(Duration::from_secs(600)),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Zero milliseconds means disabled.
fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}
