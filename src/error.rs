//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

use crate::cache::ItemId;

// == Cache Error Enum ==
/// Unified error type for the cache and its read-through repository.
///
/// Lookup misses are not errors; only insert conflicts and loader failures
/// reach the caller.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The key of an inserted value is already held by a different id.
    /// The cache is left unchanged.
    #[error("Duplicate key '{key}': held by id {existing_id}, rejected for id {id}")]
    DuplicateKey {
        key: String,
        id: ItemId,
        existing_id: ItemId,
    },

    /// The item loader failed to produce a value on a cache miss
    #[error("Failed to load {lookup}")]
    Load {
        lookup: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl CacheError {
    /// Wraps a loader failure for the given lookup description.
    pub fn load(lookup: impl Into<String>, source: anyhow::Error) -> Self {
        CacheError::Load {
            lookup: lookup.into(),
            source: source.into(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
