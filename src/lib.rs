//! Simple Cache - An in-process object cache
//!
//! Stores values addressed by both a numeric id and a string key, evicting
//! them by recency (size limit), age and access count, with an optional
//! background expiry sweeper.

pub mod cache;
pub mod config;
pub mod error;
pub mod repository;
pub mod tasks;

pub use cache::{CacheItem, ItemId, LimitedCache, Lookup, ObjectCache, SizeLimitedCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use repository::{CachedRepository, ItemLoader};
