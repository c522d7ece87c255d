//! Cache Module
//!
//! Provides an in-process object cache addressed by id and key, with size,
//! age and access-count eviction.

mod entry;
mod index;
mod item;
mod limited;
mod list;
mod policy;
mod size_limited;
mod store;
mod traits;


// Re-export public types
pub use entry::CacheEntry;
pub use index::{DualIndex, Upsert};
pub use item::{CacheItem, ItemId, Lookup};
pub use limited::LimitedCache;
pub use list::{SlotId, SlotList};
pub use policy::{EvictionPolicy, EvictionReason};
pub use size_limited::SizeLimitedCache;
pub use store::CacheStore;
pub use traits::ObjectCache;
