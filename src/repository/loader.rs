//! Item Loader
//!
//! The source of truth consulted on cache misses.

use std::future::Future;

use crate::cache::ItemId;

/// Loads values from the backing source.
///
/// The batch variants default to one single-item load per request; sources
/// that can fetch in bulk should override them. A batch load may return its
/// values in any order.
pub trait ItemLoader<V: Send>: Send + Sync {
    fn load_by_id(&self, id: ItemId) -> impl Future<Output = anyhow::Result<V>> + Send;

    fn load_by_key(&self, key: &str) -> impl Future<Output = anyhow::Result<V>> + Send;

    fn load_by_ids(&self, ids: &[ItemId]) -> impl Future<Output = anyhow::Result<Vec<V>>> + Send {
        async move {
            let mut values = Vec::with_capacity(ids.len());
            for &id in ids {
                values.push(self.load_by_id(id).await?);
            }
            Ok(values)
        }
    }

    fn load_by_keys(&self, keys: &[&str]) -> impl Future<Output = anyhow::Result<Vec<V>>> + Send {
        async move {
            let mut values = Vec::with_capacity(keys.len());
            for &key in keys {
                values.push(self.load_by_key(key).await?);
            }
            Ok(values)
        }
    }
}
