//! Read-Through Repository
//!
//! Serves values from a cache and falls back to an [`ItemLoader`] on misses,
//! storing whatever it loads.

mod loader;

pub use loader::ItemLoader;

use std::collections::HashMap;
use std::marker::PhantomData;

use tracing::debug;

use crate::cache::{CacheItem, ItemId, Lookup, ObjectCache};
use crate::error::{CacheError, Result};

// == Cached Repository ==
/// Read-through access to values by id or key.
pub struct CachedRepository<V, L, C> {
    loader: L,
    cache: C,
    _values: PhantomData<fn() -> V>,
}

impl<V, L, C> CachedRepository<V, L, C>
where
    V: CacheItem + Clone + Send + 'static,
    L: ItemLoader<V>,
    C: ObjectCache<V>,
{
    /// Creates a repository reading through `cache` into `loader`.
    ///
    /// # Arguments
    /// * `loader` - Source consulted on cache misses
    /// * `cache` - Any [`ObjectCache`], typically an `Arc` shared with other users
    pub fn new(loader: L, cache: C) -> Self {
        Self {
            loader,
            cache,
            _values: PhantomData,
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    // == Single Gets ==
    /// Returns the value for `id`, loading and caching it on a miss.
    ///
    /// # Returns
    /// `CacheError::Load` when the loader fails, or `DuplicateKey` when the
    /// loaded value's key is held by another cached id.
    pub async fn get_by_id(&self, id: ItemId) -> Result<V> {
        if let Some(value) = self.cache.get(Lookup::Id(id)).await {
            return Ok(value);
        }

        debug!(id, "cache miss, loading");
        let value = self
            .loader
            .load_by_id(id)
            .await
            .map_err(|err| CacheError::load(Lookup::Id(id).to_string(), err))?;
        self.cache.put(value.clone()).await?;
        Ok(value)
    }

    pub async fn get_by_key(&self, key: &str) -> Result<V> {
        if let Some(value) = self.cache.get(Lookup::Key(key)).await {
            return Ok(value);
        }

        debug!(key, "cache miss, loading");
        let value = self
            .loader
            .load_by_key(key)
            .await
            .map_err(|err| CacheError::load(Lookup::Key(key).to_string(), err))?;
        self.cache.put(value.clone()).await?;
        Ok(value)
    }

    // == Batch Gets ==
    /// Returns values in the order of `ids`. Hits come from the cache; all
    /// misses are fetched with a single batch load and cached.
    ///
    /// # Arguments
    /// * `ids` - Requested ids, in the order results are wanted
    ///
    /// # Returns
    /// One value per requested id, or `CacheError::Load` if the loader failed
    /// or left a requested id out of its result.
    pub async fn get_by_ids(&self, ids: &[ItemId]) -> Result<Vec<V>> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for &id in ids {
            let hit = self.cache.get(Lookup::Id(id)).await;
            if hit.is_none() {
                missing.push(id);
            }
            found.push(hit);
        }

        if !missing.is_empty() {
            debug!(misses = missing.len(), "batch cache miss, loading");
            let loaded = self
                .loader
                .load_by_ids(&missing)
                .await
                .map_err(|err| CacheError::load(format!("{} ids", missing.len()), err))?;

            let mut by_id = HashMap::with_capacity(loaded.len());
            for value in loaded {
                self.cache.put(value.clone()).await?;
                by_id.insert(value.id(), value);
            }
            for (slot, &id) in found.iter_mut().zip(ids) {
                if slot.is_none() {
                    *slot = by_id.get(&id).cloned();
                }
            }
        }

        collect_all(found, ids.iter().map(|&id| Lookup::Id(id)))
    }

    /// Returns values in the order of `keys`. Hits come from the cache; all
    /// misses are fetched with a single batch load and cached.
    pub async fn get_by_keys(&self, keys: &[&str]) -> Result<Vec<V>> {
        let mut found = Vec::with_capacity(keys.len());
        let mut missing = Vec::new();
        for &key in keys {
            let hit = self.cache.get(Lookup::Key(key)).await;
            if hit.is_none() {
                missing.push(key);
            }
            found.push(hit);
        }

        if !missing.is_empty() {
            debug!(misses = missing.len(), "batch cache miss, loading");
            let loaded = self
                .loader
                .load_by_keys(&missing)
                .await
                .map_err(|err| CacheError::load(format!("{} keys", missing.len()), err))?;

            let mut by_key = HashMap::with_capacity(loaded.len());
            for value in loaded {
                self.cache.put(value.clone()).await?;
                by_key.insert(value.key().to_owned(), value);
            }
            for (slot, &key) in found.iter_mut().zip(keys) {
                if slot.is_none() {
                    *slot = by_key.get(key).cloned();
                }
            }
        }

        collect_all(found, keys.iter().map(|&key| Lookup::Key(key)))
    }
}

/// Unwraps batch results, failing on the first request the loader left out.
fn collect_all<'a, V>(
    found: Vec<Option<V>>,
    lookups: impl Iterator<Item = Lookup<'a>>,
) -> Result<Vec<V>> {
    found
        .into_iter()
        .zip(lookups)
        .map(|(value, lookup)| {
            value.ok_or_else(|| {
                CacheError::load(
                    lookup.to_string(),
                    anyhow::anyhow!("loader returned no item for {}", lookup),
                )
            })
        })
        .collect()
}
