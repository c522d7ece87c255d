//! Size Limited Cache Module
//!
//! A cache that applies only the recency/size rule.

use crate::cache::{CacheItem, LimitedCache, Lookup};
use crate::config::CacheConfig;
use crate::error::Result;

// == Size Limited Cache ==
/// Bounded LRU cache over the same engine as [`LimitedCache`], with the age
/// and access-count rules disabled and no sweeper.
#[derive(Debug)]
pub struct SizeLimitedCache<V> {
    inner: LimitedCache<V>,
}

impl<V> SizeLimitedCache<V>
where
    V: CacheItem + Clone + Send + 'static,
{
    /// Creates a cache holding at most `max_size` entries.
    ///
    /// # Arguments
    /// * `max_size` - Entry limit; the least recently touched entry goes first
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: LimitedCache::new(&CacheConfig::size_limited(max_size)),
        }
    }

    pub async fn get<'a>(&self, lookup: impl Into<Lookup<'a>>) -> Option<V> {
        self.inner.get(lookup).await
    }

    pub async fn put(&self, value: V) -> Result<()> {
        self.inner.put(value).await
    }

    pub async fn invalidate<'a>(&self, lookup: impl Into<Lookup<'a>>) {
        self.inner.invalidate(lookup).await
    }

    pub async fn flush(&self) {
        self.inner.flush().await
    }

    pub async fn count(&self) -> usize {
        self.inner.count().await
    }

    pub async fn max_size(&self) -> usize {
        self.inner.policy().await.max_size
    }

    pub async fn set_max_size(&self, max_size: usize) {
        self.inner.set_max_size(max_size).await
    }
}
