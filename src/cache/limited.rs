//! Limited Cache Module
//!
//! The thread-safe cache: one mutex around the eviction engine, shared with
//! an optional background expiry sweeper.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheItem, CacheStore, EvictionPolicy, Lookup};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{spawn_sweeper, SweeperHandle};

struct SweeperSlot {
    interval: Option<Duration>,
    handle: Option<SweeperHandle>,
}

// == Limited Cache ==
/// Object cache with size, age and access-count limits.
///
/// Every operation, and every sweep, runs under a single exclusive lock over
/// the whole engine state; calls take effect in lock acquisition order.
///
/// The sweeper runs only while both a sweep interval and a maximum entry age
/// are set. It needs a tokio runtime; without one it stays disarmed and
/// expired entries are only removed on access.
///
/// # Example
/// ```ignore
/// let cache = LimitedCache::new(&CacheConfig::default());
/// cache.put(fund).await?;
/// let hit = cache.get("FUND-1").await;
/// cache.shutdown().await;
/// ```
pub struct LimitedCache<V> {
    store: Arc<Mutex<CacheStore<V>>>,
    sweeper: Mutex<SweeperSlot>,
    completed_sweeps: Arc<AtomicU64>,
}

impl<V> LimitedCache<V>
where
    V: CacheItem + Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache from `config`, arming the sweeper when configured.
    ///
    /// # Arguments
    /// * `config` - Eviction limits and sweep interval; zero values disable a rule
    ///
    /// # Returns
    /// An empty cache. Outside a tokio runtime the sweeper stays unarmed and
    /// age expiry happens on access only.
    pub fn new(config: &CacheConfig) -> Self {
        let store = Arc::new(Mutex::new(CacheStore::new(config.policy())));
        let completed_sweeps = Arc::new(AtomicU64::new(0));
        let interval = normalize(config.sweep_interval);
        let handle = arm(&store, config.policy(), interval, &completed_sweeps);

        Self {
            store,
            sweeper: Mutex::new(SweeperSlot { interval, handle }),
            completed_sweeps,
        }
    }

    // == Get ==
    /// Retrieves a value by id or key.
    ///
    /// # Arguments
    /// * `lookup` - An [`ItemId`](crate::cache::ItemId), a `&str` key or a [`Lookup`]
    ///
    /// # Returns
    /// A clone of the cached value, or `None` on a miss. Entries found expired
    /// on access are evicted and reported as misses.
    pub async fn get<'a>(&self, lookup: impl Into<Lookup<'a>>) -> Option<V> {
        let lookup = lookup.into();
        self.store.lock().await.get(lookup)
    }

    // == Put ==
    /// Inserts or refreshes a value.
    ///
    /// # Returns
    /// `Err(CacheError::DuplicateKey)` when the value's key belongs to another
    /// id; the cache is then unchanged.
    pub async fn put(&self, value: V) -> Result<()> {
        self.store.lock().await.put(value)
    }

    // == Invalidate ==
    /// Removes an entry by id or key. Absent entries are a no-op.
    pub async fn invalidate<'a>(&self, lookup: impl Into<Lookup<'a>>) {
        let lookup = lookup.into();
        self.store.lock().await.invalidate(lookup);
    }

    // == Flush ==
    pub async fn flush(&self) {
        self.store.lock().await.flush();
    }

    // == Count ==
    /// Entries tracked. Age-expired entries stay counted until an access or
    /// a sweep removes them; see [`LimitedCache::valid_count`].
    pub async fn count(&self) -> usize {
        self.store.lock().await.count()
    }

    /// Entries that are not age-expired at this instant.
    pub async fn valid_count(&self) -> usize {
        self.store.lock().await.valid_count()
    }

    // == Configuration ==
    pub async fn policy(&self) -> EvictionPolicy {
        self.store.lock().await.policy()
    }

    /// Changes the size limit; 0 disables it. Excess entries are evicted at once.
    pub async fn set_max_size(&self, max_size: usize) {
        let mut store = self.store.lock().await;
        let policy = EvictionPolicy {
            max_size,
            ..store.policy()
        };
        store.set_policy(policy);
    }

    pub async fn set_max_access_count(&self, max_access_count: u32) {
        let mut store = self.store.lock().await;
        let policy = EvictionPolicy {
            max_access_count,
            ..store.policy()
        };
        store.set_policy(policy);
    }

    /// Changes the age limit, arming or disarming the sweeper to match.
    pub async fn set_max_entry_age(&self, max_entry_age: Option<Duration>) {
        let mut slot = self.sweeper.lock().await;
        let policy = {
            let mut store = self.store.lock().await;
            let policy = EvictionPolicy {
                max_entry_age: max_entry_age.filter(|age| !age.is_zero()),
                ..store.policy()
            };
            store.set_policy(policy);
            policy
        };
        self.rearm(&mut slot, policy).await;
    }

    pub async fn sweep_interval(&self) -> Option<Duration> {
        self.sweeper.lock().await.interval
    }

    /// Replaces the sweep schedule. The previous sweeper is stopped, and any
    /// sweep it has in flight finishes, before the new one is armed.
    ///
    /// # Arguments
    /// * `interval` - New period; `None` or zero leaves no sweeper running
    pub async fn set_sweep_interval(&self, interval: Option<Duration>) {
        let mut slot = self.sweeper.lock().await;
        slot.interval = normalize(interval);
        let policy = self.store.lock().await.policy();
        self.rearm(&mut slot, policy).await;
    }

    async fn rearm(&self, slot: &mut SweeperSlot, policy: EvictionPolicy) {
        if let Some(previous) = slot.handle.take() {
            previous.shutdown().await;
        }
        slot.handle = arm(&self.store, policy, slot.interval, &self.completed_sweeps);
    }

    // == Sweeps ==
    /// Number of sweeps completed since creation.
    pub fn completed_sweeps(&self) -> u64 {
        self.completed_sweeps.load(Ordering::Relaxed)
    }

    /// Whether a sweeper schedule is currently active.
    pub async fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .await
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // == Shutdown ==
    /// Stops the sweeper and waits for a sweep in flight. The cache stays
    /// usable; only background expiry ends.
    pub async fn shutdown(&self) {
        let mut slot = self.sweeper.lock().await;
        if let Some(handle) = slot.handle.take() {
            handle.shutdown().await;
            debug!("Cache sweeper shut down");
        }
    }
}

impl<V> Drop for LimitedCache<V> {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().handle.take() {
            handle.stop();
        }
    }
}

impl<V> std::fmt::Debug for LimitedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimitedCache")
            .field("completed_sweeps", &self.completed_sweeps.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Zero intervals mean no sweeper.
fn normalize(interval: Option<Duration>) -> Option<Duration> {
    interval.filter(|interval| !interval.is_zero())
}

fn arm<V>(
    store: &Arc<Mutex<CacheStore<V>>>,
    policy: EvictionPolicy,
    interval: Option<Duration>,
    completed: &Arc<AtomicU64>,
) -> Option<SweeperHandle>
where
    V: CacheItem + Clone + Send + 'static,
{
    let interval = interval?;
    if !policy.is_age_bounded() {
        return None;
    }
    if tokio::runtime::Handle::try_current().is_err() {
        warn!("No tokio runtime available; expiry sweeper not started");
        return None;
    }
    Some(spawn_sweeper(Arc::clone(store), interval, Arc::clone(completed)))
}
