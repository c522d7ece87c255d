//! Expiry Sweeper Task
//!
//! Background task that periodically removes age-expired cache entries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::{CacheItem, CacheStore};

// == Sweeper Handle ==
/// Owns a running sweeper schedule.
///
/// Dropping the handle (or calling [`SweeperHandle::stop`]) drops the stop
/// sender, which the task observes before its next tick. A sweep already in
/// flight runs to completion.
#[derive(Debug)]
pub struct SweeperHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
    interval: Duration,
}

impl SweeperHandle {
    /// Period of this schedule.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Signals the task to stop without waiting for it.
    pub fn stop(self) {
        let _ = self.stop.send(());
    }

    /// Signals the task to stop and waits until it has exited, including any
    /// sweep in flight.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        if let Err(err) = self.task.await {
            warn!("Expiry sweeper ended abnormally: {}", err);
        }
    }

    /// Whether the task has exited, normally or by panicking.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns a task that sweeps age-expired entries every `interval`.
///
/// The first sweep runs one full interval after spawning. Ticks that come due
/// while a sweep is still running are dropped: once a sweep finishes, the
/// next one is scheduled a full interval later. Each sweep runs in its own
/// task so a panic inside it is logged and the schedule keeps going; the
/// store's mutex does not poison.
///
/// # Arguments
/// * `store` - Shared engine state, locked for the duration of each sweep
/// * `interval` - Period between the end of one sweep and the next tick
/// * `completed` - Counter incremented after every completed sweep, including
///   sweeps that removed nothing
///
/// # Returns
/// A [`SweeperHandle`] that stops the schedule when signalled or dropped.
///
/// # Panics
/// Must be called from within a tokio runtime.
pub fn spawn_sweeper<V>(
    store: Arc<Mutex<CacheStore<V>>>,
    interval: Duration,
    completed: Arc<AtomicU64>,
) -> SweeperHandle
where
    V: CacheItem + Clone + Send + 'static,
{
    spawn_with(store, interval, completed, CacheStore::sweep_expired)
}

/// Runs the sweeper schedule with `sweep` as the per-tick pass.
fn spawn_with<V, F>(
    store: Arc<Mutex<CacheStore<V>>>,
    interval: Duration,
    completed: Arc<AtomicU64>,
    sweep: F,
) -> SweeperHandle
where
    V: CacheItem + Clone + Send + 'static,
    F: Fn(&mut CacheStore<V>) -> usize + Send + Sync + 'static,
{
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let sweep = Arc::new(sweep);

    let task = tokio::spawn(async move {
        info!(
            "Starting expiry sweeper with interval of {} ms",
            interval.as_millis()
        );

        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                // fires on an explicit stop and when the sender is dropped
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {}
            }

            let sweep_store = Arc::clone(&store);
            let sweep = Arc::clone(&sweep);
            let outcome = tokio::spawn(async move {
                let mut guard = sweep_store.lock().await;
                (*sweep)(&mut *guard)
            })
            .await;

            // discard ticks that came due while this sweep ran
            ticker.reset();

            match outcome {
                Ok(removed) => {
                    completed.fetch_add(1, Ordering::Relaxed);
                    if removed > 0 {
                        info!("Expiry sweep: removed {} expired entries", removed);
                    } else {
                        debug!("Expiry sweep: no expired entries found");
                    }
                }
                Err(err) => warn!("Expiry sweep failed: {}", err),
            }
        }

        debug!("Expiry sweeper stopped");
    });

    SweeperHandle {
        stop: stop_tx,
        task,
        interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{EvictionPolicy, ItemId, Lookup};

    #[derive(Debug, Clone)]
    struct Element {
        id: ItemId,
        key: String,
    }

    impl CacheItem for Element {
        fn id(&self) -> ItemId {
            self.id
        }

        fn key(&self) -> &str {
            &self.key
        }
    }

    fn element(id: ItemId) -> Element {
        Element {
            id,
            key: format!("key.{}", id),
        }
    }

    fn aged_store(max_age: Duration) -> Arc<Mutex<CacheStore<Element>>> {
        Arc::new(Mutex::new(CacheStore::new(EvictionPolicy {
            max_entry_age: Some(max_age),
            ..EvictionPolicy::default()
        })))
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let store = aged_store(Duration::from_millis(200));
        store.lock().await.put(element(1)).unwrap();

        let completed = Arc::new(AtomicU64::new(0));
        let handle = spawn_sweeper(store.clone(), Duration::from_millis(100), completed.clone());

        tokio::time::sleep(Duration::from_millis(600)).await;

        // no get ran, so only the sweeper can have removed it
        assert_eq!(store.lock().await.count(), 0);
        assert!(completed.load(Ordering::Relaxed) >= 2);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_preserves_valid_entries() {
        let store = aged_store(Duration::from_secs(3600));
        store.lock().await.put(element(1)).unwrap();

        let completed = Arc::new(AtomicU64::new(0));
        let handle = spawn_sweeper(store.clone(), Duration::from_millis(100), completed.clone());

        tokio::time::sleep(Duration::from_millis(350)).await;

        assert!(store.lock().await.get(Lookup::Id(1)).is_some());
        // sweeps that find nothing still count
        assert!(completed.load(Ordering::Relaxed) >= 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_stops_ticking_after_shutdown() {
        let store = aged_store(Duration::from_secs(3600));
        let completed = Arc::new(AtomicU64::new(0));
        let handle = spawn_sweeper(store, Duration::from_millis(50), completed.clone());

        tokio::time::sleep(Duration::from_millis(180)).await;
        handle.shutdown().await;
        let after_shutdown = completed.load(Ordering::Relaxed);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(completed.load(Ordering::Relaxed), after_shutdown);
    }

    #[tokio::test]
    async fn test_dropped_handle_stops_task() {
        let store = aged_store(Duration::from_secs(3600));
        let completed = Arc::new(AtomicU64::new(0));
        let handle = spawn_sweeper(store, Duration::from_millis(50), completed.clone());
        let interval = handle.interval();
        assert_eq!(interval, Duration::from_millis(50));

        drop(handle);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(completed.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_sweep_waits_for_lock() {
        let store = aged_store(Duration::from_millis(50));
        store.lock().await.put(element(1)).unwrap();

        let completed = Arc::new(AtomicU64::new(0));
        let handle = spawn_sweeper(store.clone(), Duration::from_millis(100), completed.clone());

        {
            // hold the lock across several due ticks
            let guard = store.lock().await;
            tokio::time::sleep(Duration::from_millis(350)).await;
            assert_eq!(guard.count(), 1);
            assert_eq!(completed.load(Ordering::Relaxed), 0);
        }

        // the blocked sweep finishes at ~350 ms and the next tick is a full
        // interval later, so the ticks at 200 and 300 ms never run
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.lock().await.count(), 0);
        assert_eq!(completed.load(Ordering::Relaxed), 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_panicking_sweep_does_not_stop_schedule() {
        let store = aged_store(Duration::from_millis(50));
        store.lock().await.put(element(1)).unwrap();

        let calls = Arc::new(AtomicU64::new(0));
        let sweep_calls = calls.clone();
        let completed = Arc::new(AtomicU64::new(0));
        let handle = spawn_with(
            store.clone(),
            Duration::from_millis(50),
            completed.clone(),
            move |store: &mut CacheStore<Element>| {
                if sweep_calls.fetch_add(1, Ordering::Relaxed) == 0 {
                    panic!("sweep failed while holding the store");
                }
                store.sweep_expired()
            },
        );

        tokio::time::sleep(Duration::from_millis(300)).await;

        // the first sweep panicked and did not count; later ones ran
        assert!(calls.load(Ordering::Relaxed) >= 2);
        assert!(completed.load(Ordering::Relaxed) >= 1);
        assert!(!handle.is_finished());

        // the lock was released on unwind
        let guard = tokio::time::timeout(Duration::from_millis(100), store.lock())
            .await
            .expect("store lock is still held after a panicking sweep");
        assert_eq!(guard.count(), 0);
        drop(guard);

        handle.shutdown().await;
    }
}
