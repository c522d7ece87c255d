//! Integration Tests for the Cache API
//!
//! Exercises `LimitedCache`, `SizeLimitedCache` and the read-through
//! repository through the public interface, including the background sweeper
//! with real (shortened) timings.

use std::sync::Arc;
use std::time::Duration;

use simple_cache::{
    CacheConfig, CacheError, CacheItem, CachedRepository, ItemId, ItemLoader, LimitedCache,
    Lookup, SizeLimitedCache,
};

// == Helper Types ==

#[derive(Debug, Clone, PartialEq)]
struct Fund {
    id: ItemId,
    key: String,
    name: String,
}

impl CacheItem for Fund {
    fn id(&self) -> ItemId {
        self.id
    }

    fn key(&self) -> &str {
        &self.key
    }
}

fn fund(id: ItemId, key: &str) -> Fund {
    Fund {
        id,
        key: key.to_string(),
        name: format!("Fund {}", id),
    }
}

fn config(
    max_size: usize,
    max_access_count: u32,
    max_entry_age: Duration,
    sweep_interval: Duration,
) -> CacheConfig {
    CacheConfig {
        max_size,
        max_entry_age: Some(max_entry_age),
        max_access_count,
        sweep_interval: Some(sweep_interval),
    }
}

fn unlimited() -> CacheConfig {
    CacheConfig {
        max_size: 0,
        max_entry_age: None,
        max_access_count: 0,
        sweep_interval: None,
    }
}

// == Size Limit ==

#[tokio::test]
async fn test_size_limit_of_one_keeps_latest() {
    let cache = LimitedCache::new(&config(
        1,
        100,
        Duration::from_secs(3600),
        Duration::from_secs(600),
    ));
    let fund1 = fund(1, "test1");
    let fund2 = fund(2, "test2");

    cache.put(fund1.clone()).await.unwrap();
    assert_eq!(cache.count().await, 1);
    cache.put(fund2.clone()).await.unwrap();
    assert_eq!(cache.count().await, 1);

    assert_eq!(cache.get(Lookup::Id(2)).await, Some(fund2.clone()));
    assert_eq!(cache.get("test2").await, Some(fund2));
    assert_eq!(cache.get(Lookup::Id(1)).await, None);
    assert_eq!(cache.get("test1").await, None);

    cache.shutdown().await;
}

#[tokio::test]
async fn test_size_limited_variant_keeps_latest() {
    let cache = SizeLimitedCache::new(1);

    cache.put(fund(1, "test1")).await.unwrap();
    cache.put(fund(2, "test2")).await.unwrap();

    assert_eq!(cache.count().await, 1);
    assert!(cache.get("test1").await.is_none());
    assert!(cache.get("test2").await.is_some());
}

// == Age Expiry ==

#[tokio::test]
async fn test_expires_by_time_through_sweeper() {
    let cache = LimitedCache::new(&config(
        100,
        100,
        Duration::from_millis(400),
        Duration::from_millis(400),
    ));
    let value = fund(1, "test1");

    cache.put(value.clone()).await.unwrap();
    assert_eq!(cache.count().await, 1);
    assert_eq!(cache.get(Lookup::Id(1)).await, Some(value));

    tokio::time::sleep(Duration::from_millis(1200)).await;

    // no lookup in between: only the sweeper can have removed it
    assert_eq!(cache.count().await, 0);
    assert!(cache.completed_sweeps() >= 1);

    cache.shutdown().await;
}

#[tokio::test]
async fn test_expires_by_time_on_access_without_sweep() {
    let cache = LimitedCache::new(&config(
        100,
        100,
        Duration::from_millis(400),
        Duration::from_secs(3600),
    ));
    let value = fund(1, "test1");

    cache.put(value.clone()).await.unwrap();
    assert_eq!(cache.get(Lookup::Id(1)).await, Some(value));

    tokio::time::sleep(Duration::from_millis(1200)).await;

    // still tracked, but no longer valid
    assert_eq!(cache.count().await, 1);
    assert_eq!(cache.valid_count().await, 0);
    assert_eq!(cache.completed_sweeps(), 0);

    assert_eq!(cache.get(Lookup::Id(1)).await, None);
    assert_eq!(cache.count().await, 0);

    cache.shutdown().await;
}

#[tokio::test]
async fn test_sweeper_rearmed_at_runtime() {
    let cache = LimitedCache::new(&config(
        100,
        0,
        Duration::from_millis(200),
        Duration::from_secs(3600),
    ));
    cache.put(fund(1, "test1")).await.unwrap();

    cache
        .set_sweep_interval(Some(Duration::from_millis(100)))
        .await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(cache.count().await, 0);
    let sweeps = cache.completed_sweeps();
    assert!(sweeps >= 2, "expected several sweeps, got {}", sweeps);

    cache.shutdown().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(cache.completed_sweeps(), sweeps);
}

// == Access Count ==

#[tokio::test]
async fn test_expires_by_access_count() {
    let cache = LimitedCache::new(&config(
        100,
        1,
        Duration::from_secs(600),
        Duration::from_secs(60),
    ));
    let value = fund(1, "test1");

    cache.put(value.clone()).await.unwrap();
    assert_eq!(cache.count().await, 1);

    assert_eq!(cache.get(Lookup::Id(1)).await, Some(value));

    assert_eq!(cache.count().await, 0);
    assert_eq!(cache.get(Lookup::Id(1)).await, None);

    cache.shutdown().await;
}

// == Identity ==

#[tokio::test]
async fn test_duplicate_key_rejected() {
    let cache = LimitedCache::new(&config(
        100,
        50,
        Duration::from_secs(300),
        Duration::from_secs(600),
    ));
    let fund1 = fund(1, "test");
    cache.put(fund1.clone()).await.unwrap();

    let result = cache.put(fund(2, "test")).await;

    match result {
        Err(CacheError::DuplicateKey {
            key,
            id,
            existing_id,
        }) => {
            assert_eq!(key, "test");
            assert_eq!(id, 2);
            assert_eq!(existing_id, 1);
        }
        other => panic!("expected DuplicateKey, got {:?}", other),
    }
    assert_eq!(cache.count().await, 1);
    assert_eq!(cache.get(Lookup::Id(1)).await, Some(fund1.clone()));
    assert_eq!(cache.get("test").await, Some(fund1));

    cache.shutdown().await;
}

#[tokio::test]
async fn test_roundtrip_and_repeated_reads() {
    let cache = LimitedCache::new(&unlimited());
    let value = fund(42, "FUND-42");
    cache.put(value.clone()).await.unwrap();

    for _ in 0..10 {
        assert_eq!(cache.get(Lookup::Id(42)).await, Some(value.clone()));
        assert_eq!(cache.get("FUND-42").await, Some(value.clone()));
    }
}

#[tokio::test]
async fn test_invalidate_and_flush() {
    let cache = LimitedCache::new(&unlimited());
    for id in 1..=5 {
        cache.put(fund(id, &format!("test{}", id))).await.unwrap();
    }

    cache.invalidate(Lookup::Id(1)).await;
    cache.invalidate("test2").await;
    cache.invalidate("missing").await;
    assert_eq!(cache.count().await, 3);

    cache.flush().await;
    assert_eq!(cache.count().await, 0);
    for id in 1..=5 {
        assert!(cache.get(Lookup::Id(id)).await.is_none());
        assert!(cache.get(format!("test{}", id).as_str()).await.is_none());
    }

    // flushing an empty cache is fine too
    cache.flush().await;
    assert_eq!(cache.count().await, 0);
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_puts_converge() {
    let cache = Arc::new(LimitedCache::new(&unlimited()));
    let tasks = 16;
    let per_task = 50;
    let shared = 10;

    let mut handles = Vec::new();
    for task in 0..tasks {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for i in 0..per_task {
                let id = (task * 1000 + i) as ItemId;
                cache.put(fund(id, &format!("k{}", id))).await.unwrap();
            }
            // every task also writes the same shared ids
            for i in 0..shared {
                let id = (1_000_000 + i) as ItemId;
                cache.put(fund(id, &format!("k{}", id))).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cache.count().await, tasks * per_task + shared);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_with_size_limit_and_sweeper() {
    let cache = Arc::new(LimitedCache::new(&config(
        50,
        0,
        Duration::from_millis(100),
        Duration::from_millis(20),
    )));

    let mut handles = Vec::new();
    for task in 0..8i64 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for round in 0..200i64 {
                let id = task * 10_000 + round;
                cache.put(fund(id, &format!("k{}", id))).await.unwrap();
                let _ = cache.get(Lookup::Id(id - 1)).await;
                assert!(cache.count().await <= 50);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(cache.count().await, 0);

    cache.shutdown().await;
}

// == Read-Through Repository ==

struct FundSource;

impl ItemLoader<Fund> for FundSource {
    async fn load_by_id(&self, id: ItemId) -> anyhow::Result<Fund> {
        Ok(fund(id, &format!("F{}", id)))
    }

    async fn load_by_key(&self, key: &str) -> anyhow::Result<Fund> {
        let id = key.trim_start_matches('F').parse()?;
        Ok(fund(id, key))
    }
}

#[tokio::test]
async fn test_repository_reads_through_limited_cache() {
    let cache = Arc::new(LimitedCache::new(&config(
        2,
        0,
        Duration::from_secs(60),
        Duration::from_secs(60),
    )));
    let repo = CachedRepository::new(FundSource, Arc::clone(&cache));

    assert_eq!(repo.get_by_id(1).await.unwrap(), fund(1, "F1"));
    assert_eq!(repo.get_by_key("F2").await.unwrap(), fund(2, "F2"));
    assert_eq!(cache.count().await, 2);

    let funds = repo.get_by_ids(&[3, 2]).await.unwrap();
    assert_eq!(funds, vec![fund(3, "F3"), fund(2, "F2")]);
    // size limit of two still holds after read-through inserts
    assert_eq!(cache.count().await, 2);
    assert!(cache.get(Lookup::Id(1)).await.is_none());

    let err = repo.get_by_key("Fxyz").await.unwrap_err();
    assert!(matches!(err, CacheError::Load { .. }));

    cache.shutdown().await;
}
