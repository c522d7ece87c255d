//! Cache Load Driver
//!
//! Fills a `LimitedCache` and hammers it with random lookups, first without
//! and then with a background sweeper, and prints a JSON report.

use std::env;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simple_cache::{CacheConfig, CacheItem, ItemId, LimitedCache, Lookup};

/// Item type used to load the cache.
#[derive(Debug, Clone)]
struct Element {
    id: ItemId,
    key: String,
}

impl Element {
    fn new(id: ItemId) -> Self {
        Self {
            id,
            key: format!("key.{}", id),
        }
    }
}

impl CacheItem for Element {
    fn id(&self) -> ItemId {
        self.id
    }

    fn key(&self) -> &str {
        &self.key
    }
}

/// Load driver parameters.
///
/// # Environment Variables
/// - `LOAD_ITEMS` - Elements inserted up front (default: 100000)
/// - `LOAD_PHASE_SECS` - Duration of each lookup phase (default: 5)
/// - `LOAD_SWEEP_INTERVAL_MS` - Sweeper period for the second phase (default: 200)
#[derive(Debug, Clone, Serialize)]
struct LoadSettings {
    items: usize,
    phase_secs: u64,
    sweep_interval_ms: u64,
}

impl LoadSettings {
    fn from_env() -> Self {
        Self {
            items: env::var("LOAD_ITEMS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100_000),
            phase_secs: env::var("LOAD_PHASE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            sweep_interval_ms: env::var("LOAD_SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
        }
    }
}

#[derive(Debug, Serialize)]
struct PhaseReport {
    name: &'static str,
    elapsed_ms: u128,
    lookups: u64,
    hits: u64,
    completed_sweeps: u64,
    entries_after: usize,
}

#[derive(Debug, Serialize)]
struct LoadReport {
    started_at: DateTime<Utc>,
    config: CacheConfig,
    settings: LoadSettings,
    insert_ms: u128,
    entries_after_insert: usize,
    phases: Vec<PhaseReport>,
}

/// Runs one lookup phase against random ids for `duration`.
async fn lookup_phase(
    name: &'static str,
    cache: &LimitedCache<Element>,
    items: usize,
    duration: Duration,
) -> PhaseReport {
    let mut rng = rand::thread_rng();
    let started = Instant::now();
    let mut lookups = 0u64;
    let mut hits = 0u64;

    while started.elapsed() < duration {
        let id = rng.gen_range(0..items.max(1)) as ItemId;
        if cache.get(Lookup::Id(id)).await.is_some() {
            hits += 1;
        }
        lookups += 1;
    }

    let report = PhaseReport {
        name,
        elapsed_ms: started.elapsed().as_millis(),
        lookups,
        hits,
        completed_sweeps: cache.completed_sweeps(),
        entries_after: cache.count().await,
    };
    info!(
        "Phase {}: {} lookups ({} hits) in {} ms, {} sweeps, {} entries left",
        report.name,
        report.lookups,
        report.hits,
        report.elapsed_ms,
        report.completed_sweeps,
        report.entries_after
    );
    report
}

/// Entry point for the load driver.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load cache configuration and load settings from environment variables
/// 3. Insert `LOAD_ITEMS` elements and time it
/// 4. Random lookups with no sweeper (expiry on access only)
/// 5. Random lookups with a fast sweeper armed
/// 6. Print the JSON report and shut the sweeper down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simple_cache=info,cache_load=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig {
        sweep_interval: None,
        ..CacheConfig::from_env()
    };
    let settings = LoadSettings::from_env();
    info!(
        "Configuration loaded: max_size={}, max_entry_age={:?}, max_access_count={}, items={}",
        config.max_size, config.max_entry_age, config.max_access_count, settings.items
    );

    let started_at = Utc::now();
    let cache = LimitedCache::<Element>::new(&config);

    let insert_started = Instant::now();
    for id in 0..settings.items {
        cache.put(Element::new(id as ItemId)).await?;
    }
    let insert_ms = insert_started.elapsed().as_millis();
    let entries_after_insert = cache.count().await;
    info!(
        "Inserted {} elements in {} ms, {} entries cached",
        settings.items, insert_ms, entries_after_insert
    );

    let phase = Duration::from_secs(settings.phase_secs);
    let mut phases = Vec::with_capacity(2);
    phases.push(lookup_phase("no-sweeper", &cache, settings.items, phase).await);

    cache
        .set_sweep_interval(Some(Duration::from_millis(settings.sweep_interval_ms)))
        .await;
    phases.push(lookup_phase("with-sweeper", &cache, settings.items, phase).await);

    cache.shutdown().await;

    let report = LoadReport {
        started_at,
        config,
        settings,
        insert_ms,
        entries_after_insert,
        phases,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!("Load run complete");
    Ok(())
}
