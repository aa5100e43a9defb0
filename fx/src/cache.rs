//! Rate-table caching with TTL and stale fallback.
//!
//! One entry is kept per base currency. An entry older than the TTL is
//! refreshed on the next read; if the refresh fails the old entry is served
//! instead and kept for the next attempt. Entries are never evicted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;
use salaryfx_common::{constants, Currency};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{FxError, FxResult, ProviderError};
use crate::provider::RateProvider;
use crate::table::RateTable;

/// Cached table entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    table: Arc<RateTable>,
    fetched_at: Instant,
}

impl CacheEntry {
    fn new(table: RateTable) -> Self {
        Self {
            table: Arc::new(table),
            fetched_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Per-base-currency slot. `refresh` serializes upstream fetches for this
/// key only; `entry` is read without waiting on an in-flight fetch.
///
/// `generation` counts completed refresh attempts. A caller that queued on
/// `refresh` and finds the generation moved past what it saw on arrival
/// reuses that attempt's outcome instead of fetching again.
#[derive(Default)]
struct Slot {
    entry: RwLock<Option<CacheEntry>>,
    last_failure: RwLock<Option<Arc<ProviderError>>>,
    generation: AtomicU64,
    refresh: Mutex<()>,
}

impl Slot {
    fn snapshot(&self) -> Option<CacheEntry> {
        self.entry.read().clone()
    }

    fn fresh(&self, ttl: Duration) -> Option<Arc<RateTable>> {
        self.entry
            .read()
            .as_ref()
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| entry.table.clone())
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn store(&self, table: RateTable) -> Arc<RateTable> {
        let entry = CacheEntry::new(table);
        let table = entry.table.clone();
        *self.entry.write() = Some(entry);
        *self.last_failure.write() = None;
        self.generation.fetch_add(1, Ordering::Release);
        table
    }

    fn record_failure(&self, error: ProviderError) -> Arc<ProviderError> {
        let error = Arc::new(error);
        *self.last_failure.write() = Some(error.clone());
        self.generation.fetch_add(1, Ordering::Release);
        error
    }

    fn last_failure(&self) -> Option<Arc<ProviderError>> {
        self.last_failure.read().clone()
    }
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a fetched table is served without contacting the provider.
    pub ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::DEFAULT_RATE_TTL,
        }
    }
}

impl RateCacheConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.ttl.is_zero() {
            return Err("Rate TTL cannot be zero".to_string());
        }
        Ok(())
    }
}

/// How a [`RateLookup`] was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Served from an unexpired entry without I/O.
    FreshCached,
    /// Fetched from the provider during this call.
    Live,
    /// Refresh failed; an older entry was served instead.
    StaleFallback,
}

/// Result of [`RateCache::get_rates`].
#[derive(Debug, Clone)]
pub struct RateLookup {
    /// Rate table snapshot.
    pub table: Arc<RateTable>,
    /// Where the table came from.
    pub freshness: Freshness,
    /// Non-fatal warning, set for stale fallbacks.
    pub warning: Option<String>,
}

impl RateLookup {
    fn new(table: Arc<RateTable>, freshness: Freshness) -> Self {
        Self {
            table,
            freshness,
            warning: None,
        }
    }

    /// Check if the table is past its TTL.
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::StaleFallback
    }
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    upstream_fetches: AtomicU64,
    stale_fallbacks: AtomicU64,
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub expired_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub upstream_fetches: u64,
    pub stale_fallbacks: u64,
}

/// Thread-safe rate cache keyed by base currency.
pub struct RateCache {
    provider: Arc<dyn RateProvider>,
    slots: DashMap<Currency, Arc<Slot>>,
    counters: CacheCounters,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self::with_config(provider, RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(provider: Arc<dyn RateProvider>, config: RateCacheConfig) -> Self {
        Self {
            provider,
            slots: DashMap::new(),
            counters: CacheCounters::default(),
            config,
        }
    }

    /// Get the rate table for `base`, fetching it if missing or expired.
    ///
    /// Concurrent misses for the same base wait on a single fetch and share
    /// its outcome, whether it succeeded or failed. A failed refresh falls
    /// back to the previous table; only a cold miss surfaces
    /// [`FxError::ProviderUnavailable`].
    #[instrument(skip(self), fields(base = %base, provider = self.provider.name()))]
    pub async fn get_rates(&self, base: &Currency) -> FxResult<RateLookup> {
        let slot = self.slot(base);

        if let Some(table) = slot.fresh(self.config.ttl) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit");
            return Ok(RateLookup::new(table, Freshness::FreshCached));
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let seen = slot.generation();
        let _refresh = slot.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(table) = slot.fresh(self.config.ttl) {
            debug!("Refreshed by concurrent caller");
            return Ok(RateLookup::new(table, Freshness::FreshCached));
        }
        if slot.generation() != seen {
            if let Some(error) = slot.last_failure() {
                debug!("Concurrent refresh failed, reusing its outcome");
                return self.fallback(base, &slot, error);
            }
        }

        self.counters.upstream_fetches.fetch_add(1, Ordering::Relaxed);
        match self.provider.fetch(base).await {
            Ok(table) => {
                let table = slot.store(table);
                info!(
                    currencies = table.len(),
                    source_date = %table.source_date,
                    "Cached fresh rate table"
                );
                Ok(RateLookup::new(table, Freshness::Live))
            }
            Err(error) => {
                let error = slot.record_failure(error);
                self.fallback(base, &slot, error)
            }
        }
    }

    fn fallback(
        &self,
        base: &Currency,
        slot: &Slot,
        error: Arc<ProviderError>,
    ) -> FxResult<RateLookup> {
        match slot.snapshot() {
            Some(entry) => {
                self.counters.stale_fallbacks.fetch_add(1, Ordering::Relaxed);
                let age_secs = entry.fetched_at.elapsed().as_secs();
                warn!(
                    error = %error,
                    age_secs,
                    "Serving stale rates after provider failure"
                );
                Ok(RateLookup {
                    table: entry.table,
                    freshness: Freshness::StaleFallback,
                    warning: Some(format!(
                        "Using cached rates due to provider error: {}",
                        error
                    )),
                })
            }
            None => {
                warn!(error = %error, "Rate provider failed with nothing cached");
                Err(FxError::ProviderUnavailable {
                    base: base.clone(),
                    source: error,
                })
            }
        }
    }

    /// Get the cached table for `base` regardless of age, without I/O.
    pub fn peek(&self, base: &Currency) -> Option<Arc<RateTable>> {
        self.slots
            .get(base)
            .and_then(|slot| slot.snapshot())
            .map(|entry| entry.table)
    }

    /// Get the number of base currencies with a cached table.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.entry.read().is_some())
            .count()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            upstream_fetches: self.counters.upstream_fetches.load(Ordering::Relaxed),
            stale_fallbacks: self.counters.stale_fallbacks.load(Ordering::Relaxed),
            ..Default::default()
        };

        for slot in self.slots.iter() {
            match slot.snapshot() {
                Some(entry) if entry.is_fresh(self.config.ttl) => stats.fresh_entries += 1,
                Some(_) => stats.expired_entries += 1,
                None => continue,
            }
            stats.total_entries += 1;
        }

        stats
    }

    fn slot(&self, base: &Currency) -> Arc<Slot> {
        if let Some(slot) = self.slots.get(base) {
            return slot.clone();
        }
        self.slots.entry(base.clone()).or_default().clone()
    }
}
