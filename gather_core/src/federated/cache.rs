//! Time-bounded cache of ranked search results.
//!
//! Entries live for a fixed TTL. Expired entries are never served: `get`
//! removes a stale entry it runs into, and a background sweeper evicts
//! everything past its TTL on a fixed interval so a long-lived cache does
//! not grow without bound.

use super::{RawResult, SearchFilters, SearchQuery};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Identity of a search request for caching purposes.
///
/// Built from the normalized query text, a canonical serialization of the
/// filters, the aggregation profile and the set of disabled providers, so
/// that toggling a provider never serves results computed without it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

#[derive(Serialize)]
struct KeyParts<'a> {
    text: String,
    filters: SearchFilters,
    profile: &'a str,
    disabled: &'a BTreeSet<String>,
}

impl CacheKey {
    pub fn new(
        query: &SearchQuery,
        profile: &str,
        disabled: &BTreeSet<String>,
    ) -> Result<Self, serde_json::Error> {
        let parts = KeyParts {
            text: query.normalized_text(),
            filters: query.filters.canonical(),
            profile,
            disabled,
        };
        Ok(Self(serde_json::to_string(&parts)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    results: Vec<RawResult>,
    created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// Hit/miss counters. Observing them never changes cached content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate as a fraction (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a fresh entry. A stale entry counts as a miss and is removed.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<RawResult>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(self.ttl) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(target: "gather.cache", key = key.as_str(), "cache hit");
                    return Some(entry.results.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    debug!(target: "gather.cache", key = key.as_str(), "cache miss");
                    return None;
                }
            }
        }

        // Stale: re-check under the write lock, a concurrent set may have refreshed it
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .map(|e| e.is_expired(self.ttl))
            .unwrap_or(false)
        {
            entries.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(target: "gather.cache", key = key.as_str(), "cache miss (expired)");
        None
    }

    /// Store results, replacing any existing entry with a fresh timestamp.
    pub async fn set(&self, key: CacheKey, results: Vec<RawResult>) {
        let entry = CacheEntry {
            results,
            created_at: Instant::now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Remove every expired entry. Returns how many were evicted.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| !entry.is_expired(ttl));
        let removed = before - entries.len();
        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Start the periodic sweep on the current tokio runtime.
    ///
    /// The task holds only a weak reference and exits once the cache is
    /// dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.sweep().await;
                if removed > 0 {
                    debug!(target: "gather.cache", removed, "swept expired cache entries");
                }
            }
        })
    }
}
