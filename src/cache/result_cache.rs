//! 智能缓存层
//!
//! Memoization over a [`CacheStore`] with hit/miss accounting. The cache is
//! strictly an accelerator: any store failure is logged and treated as a
//! miss (reads) or dropped (writes), so a degraded cache service never
//! fails a request.

use crate::cache::store::CacheStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-process cache counters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    pub hit_rate_percent: f64,
}

pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up and deserializes a cached value. Store errors and decode
    /// failures count as misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = match self.store.get(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(error) => {
                warn!(%key, %error, "cache read failed, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "cache hit");
                Some(value)
            }
            Err(error) => {
                warn!(%key, %error, "cached payload failed to decode, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Best-effort write. Serialization or store failures are logged and
    /// swallowed.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%key, %error, "failed to serialize value for cache");
                return;
            }
        };

        if let Err(error) = self.store.set(key, payload, ttl).await {
            warn!(%key, %error, "cache write failed, continuing without caching");
        }
    }

    /// Removes every entry in a namespace. The `:` separator is appended so
    /// `files` cannot match keys under `files_archive`.
    pub async fn invalidate_namespace(&self, namespace: &str) -> u64 {
        let prefix = format!("{}:", namespace);
        match self.store.delete_prefix(&prefix).await {
            Ok(removed) => {
                debug!(namespace, removed, "invalidated cache namespace");
                removed
            }
            Err(error) => {
                warn!(namespace, %error, "cache invalidation failed");
                0
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64 * 10_000.0).round() / 100.0
        };
        CacheStats {
            hits,
            misses,
            total_requests: total,
            hit_rate_percent: hit_rate,
        }
    }

    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub async fn ping(&self) -> bool {
        self.store.ping().await.is_ok()
    }
}
