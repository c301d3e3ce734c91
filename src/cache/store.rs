//! Cache-service seam and the in-memory implementation.

use crate::error::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// External cache-service contract: string payloads under string keys with
/// per-entry TTL and prefix deletion.
///
/// Implementations must be cheap to clone behind an `Arc` and safe to call
/// concurrently. Callers treat every error as a miss; the contract makes no
/// durability promises.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Deletes every key starting with `prefix`, returning how many were
    /// removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
struct CachedEntry {
    payload: String,
    ttl: Duration,
}

struct PerEntryExpiry;

impl moka::Expiry<String, CachedEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-local cache on moka, used by tests and single-node deployments.
pub struct MemoryCacheStore {
    entries: moka::sync::Cache<String, CachedEntry>,
}

impl MemoryCacheStore {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            entries: moka::sync::Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryExpiry)
                .build(),
        }
    }

    /// Entry count after pending maintenance runs. Test helper.
    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.payload))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            CachedEntry {
                payload: value,
                ttl,
            },
        );
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        let removed = doomed.len() as u64;
        for key in doomed {
            self.entries.invalidate(&key);
        }
        Ok(removed)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
