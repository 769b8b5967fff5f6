//! Expiring key/value caches for extraction results.
//!
//! An entry is usable only while "now" is strictly before its expiration.
//! Expired entries are misses, never errors. `purge_expired` is the sweep
//! that physically removes them.
//!
//! ```text
//! {cache_dir}/
//! ├── channels/             # ChannelInfo per link (72h)
//! │   └── <sha256(link)>.json
//! └── engagement/           # EngagementMetrics per channel (30d)
//!     └── <sha256(handle)>.json
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use local::LocalCache;
pub use memory::MemoryCache;

/// A cached value with the instant it stops being valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry<T> {
    pub key: String,
    pub value: T,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(key: impl Into<String>, value: T, expires_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value,
            expires_at,
        }
    }

    /// Whether the entry may still be served at `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }
}

/// Trait for cache backends.
#[async_trait]
pub trait StatsCache<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    /// Stored entry for the key, fresh or not.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<T>>>;

    /// Store a value, replacing any previous entry for the key.
    async fn put(&self, key: &str, value: &T, expires_at: DateTime<Utc>) -> Result<()>;

    /// Delete every entry that expired at or before `now`.
    ///
    /// Returns the number of entries removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    /// Fresh value for the key.
    ///
    /// Read failures are logged and reported as a miss.
    async fn lookup(&self, key: &str) -> Option<T> {
        match self.get(key).await {
            Ok(Some(entry)) if entry.is_fresh() => Some(entry.value),
            Ok(Some(_)) => {
                log::debug!("Cache entry for {} expired", key);
                None
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Store a value, logging instead of failing.
    async fn store(&self, key: &str, value: &T, expires_at: DateTime<Utc>) {
        if let Err(e) = self.put(key, value, expires_at).await {
            log::warn!("Cache write failed for {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_entry_freshness_is_strict() {
        let now = Utc::now();
        let entry = CacheEntry::new("k", 1u32, now);
        assert!(!entry.is_fresh_at(now));
        assert!(entry.is_fresh_at(now - Duration::seconds(1)));
        assert!(!entry.is_fresh_at(now + Duration::seconds(1)));
    }
}
