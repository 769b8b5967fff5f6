//! In-process cache backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, StatsCache};
use crate::error::Result;

/// Map-backed cache that lives as long as the process.
pub struct MemoryCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T> MemoryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<T> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> StatsCache<T> for MemoryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &T, expires_at: DateTime<Utc>) -> Result<()> {
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry::new(key, value.clone(), expires_at),
        );
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh_at(now));
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_put_then_lookup() {
        let cache = MemoryCache::new();
        cache
            .put("a", &"value".to_string(), Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(cache.lookup("a").await, Some("value".to_string()));
        assert_eq!(cache.lookup("b").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss() {
        let cache = MemoryCache::new();
        cache
            .put("a", &1u32, Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        assert!(cache.get("a").await.unwrap().is_some());
        assert_eq!(cache.lookup("a").await, None);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = MemoryCache::new();
        let now = Utc::now();
        cache.put("old", &1u32, now - Duration::hours(1)).await.unwrap();
        cache.put("new", &2u32, now + Duration::hours(1)).await.unwrap();

        assert_eq!(cache.purge_expired(now).await.unwrap(), 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("old").await.unwrap().is_none());
    }
}
