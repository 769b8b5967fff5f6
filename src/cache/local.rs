//! Local filesystem cache backend.
//!
//! One JSON file per key under a namespace directory. File names are the
//! SHA-256 of the key so arbitrary links map to safe paths.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::cache::{CacheEntry, StatsCache};
use crate::error::{AppError, Result};

/// Per-write suffix for temp file names.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Filesystem-backed cache.
pub struct LocalCache<T> {
    root_dir: PathBuf,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for LocalCache<T> {
    fn clone(&self) -> Self {
        Self {
            root_dir: self.root_dir.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> LocalCache<T> {
    /// Create a cache rooted at `base/namespace`.
    pub fn new(base: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            root_dir: base.as_ref().join(namespace),
            _value: PhantomData,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// File holding the entry for a key.
    fn path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root_dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl<T> StatsCache<T> for LocalCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
        let path = self.path(key);
        let Some(bytes) = self.read_bytes(&path).await? else {
            return Ok(None);
        };
        let entry: CacheEntry<T> = serde_json::from_slice(&bytes)?;
        // A digest collision would hand back someone else's entry.
        if entry.key != key {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn put(&self, key: &str, value: &T, expires_at: DateTime<Utc>) -> Result<()> {
        let entry = CacheEntry::new(key, value.clone(), expires_at);
        let bytes = serde_json::to_vec_pretty(&entry)?;
        self.write_bytes(&self.path(key), &bytes).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut dir = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut removed = 0;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(bytes) = self.read_bytes(&path).await? else {
                continue;
            };
            let expired = match serde_json::from_slice::<CacheEntry<serde_json::Value>>(&bytes) {
                Ok(entry) => !entry.is_fresh_at(now),
                Err(e) => {
                    log::warn!("Removing unreadable cache file {}: {}", path.display(), e);
                    true
                }
            };
            if expired {
                tokio::fs::remove_file(&path).await?;
                removed += 1;
            }
        }

        log::info!(
            "Purged {} expired entries from {}",
            removed,
            self.root_dir.display()
        );
        Ok(removed)
    }
}
