//! On-disk catalog cache
//!
//! A single JSON document holding the last raw catalog payload. Freshness is
//! judged from the file's modification time against the update interval, so
//! a restart inside the interval serves the cached dataset without touching
//! the network.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::errors::{CacheError, CacheResult};
use crate::models::Channel;
use crate::utils::atomic_write;

/// A dataset read back from the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    pub channels: Vec<Channel>,
    /// Modification time of the cache file
    pub written_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached dataset if it is still fresh
    pub async fn read(&self) -> Option<CacheRecord> {
        self.read_at(SystemTime::now()).await
    }

    /// Read the cached dataset as of `now`
    ///
    /// Missing, expired, unreadable and corrupt files are all a miss.
    pub async fn read_at(&self, now: SystemTime) -> Option<CacheRecord> {
        match self.try_read_at(now).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Ignoring cache: {}", e);
                None
            }
        }
    }

    async fn try_read_at(&self, now: SystemTime) -> CacheResult<Option<CacheRecord>> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No cache file present");
                return Ok(None);
            }
            Err(e) => return Err(CacheError::io(&self.path, e)),
        };

        let modified = metadata
            .modified()
            .map_err(|e| CacheError::io(&self.path, e))?;
        // A modification time in the future counts as just written
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age >= self.ttl {
            debug!(
                path = %self.path.display(),
                age_secs = age.as_secs(),
                ttl_secs = self.ttl.as_secs(),
                "Cache expired"
            );
            return Ok(None);
        }

        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CacheError::io(&self.path, e))?;
        let channels: Vec<Channel> =
            serde_json::from_slice(&raw).map_err(|source| CacheError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            path = %self.path.display(),
            channels = channels.len(),
            age_secs = age.as_secs(),
            "Cache hit"
        );

        Ok(Some(CacheRecord {
            channels,
            written_at: modified.into(),
        }))
    }

    /// Persist a raw catalog payload, replacing the previous file atomically
    pub async fn write(&self, payload: &str) -> CacheResult<()> {
        atomic_write(&self.path, payload)
            .await
            .map_err(|e| CacheError::io(&self.path, e))?;
        debug!(path = %self.path.display(), bytes = payload.len(), "Cache written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAYLOAD: &str = r#"[{"slug":"news-now","name":"News Now","isStitched":true}]"#;

    fn store(dir: &TempDir, ttl: Duration) -> CacheStore {
        CacheStore::new(dir.path().join("cache.json"), ttl)
    }

    fn mtime(store: &CacheStore) -> SystemTime {
        std::fs::metadata(store.path()).unwrap().modified().unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read_returns_same_dataset() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, Duration::from_secs(1800));

        store.write(PAYLOAD).await.unwrap();
        let record = store.read().await.expect("fresh cache should hit");

        let expected: Vec<Channel> = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(record.channels, expected);
    }

    #[tokio::test]
    async fn test_freshness_boundary() {
        let dir = TempDir::new().unwrap();
        let ttl = Duration::from_secs(1800);
        let store = store(&dir, ttl);
        store.write(PAYLOAD).await.unwrap();
        let written = mtime(&store);

        let just_before = written + ttl - Duration::from_secs(1);
        let just_after = written + ttl + Duration::from_secs(1);

        assert!(store.read_at(just_before).await.is_some());
        assert!(store.read_at(just_after).await.is_none());
        assert!(store.read_at(written + ttl).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, Duration::from_secs(60));
        assert!(store.read().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, Duration::from_secs(60));
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(store.read().await.is_none());
        assert!(matches!(
            store.try_read_at(SystemTime::now()).await,
            Err(CacheError::Corrupt { .. })
        ));
    }
}
