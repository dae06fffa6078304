//! Published snapshot
//!
//! Readers clone an `Arc<Snapshot>` and keep a consistent view for as long as
//! they hold it; an update builds a complete new snapshot and swaps the `Arc`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::Channel;

/// The documents produced by the last successful update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub channels: Vec<Channel>,
    pub playlist: String,
    pub guide: String,
    /// Completion time of the update that produced this snapshot
    pub last_update: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Whether at least one update has completed
    pub fn is_ready(&self) -> bool {
        self.last_update.is_some()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    /// Replace the published snapshot wholesale
    pub async fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        *self.current.write().await = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_empty() {
        let store = SnapshotStore::new();
        let snapshot = store.get().await;
        assert!(!snapshot.is_ready());
        assert!(snapshot.playlist.is_empty());
    }

    #[tokio::test]
    async fn test_readers_keep_their_view_across_publish() {
        let store = SnapshotStore::new();
        store
            .publish(Snapshot {
                playlist: "#EXTM3U\nfirst".to_string(),
                last_update: Some(Utc::now()),
                ..Snapshot::default()
            })
            .await;

        let held = store.get().await;
        store
            .publish(Snapshot {
                playlist: "#EXTM3U\nsecond".to_string(),
                last_update: Some(Utc::now()),
                ..Snapshot::default()
            })
            .await;

        assert_eq!(held.playlist, "#EXTM3U\nfirst");
        assert_eq!(store.get().await.playlist, "#EXTM3U\nsecond");
    }
}
