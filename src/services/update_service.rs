//! Update orchestration
//!
//! One update is: fetch the catalog, apply the favorites filter, render the
//! playlist and the guide, publish the new snapshot, write the backup files.
//! Only one update may run at a time; the [`UpdateGuard`] enforces that and
//! an [`UpdatePermit`] proves the caller holds it.
//!
//! The update timeout covers everything before publishing. Once the snapshot
//! is published the update has succeeded; backups get their own time budget
//! and can only produce warnings.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::backup::{BackupTarget, DirectoryBackup, GUIDE_BACKUP_FILE, PLAYLIST_BACKUP_FILE};
use super::snapshot::{Snapshot, SnapshotStore};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::favorites::FavoritesFilter;
use crate::proxy::{GuideGenerator, PlaylistGenerator};
use crate::models::Channel;
use crate::sources::CatalogSource;

/// What started an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateTrigger {
    Startup,
    Scheduler,
    Manual,
}

impl std::fmt::Display for UpdateTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateTrigger::Startup => write!(f, "startup"),
            UpdateTrigger::Scheduler => write!(f, "scheduler"),
            UpdateTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Result of a completed update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateSummary {
    pub trigger: UpdateTrigger,
    pub last_update: DateTime<Utc>,
    /// Channels returned by the source before filtering
    pub fetched_channels: usize,
    /// Channels in the published snapshot
    pub channel_count: usize,
    pub duration_ms: u64,
}

/// What a caller asking for an update gets back
#[derive(Debug)]
pub enum UpdateOutcome {
    Completed(UpdateSummary),
    /// Another update holds the guard; nothing was started
    Busy,
    Failed(AppError),
}

/// Single-flight flag shared by every update producer
#[derive(Debug, Clone, Default)]
pub struct UpdateGuard {
    updating: Arc<AtomicBool>,
}

impl UpdateGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` when an update is already in flight
    pub fn try_acquire(&self) -> Option<UpdatePermit> {
        self.updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| UpdatePermit {
                updating: self.updating.clone(),
            })
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }
}

/// Exclusive right to run one update; releases the guard on drop
#[derive(Debug)]
pub struct UpdatePermit {
    updating: Arc<AtomicBool>,
}

impl Drop for UpdatePermit {
    fn drop(&mut self) {
        self.updating.store(false, Ordering::Release);
    }
}

pub struct UpdateService {
    source: Arc<dyn CatalogSource>,
    snapshots: SnapshotStore,
    guard: UpdateGuard,
    playlist_generator: PlaylistGenerator,
    guide_generator: GuideGenerator,
    favorites_path: PathBuf,
    backup: Option<Arc<dyn BackupTarget>>,
    timeout: Duration,
}

/// Output of the fetch, filter and generate steps, ready to publish
struct PreparedUpdate {
    fetched_channels: usize,
    channels: Vec<Channel>,
    playlist: String,
    guide: String,
}

impl UpdateService {
    pub fn new(source: Arc<dyn CatalogSource>, snapshots: SnapshotStore, config: &Config) -> Self {
        Self {
            source,
            snapshots,
            guard: UpdateGuard::new(),
            playlist_generator: PlaylistGenerator::new(),
            guide_generator: GuideGenerator::from_config(&config.guide),
            favorites_path: config.storage.favorites_path.clone(),
            backup: config
                .storage
                .backup_dir
                .clone()
                .map(|dir| Arc::new(DirectoryBackup::new(dir)) as Arc<dyn BackupTarget>),
            timeout: config.updates.timeout(),
        }
    }

    /// Replace the backup destination, `None` disables backups
    pub fn with_backup_target(mut self, backup: Option<Arc<dyn BackupTarget>>) -> Self {
        self.backup = backup;
        self
    }

    pub fn guard(&self) -> &UpdateGuard {
        &self.guard
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn is_updating(&self) -> bool {
        self.guard.is_updating()
    }

    /// Acquire the guard and run an update, or report `Busy` immediately
    pub async fn update_now(&self, trigger: UpdateTrigger) -> UpdateOutcome {
        let Some(permit) = self.guard.try_acquire() else {
            info!("Update already in progress, {} request rejected", trigger);
            return UpdateOutcome::Busy;
        };
        match self.run(permit, trigger).await {
            Ok(summary) => UpdateOutcome::Completed(summary),
            Err(e) => UpdateOutcome::Failed(e),
        }
    }

    /// Run one update under `permit`
    ///
    /// On failure the previously published snapshot is left untouched. The
    /// permit is released when this returns, including on timeout.
    pub async fn run(&self, permit: UpdatePermit, trigger: UpdateTrigger) -> AppResult<UpdateSummary> {
        info!("Starting update (trigger: {})", trigger);
        let started = Instant::now();

        let prepared = match tokio::time::timeout(self.timeout, self.prepare()).await {
            Ok(prepared) => prepared,
            Err(_) => Err(AppError::UpdateTimedOut(self.timeout)),
        };
        let result = match prepared {
            Ok(prepared) => Ok(self.publish(prepared, trigger, started).await),
            Err(e) => Err(e),
        };
        drop(permit);

        match &result {
            Ok(summary) => info!(
                trigger = %trigger,
                channels = summary.channel_count,
                duration_ms = summary.duration_ms,
                "Update completed"
            ),
            Err(e) => error!(
                trigger = %trigger,
                duration_ms = started.elapsed().as_millis() as u64,
                "Update failed, keeping previous data: {}",
                e
            ),
        }
        result
    }

    /// Fetch, filter and generate; nothing is visible to readers yet
    async fn prepare(&self) -> AppResult<PreparedUpdate> {
        let fetched = self.source.fetch().await?;
        let fetched_channels = fetched.len();
        debug!("Source '{}' returned {} channels", self.source.name(), fetched_channels);

        let favorites = FavoritesFilter::load(&self.favorites_path).await;
        favorites.log_summary();
        let channels = favorites.apply(fetched);
        if !favorites.is_empty() {
            info!(
                "Favorites kept {} of {} channels",
                channels.len(),
                fetched_channels
            );
        }

        let playlist = self.playlist_generator.generate(&channels);
        let guide = self.guide_generator.generate(&channels);

        Ok(PreparedUpdate {
            fetched_channels,
            channels,
            playlist,
            guide,
        })
    }

    /// Swap in the new snapshot, then mirror it to the backup target
    async fn publish(
        &self,
        prepared: PreparedUpdate,
        trigger: UpdateTrigger,
        started: Instant,
    ) -> UpdateSummary {
        let PreparedUpdate {
            fetched_channels,
            channels,
            playlist,
            guide,
        } = prepared;

        let last_update = Utc::now();
        let channel_count = channels.len();
        self.snapshots
            .publish(Snapshot {
                channels,
                playlist: playlist.clone(),
                guide: guide.clone(),
                last_update: Some(last_update),
            })
            .await;

        self.write_backups(&playlist, &guide).await;

        UpdateSummary {
            trigger,
            last_update,
            fetched_channels,
            channel_count,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn write_backups(&self, playlist: &str, guide: &str) {
        let Some(backup) = &self.backup else {
            return;
        };

        let writes = async {
            for (file, content) in [(PLAYLIST_BACKUP_FILE, playlist), (GUIDE_BACKUP_FILE, guide)] {
                match backup.write(file, content).await {
                    Ok(()) => debug!("Wrote backup {}", backup.location(file)),
                    Err(e) => warn!("Failed to write backup {}: {}", backup.location(file), e),
                }
            }
        };
        if tokio::time::timeout(self.timeout, writes).await.is_err() {
            warn!(
                "Backups not written within {}s, abandoned",
                self.timeout.as_secs()
            );
        }
    }
}
