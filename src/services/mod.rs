//! Update pipeline services
//!
//! - [`backup`]: plain-text copies of the documents written after publishing
//! - [`snapshot`]: the published documents read by the web layer
//! - [`update_service`]: the single-flight fetch, filter, generate, publish sequence
//! - [`scheduler`]: the one task that executes updates, fed by a timer and manual requests

pub mod backup;
pub mod scheduler;
pub mod snapshot;
pub mod update_service;

pub use backup::{BackupTarget, DirectoryBackup};
pub use scheduler::{UpdateHandle, UpdateScheduler};
pub use snapshot::{Snapshot, SnapshotStore};
pub use update_service::{
    UpdateGuard, UpdateOutcome, UpdatePermit, UpdateService, UpdateSummary, UpdateTrigger,
};
