//! Plain-text copies of the published documents

use std::path::PathBuf;

use async_trait::async_trait;

use crate::utils::atomic_write;

pub const PLAYLIST_BACKUP_FILE: &str = "playlist.m3u8";
pub const GUIDE_BACKUP_FILE: &str = "epg.xml";

/// Destination for the documents mirrored after each successful update
#[async_trait]
pub trait BackupTarget: Send + Sync {
    /// Store `content` under `file_name`, replacing any previous copy
    async fn write(&self, file_name: &str, content: &str) -> std::io::Result<()>;

    /// Where `file_name` ends up, for log messages
    fn location(&self, file_name: &str) -> String;
}

/// Writes backups as files in one directory
#[derive(Debug, Clone)]
pub struct DirectoryBackup {
    dir: PathBuf,
}

impl DirectoryBackup {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl BackupTarget for DirectoryBackup {
    async fn write(&self, file_name: &str, content: &str) -> std::io::Result<()> {
        atomic_write(self.dir.join(file_name), content).await
    }

    fn location(&self, file_name: &str) -> String {
        self.dir.join(file_name).display().to_string()
    }
}
