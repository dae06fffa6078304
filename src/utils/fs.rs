//! Atomic file replacement

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Replace `path` with `contents` without ever exposing a half-written file
///
/// The data goes to a temporary file in the same directory, is synced, and
/// is then renamed over the destination.
pub async fn atomic_write(path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> std::io::Result<()> {
    let path = path.as_ref().to_path_buf();
    let contents = contents.into();

    tokio::task::spawn_blocking(move || write_blocking(&path, &contents))
        .await
        .map_err(std::io::Error::other)?
}

fn write_blocking(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir)?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
