//! Crash-safe file replacement for snapshots and state files

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

/// Sibling path that receives the new contents before the rename.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut staged = OsString::from(path.as_os_str());
    staged.push(".tmp");
    PathBuf::from(staged)
}

/// Replace `path` with `bytes`.
///
/// The bytes go to `<path>.tmp`, are synced, then renamed over `path`, so
/// readers see either the old contents or the new ones and never a partial
/// file.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let staged = staging_path(path);
    let mut file = tokio::fs::File::create(&staged).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&staged, path).await
}
