//! Small filesystem helpers shared by the probe, manifest codec and
//! coordinator.

use crate::error::{Error, Result};
use path_slash::PathExt as _;
use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

/// `(mtime, size)` of a file on disk, in milliseconds since the epoch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Stat {
    pub mtime: u64,
    pub size: u64,
}

/// Stats a file. A missing or unreadable file is surfaced as an error,
/// which the probe treats as "stale".
pub fn stat(path: &Path) -> Result<Stat> {
    let meta = fs::metadata(path).map_err(|e| Error::io(e, path))?;
    let mtime = meta
        .modified()
        .map_err(|e| Error::io(e, path))?
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    Ok(Stat { mtime, size: meta.len() })
}

/// Current time, in the same unit as [`Stat::mtime`].
pub fn now_millis() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Sets a file's modification time, best-effort: a failure here doesn't
/// corrupt the manifest, it just makes the next build's staleness check
/// slightly more conservative.
pub fn set_mtime(path: &Path, millis: u64) {
    let ft = filetime::FileTime::from_unix_time(
        (millis / 1000) as i64,
        ((millis % 1000) * 1_000_000) as u32,
    );
    if let Err(err) = filetime::set_file_mtime(path, ft) {
        debug!("failed to set mtime on {}: {err}", path.display());
    }
}

/// Removes a file, swallowing the error (best-effort cleanup).
pub fn purge(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            debug!("failed to purge {}: {err}", path.display());
        }
    }
}

pub fn create_parent_dir_all(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(e, parent))?;
    }
    Ok(())
}

/// Renders `path` relative to `root` using forward slashes, the way paths
/// are stored in the persisted manifest so it stays portable across
/// platforms.
pub fn source_name(path: &Path, root: &Path) -> PathBuf {
    let rel = path.strip_prefix(root).unwrap_or(path);
    PathBuf::from(rel.to_slash_lossy().into_owned())
}
