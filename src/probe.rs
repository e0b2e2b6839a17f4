//! Produces `path -> (mtime, size)` for every source and every external
//! resource any source declares, stat'ing shared paths at most once.
//!
//! A path that fails to stat (removed source, externally-deleted
//! resource) is simply omitted from the result rather than failing the
//! whole probe: callers treat a missing entry as "stale", so one vanished
//! file must not abort the build for every other source.

use crate::model::SourceRecord;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

#[derive(Clone, Copy, Debug)]
pub struct Probed {
    pub mtime: u64,
    pub size: u64,
}

/// Stats every source path plus every path any source declares as
/// `external`, deduplicated.
pub fn probe(root: &Path, sources: &HashMap<PathBuf, SourceRecord>) -> HashMap<PathBuf, Probed> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for (path, record) in sources {
        if seen.insert(path.clone()) {
            paths.push(path.clone());
        }
        for ext in &record.external {
            if seen.insert(ext.clone()) {
                paths.push(ext.clone());
            }
        }
    }

    let mut out = HashMap::with_capacity(paths.len());
    for path in paths {
        let abs = if path.is_absolute() { path.clone() } else { root.join(&path) };
        match crate::utils::stat(&abs) {
            Ok(stat) => {
                out.insert(path, Probed { mtime: stat.mtime, size: stat.size });
            }
            Err(err) => {
                debug!("failed to stat {}, treating as stale: {err}", abs.display());
            }
        }
    }
    out
}
