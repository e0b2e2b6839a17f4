//! Seeds the staleness solver with module ids from local (non-fetchable,
//! already-built) dependencies whose artifacts are newer than this
//! project's manifest.

use crate::ids::ModuleId;
use std::{collections::HashSet, path::PathBuf};

/// A local upstream dependency: its own build manifest (checked for a
/// recent build) and the load paths its artifacts land in.
#[derive(Clone, Debug)]
pub struct UpstreamDependency {
    pub manifest: PathBuf,
    pub load_paths: Vec<PathBuf>,
}

/// Returns the set of module ids, keyed by artifact basename, whose
/// `.beam` files are newer than `manifest_mtime` in any dependency whose
/// own manifest was touched after `manifest_mtime`.
///
/// A dependency with no manifest, or one no newer than ours, contributes
/// nothing: it hasn't rebuilt since we last looked at it.
pub fn scan(manifest_mtime: u64, deps: &[UpstreamDependency]) -> HashSet<ModuleId> {
    let mut stale = HashSet::new();

    for dep in deps {
        let dep_mtime = match crate::utils::stat(&dep.manifest) {
            Ok(stat) => stat.mtime,
            Err(_) => continue,
        };
        if dep_mtime <= manifest_mtime {
            continue;
        }

        for load_path in &dep.load_paths {
            let pattern = load_path.join("*.beam");
            let Some(pattern) = pattern.to_str() else { continue };
            let Ok(entries) = glob::glob(pattern) else { continue };
            for entry in entries.flatten() {
                let Ok(stat) = crate::utils::stat(&entry) else { continue };
                if stat.mtime > manifest_mtime {
                    if let Some(stem) = entry.file_stem().and_then(|s| s.to_str()) {
                        stale.insert(ModuleId::new(stem));
                    }
                }
            }
        }
    }

    stale
}
