//! Reads and writes the versioned, compressed, self-delimited persisted
//! manifest, and migrates or invalidates stale formats.
//!
//! The on-disk shape is a version tag followed by two bincode-encoded
//! sequences (modules, then sources), the whole stream deflate-compressed.
//! The version tag is the only thing migration ever inspects; unknown or
//! corrupt payloads degrade to "rebuild everything" rather than erroring.

use crate::{
    error::{Error, Result},
    ids::ModuleId,
    model::{ModuleRecord, SourceRecord},
    utils,
};
use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

/// The manifest format this build of the driver writes and fully
/// understands.
pub const CURRENT_VERSION: &str = "v3";

/// Older tags this driver still recognizes, purely so it can clean up
/// their artifacts before forcing a full rebuild.
const KNOWN_OLD_VERSIONS: &[&str] = &["v1", "v2"];

/// The decoded, in-memory manifest: a module table and a source table.
#[derive(Default)]
pub struct Manifest {
    pub modules: HashMap<ModuleId, ModuleRecord>,
    pub sources: HashMap<PathBuf, SourceRecord>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.sources.is_empty()
    }
}

/// A stripped-down shape of a module record, just enough to recover its
/// artifact filename for cleanup when migrating away from an older
/// version.
#[derive(Serialize, Deserialize)]
struct LegacyModuleRecord {
    #[allow(dead_code)]
    module: String,
    beam: PathBuf,
}

/// Reads the manifest file. Returns an empty [`Manifest`] (with no error)
/// on any decode failure, and on a known older version; in the latter
/// case every listed artifact under `compile_dir` is deleted first.
pub fn read(path: &Path, compile_dir: &Path) -> Manifest {
    match try_read(path, compile_dir) {
        Ok(manifest) => manifest,
        Err(err) => {
            debug!("manifest at {} unreadable, forcing full rebuild: {err}", path.display());
            Manifest::default()
        }
    }
}

fn try_read(path: &Path, compile_dir: &Path) -> Result<Manifest> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Manifest::default()),
        Err(err) => return Err(Error::io(err, path)),
    };

    let mut decoder = DeflateDecoder::new(bytes.as_slice());
    let mut decompressed = Vec::new();
    if decoder.read_to_end(&mut decompressed).is_err() {
        return Ok(Manifest::default());
    }
    let mut cursor = decompressed.as_slice();

    let version: String = match bincode::deserialize_from(&mut cursor) {
        Ok(v) => v,
        Err(_) => return Ok(Manifest::default()),
    };

    if version == CURRENT_VERSION {
        let modules: Vec<ModuleRecord> = bincode::deserialize_from(&mut cursor)
            .map_err(|e| Error::ManifestDecode(e.to_string()))?;
        let sources: Vec<SourceRecord> = bincode::deserialize_from(&mut cursor)
            .map_err(|e| Error::ManifestDecode(e.to_string()))?;

        let modules = modules
            .into_iter()
            .filter_map(|mut m| {
                let id = m.module.clone()?;
                m.beam = compile_dir.join(&m.beam);
                Some((id, m))
            })
            .collect();
        let sources = sources.into_iter().map(|s| (s.source.clone(), s)).collect();
        return Ok(Manifest { modules, sources });
    }

    if KNOWN_OLD_VERSIONS.contains(&version.as_str()) {
        if let Ok(legacy) = bincode::deserialize_from::<_, Vec<LegacyModuleRecord>>(&mut cursor) {
            for module in legacy {
                utils::purge(&compile_dir.join(&module.beam));
            }
        }
        trace!("manifest {} is version {version}, discarding for full rebuild", path.display());
        return Ok(Manifest::default());
    }

    // Unknown (future?) version: don't touch its artifacts, just rebuild.
    trace!("manifest {} has unrecognized version {version}", path.display());
    Ok(Manifest::default())
}

/// Writes the manifest. An empty `(modules, sources)` pair deletes the
/// manifest file instead of writing an empty one. Every module carrying
/// in-memory `binary` bytes is flushed to `compile_dir/<module>.beam`
/// first, mtime-stamped with `timestamp`, and its `binary` is cleared
/// before serialization; it is never persisted.
pub fn write(
    path: &Path,
    mut modules: HashMap<ModuleId, ModuleRecord>,
    sources: HashMap<PathBuf, SourceRecord>,
    compile_dir: &Path,
    timestamp: u64,
) -> Result<()> {
    if modules.is_empty() && sources.is_empty() {
        if path.exists() {
            fs::remove_file(path).map_err(|e| Error::io(e, path))?;
        }
        return Ok(());
    }

    utils::create_parent_dir_all(path)?;
    fs::create_dir_all(compile_dir).map_err(|e| Error::io(e, compile_dir))?;

    for record in modules.values_mut() {
        let Some(id) = &record.module else { continue };
        if !record.binary.is_empty() {
            let filename = PathBuf::from(format!("{id}.beam"));
            let artifact_path = compile_dir.join(&filename);
            fs::write(&artifact_path, &record.binary).map_err(|e| Error::io(e, &artifact_path))?;
            utils::set_mtime(&artifact_path, timestamp);
            record.binary.clear();
            record.beam = filename;
        } else if record.beam.is_absolute() {
            // Carried over from a previous build unchanged: re-relativize.
            if let Ok(rel) = record.beam.strip_prefix(compile_dir) {
                record.beam = rel.to_path_buf();
            }
        }
    }

    let modules: Vec<ModuleRecord> = modules.into_values().collect();
    let sources: Vec<SourceRecord> = sources.into_values().collect();

    let tmp_path = path.with_extension("tmp");
    {
        let file = fs::File::create(&tmp_path).map_err(|e| Error::io(e, &tmp_path))?;
        let mut encoder = DeflateEncoder::new(file, Compression::default());
        bincode::serialize_into(&mut encoder, &CURRENT_VERSION.to_string())
            .map_err(|e| Error::ManifestEncode(e.to_string()))?;
        bincode::serialize_into(&mut encoder, &modules)
            .map_err(|e| Error::ManifestEncode(e.to_string()))?;
        bincode::serialize_into(&mut encoder, &sources)
            .map_err(|e| Error::ManifestEncode(e.to_string()))?;
        encoder.flush().map_err(|e| Error::io(e, &tmp_path))?;
        encoder.finish().map_err(|e| Error::io(e, &tmp_path))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| Error::io(e, path))?;
    utils::set_mtime(path, timestamp);

    Ok(())
}
