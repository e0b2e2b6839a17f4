//! Path layout and recognized `compile()` options.

use serde_json::Value;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Bundles the paths the orchestrator needs, in the style of this crate's
/// former `ProjectPathsConfig`.
#[derive(Clone, Debug)]
pub struct ProjectPaths {
    /// The project root; source paths in the manifest are relative to this.
    pub root: PathBuf,
    /// Directories to enumerate source files under.
    pub source_roots: Vec<PathBuf>,
    /// Recognized source file extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// Where compiled artifacts (`<module>.beam`) are written.
    pub compile_dir: PathBuf,
    /// Path to the persisted manifest file.
    pub manifest: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            source_roots: vec![root.clone()],
            extensions: vec!["src".to_string()],
            compile_dir: root.join("_build"),
            manifest: root.join("_build").join("manifest.bin"),
            root,
        }
    }

    pub fn with_source_roots(mut self, roots: impl IntoIterator<Item = PathBuf>) -> Self {
        self.source_roots = roots.into_iter().collect();
        self
    }

    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = String>) -> Self {
        self.extensions = extensions.into_iter().collect();
        self
    }

    pub fn with_compile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.compile_dir = dir.into();
        self
    }

    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = path.into();
        self
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|ext| ext == e))
            .unwrap_or(false)
    }
}

/// Recognized `opts` for [`crate::orchestrator::compile`].
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    /// Forces a full rebuild, bypassing the staleness solver entirely.
    pub force: bool,
    /// Enables per-file compiled notifications via `tracing`.
    pub verbose: bool,
    /// Seconds a single source may compile for before `on_long_compilation`
    /// fires. Defaults to 10.
    pub long_compilation_threshold: u64,
    /// Re-emits warnings from unchanged sources at build start.
    pub all_warnings: bool,
    /// Any option keys accepted by the compiler's own options API,
    /// forwarded verbatim.
    pub extra: BTreeMap<String, Value>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self { long_compilation_threshold: 10, ..Default::default() }
    }
}
