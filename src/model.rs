//! The two record kinds that populate the manifest, and the smaller value
//! types they're built from.

use crate::ids::ModuleId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What kind of unit a [`ModuleRecord`] represents.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ModuleKind {
    Module,
    Protocol,
    /// An implementation of the named protocol.
    Impl(ModuleId),
}

impl ModuleKind {
    pub fn is_protocol_or_impl(&self) -> bool {
        matches!(self, Self::Protocol | Self::Impl(_))
    }
}

/// A function-granular dispatch record: `(module, function, arity)`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Dispatch {
    pub module: ModuleId,
    pub function: String,
    pub arity: u32,
}

/// A `(line, message)` warning accumulated from the most recent compilation
/// of a source file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourceWarning {
    pub line: u32,
    pub message: String,
}

/// A compiled module: one or more sources contributed code to it.
///
/// `binary` is never persisted; it only exists in memory between the
/// moment a compile finishes and the moment the manifest is written.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub module: Option<ModuleId>,
    pub kind: Option<ModuleKind>,
    /// Most-recent source first.
    pub sources: Vec<PathBuf>,
    /// Relative to the compile directory in the persisted form; expanded to
    /// an absolute/joined path after [`crate::manifest::read`].
    pub beam: PathBuf,
    #[serde(skip)]
    pub binary: Vec<u8>,
}

impl ModuleRecord {
    pub fn new(module: ModuleId, kind: ModuleKind, source: PathBuf) -> Self {
        Self { module: Some(module), kind: Some(kind), sources: vec![source], beam: PathBuf::new(), binary: Vec::new() }
    }

    /// Moves `source` to the head of `sources`, removing any prior
    /// occurrence.
    pub fn promote_source(&mut self, source: &PathBuf) {
        self.sources.retain(|s| s != source);
        self.sources.insert(0, source.clone());
    }
}

/// A source file's contribution to the previous build.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub source: PathBuf,
    pub size: u64,
    pub compile_references: Vec<ModuleId>,
    pub runtime_references: Vec<ModuleId>,
    pub compile_dispatches: Vec<Dispatch>,
    pub runtime_dispatches: Vec<Dispatch>,
    /// Accumulates via set union across module callbacks sharing this
    /// source within one build; resets to the newly observed set on the
    /// next full recompilation of the source.
    pub external: Vec<PathBuf>,
    pub warnings: Vec<SourceWarning>,
}

impl SourceRecord {
    pub fn empty(source: PathBuf) -> Self {
        Self { source, ..Default::default() }
    }

    /// Union-merges newly declared external resources into this record.
    pub fn union_external(&mut self, external: &[PathBuf]) {
        for path in external {
            if !self.external.contains(path) {
                self.external.push(path.clone());
            }
        }
    }
}
