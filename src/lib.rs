#![doc = include_str!("../README.md")]
#![warn(rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

pub mod compiler;
pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod manifest;
pub mod model;
pub mod orchestrator;
pub mod probe;
/// Pluggable build reporting: scoped [`report::Reporter`] hooks an embedder
/// can install for the duration of a build.
pub mod report;
pub mod solver;
pub mod upstream;
pub mod utils;

/// Utilities for creating and testing throwaway project workspaces.
#[cfg(feature = "project-util")]
pub mod project_util;

pub use compiler::{
    CompileRunOutcome, LexicalTracker, ModuleCompleted, ModuleMetadata, ParallelCompiler,
};
pub use config::{CompileOptions, ProjectPaths};
pub use diagnostics::{Diagnostic, Severity};
pub use error::{Error, Result};
pub use ids::ModuleId;
pub use manifest::Manifest;
pub use model::{Dispatch, ModuleKind, ModuleRecord, SourceRecord, SourceWarning};
pub use orchestrator::{clean, compile, protocols_and_impls, read_manifest, CompileOutcome};
pub use report::{Reporter, TracingReporter};
pub use upstream::UpstreamDependency;
