//! The boundary this crate consumes from the out-of-scope collaborators:
//! the compiler front-end, the lexical reference tracker, and the module
//! metadata reader. The core never implements any of these; it only calls
//! them through these traits.

use crate::{diagnostics::RawReport, ids::ModuleId, model::Dispatch};
use serde_json::Value;
use std::{collections::BTreeMap, path::Path, path::PathBuf, time::Duration};

/// A just-completed module compilation, as reported by the parallel
/// compiler's `each_module` callback. Everything beyond `(source, module,
/// binary)` is derived by the coordinator via [`LexicalTracker`] and
/// [`ModuleMetadata`], not by the compiler itself.
#[derive(Clone, Debug)]
pub struct ModuleCompleted {
    pub source: PathBuf,
    pub module: ModuleId,
    pub binary: Vec<u8>,
}

/// Outcome of a parallel compiler invocation.
pub enum CompileRunOutcome {
    Ok { warnings: Vec<RawReport> },
    Error { errors: Vec<RawReport>, warnings: Vec<RawReport> },
}

/// The external parallel compiler (out of scope: lex/parse/type-check/codegen).
///
/// Implementations are expected to invoke `on_module` once per finished
/// module, in arbitrary order and possibly from multiple threads, and
/// `on_long_compilation` at most once per source that exceeds
/// `long_compilation_threshold`.
///
/// `extra_opts` carries [`crate::config::CompileOptions::extra`] verbatim,
/// any option keys accepted by the compiler's own options API that this
/// crate doesn't itself understand.
pub trait ParallelCompiler: Send + Sync {
    fn compile(
        &self,
        sources: &[PathBuf],
        dest: &Path,
        on_module: &(dyn Fn(ModuleCompleted) + Send + Sync),
        on_long_compilation: &(dyn Fn(&Path) + Send + Sync),
        long_compilation_threshold: Duration,
        extra_opts: &BTreeMap<String, Value>,
    ) -> CompileRunOutcome;
}

/// Reports a freshly compiled module's remote-reference graph, split into
/// compile-time vs. runtime edges. The coordinator removes the self-module
/// and internal-toolchain modules from the result before it ever reaches a
/// source record, so implementations need not filter either.
pub trait LexicalTracker: Send + Sync {
    fn references(&self, module: &ModuleId) -> (Vec<ModuleId>, Vec<ModuleId>);
    fn dispatches(&self, module: &ModuleId) -> (Vec<Dispatch>, Vec<Dispatch>);
}

/// Reads a compiled module's `protocol`, `protocol_impl`, and
/// `external_resource` attributes.
pub trait ModuleMetadata: Send + Sync {
    fn protocol(&self, module: &ModuleId) -> bool;
    fn protocol_impl(&self, module: &ModuleId) -> Option<ModuleId>;
    fn external_resources(&self, module: &ModuleId) -> Vec<PathBuf>;
}
