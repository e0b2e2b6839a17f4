//! Drives the external parallel compiler over the stale source set and
//! assembles the updated `(modules, sources)` pair from its callbacks.
//!
//! `(modules, sources)` is mutated exclusively through a single-writer
//! updater, here a plain [`Mutex`], while compilation is in flight.
//! Module callbacks may arrive from any worker thread, in any order; they
//! only ever post an immutable [`ModuleCompleted`] report, which is
//! applied under the lock.

use crate::{
    compiler::{CompileRunOutcome, LexicalTracker, ModuleCompleted, ModuleMetadata, ParallelCompiler},
    config::CompileOptions,
    diagnostics::{self, Diagnostic, RawReport, Severity},
    ids::ModuleId,
    model::{Dispatch, ModuleKind, ModuleRecord, SourceRecord, SourceWarning},
    report, utils,
};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

struct Shared {
    modules: HashMap<ModuleId, ModuleRecord>,
    sources: HashMap<PathBuf, SourceRecord>,
    /// Sources that have had at least one module callback fire this build;
    /// used to reset a source's `external` list exactly once per build.
    externals_reset: HashSet<PathBuf>,
}

pub struct CoordinatorOutput {
    pub modules: HashMap<ModuleId, ModuleRecord>,
    pub sources: HashMap<PathBuf, SourceRecord>,
    pub warnings: Vec<Diagnostic>,
}

pub enum CoordinatorResult {
    Ok(CoordinatorOutput),
    Error { errors: Vec<Diagnostic>, warnings: Vec<Diagnostic> },
}

#[allow(clippy::too_many_arguments)]
pub fn compile(
    compiler: &dyn ParallelCompiler,
    lexical: &dyn LexicalTracker,
    metadata: &dyn ModuleMetadata,
    stale_sources: &[PathBuf],
    root: &Path,
    compile_dir: &Path,
    modules: HashMap<ModuleId, ModuleRecord>,
    sources: HashMap<PathBuf, SourceRecord>,
    opts: &CompileOptions,
) -> CoordinatorResult {
    let shared = Mutex::new(Shared { modules, sources, externals_reset: HashSet::new() });

    let on_module = |completed: ModuleCompleted| {
        apply_module_completed(&shared, lexical, metadata, root, completed, opts.verbose);
    };

    let threshold = Duration::from_secs(opts.long_compilation_threshold);
    let on_long_compilation = |source: &Path| {
        report::get_default(|r| r.on_long_compilation(source, threshold));
    };

    let outcome = compiler.compile(
        stale_sources,
        compile_dir,
        &on_module,
        &on_long_compilation,
        threshold,
        &opts.extra,
    );

    match outcome {
        CompileRunOutcome::Ok { warnings } => {
            let Shared { modules, mut sources, .. } = shared.into_inner().expect("coordinator mutex poisoned");
            attach_warnings(&mut sources, &warnings);
            let warnings = diagnostics::shape(warnings, Severity::Warning, "core");
            CoordinatorResult::Ok(CoordinatorOutput { modules, sources, warnings })
        }
        CompileRunOutcome::Error { errors, warnings } => CoordinatorResult::Error {
            errors: diagnostics::shape(errors, Severity::Error, "core"),
            warnings: diagnostics::shape(warnings, Severity::Warning, "core"),
        },
    }
}

fn apply_module_completed(
    shared: &Mutex<Shared>,
    lexical: &dyn LexicalTracker,
    metadata: &dyn ModuleMetadata,
    root: &Path,
    completed: ModuleCompleted,
    verbose: bool,
) {
    let ModuleCompleted { source, module, binary } = completed;

    let kind = if metadata.protocol(&module) {
        ModuleKind::Protocol
    } else if let Some(target) = metadata.protocol_impl(&module) {
        ModuleKind::Impl(target)
    } else {
        ModuleKind::Module
    };

    let (compile_references, runtime_references) = lexical.references(&module);
    let compile_references = filter_references(&module, compile_references);
    let runtime_references = filter_references(&module, runtime_references);

    let (compile_dispatches, runtime_dispatches) = lexical.dispatches(&module);
    let compile_dispatches = filter_dispatches(&module, compile_dispatches);
    let runtime_dispatches = filter_dispatches(&module, runtime_dispatches);

    let external: Vec<PathBuf> = metadata
        .external_resources(&module)
        .into_iter()
        .map(|p| utils::source_name(&p, root))
        .collect();

    if verbose {
        report::get_default(|r| r.on_module_compiled(&source, &module));
    }

    let mut guard = shared.lock().expect("coordinator mutex poisoned");

    let module_record = guard.modules.entry(module.clone()).or_default();
    module_record.module = Some(module.clone());
    module_record.kind = Some(kind);
    module_record.promote_source(&source);
    module_record.binary = binary;
    module_record.beam = PathBuf::new();

    let first_callback_for_source = guard.externals_reset.insert(source.clone());

    let source_record = guard.sources.entry(source.clone()).or_insert_with(|| SourceRecord::empty(source.clone()));
    if first_callback_for_source {
        // Resets once at the start of this source's first callback in the
        // build, then unions afterward.
        source_record.external.clear();
    }
    source_record.union_external(&external);
    source_record.compile_references = compile_references;
    source_record.runtime_references = runtime_references;
    source_record.compile_dispatches = compile_dispatches;
    source_record.runtime_dispatches = runtime_dispatches;
    source_record.warnings.clear();

    if let Ok(stat) = utils::stat(&root.join(&source)) {
        source_record.size = stat.size;
    }
}

/// Drops a module's reference to itself and any internal-toolchain module;
/// the lexical tracker's report is cleaned up before it ever reaches a
/// source record.
fn filter_references(self_module: &ModuleId, refs: Vec<ModuleId>) -> Vec<ModuleId> {
    refs.into_iter()
        .filter(|r| r != self_module && !r.is_internal_toolchain())
        .collect()
}

fn filter_dispatches(self_module: &ModuleId, dispatches: Vec<Dispatch>) -> Vec<Dispatch> {
    dispatches
        .into_iter()
        .filter(|d| &d.module != self_module && !d.module.is_internal_toolchain())
        .collect()
}

fn attach_warnings(sources: &mut HashMap<PathBuf, SourceRecord>, warnings: &[RawReport]) {
    let mut by_file: HashMap<PathBuf, Vec<SourceWarning>> = HashMap::new();
    for warning in warnings {
        by_file
            .entry(warning.file.clone())
            .or_default()
            .push(SourceWarning { line: warning.line, message: warning.message.clone() });
    }

    for (file, entries) in by_file {
        for source in sources.values_mut() {
            if source.source == file || file.ends_with(&source.source) {
                source.warnings.extend(entries.clone());
            }
        }
    }
}
