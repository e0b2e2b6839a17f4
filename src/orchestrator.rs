//! The single public entry point: computes seeds, calls the solver, the
//! coordinator, and the manifest writer, and decides the `Ok` / `Noop` /
//! error outcome.

use crate::{
    compiler::{LexicalTracker, ModuleMetadata, ParallelCompiler},
    config::{CompileOptions, ProjectPaths},
    coordinator::{self, CoordinatorResult},
    diagnostics::Diagnostic,
    error::{Error, Result},
    manifest::{self, Manifest},
    model::{ModuleKind, ModuleRecord, SourceRecord},
    probe, solver,
    upstream::{self, UpstreamDependency},
    utils,
};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// The result of a successful [`compile`] call.
pub enum CompileOutcome {
    /// Something was (re)compiled, or removed sources were pruned.
    Ok(Vec<Diagnostic>),
    /// Nothing needed to change.
    Noop(Vec<Diagnostic>),
}

impl CompileOutcome {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Ok(d) | Self::Noop(d) => d,
        }
    }
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip_all)]
pub fn compile(
    paths: &ProjectPaths,
    compiler: &dyn ParallelCompiler,
    lexical: &dyn LexicalTracker,
    metadata: &dyn ModuleMetadata,
    upstream_deps: &[UpstreamDependency],
    opts: &CompileOptions,
) -> Result<CompileOutcome> {
    // Step 1: capture the timestamp before any reads, so writes made
    // during this build are detected as dirty next time.
    let timestamp = utils::now_millis();

    // Step 2: enumerate all current source files.
    let current_paths = enumerate_sources(paths);

    // Step 3: read the manifest.
    let manifest_mtime = utils::stat(&paths.manifest).map(|s| s.mtime).unwrap_or(0);
    let Manifest { modules, sources } = manifest::read(&paths.manifest, &paths.compile_dir);

    // Step 4: removed = prev - current.
    let prev_paths: HashSet<PathBuf> = sources.keys().cloned().collect();
    let removed: HashSet<PathBuf> = prev_paths.difference(&current_paths).cloned().collect();

    // Step 5: changed sources.
    let changed = if opts.force {
        debug!("force rebuild requested, treating every source as changed");
        current_paths.clone()
    } else {
        detect_changed(paths, &current_paths, &prev_paths, &sources, manifest_mtime)?
    };

    // Step 6: seed stale modules from upstream dependencies.
    let stale_modules = upstream::scan(manifest_mtime, upstream_deps);

    // Step 7: run the staleness solver.
    let mut seed_changed = removed.clone();
    seed_changed.extend(changed.iter().cloned());
    let solved = solver::solve(modules, &sources, seed_changed, stale_modules, &paths.compile_dir);

    // Step 8: sources that still exist and need compiling.
    let stale_to_compile: Vec<PathBuf> =
        solved.changed.difference(&removed).cloned().collect();

    // Step 9: rebuild the sources structure: drop removed, skeleton the changed.
    let mut sources_after = sources;
    for path in &removed {
        sources_after.remove(path);
    }
    for path in &stale_to_compile {
        sources_after.insert(path.clone(), SourceRecord::empty(path.clone()));
    }

    // Step 10: decide the outcome.
    if !stale_to_compile.is_empty() {
        debug!(count = stale_to_compile.len(), "compiling stale sources");
        match coordinator::compile(
            compiler,
            lexical,
            metadata,
            &stale_to_compile,
            &paths.root,
            &paths.compile_dir,
            solved.surviving_modules,
            sources_after,
            opts,
        ) {
            CoordinatorResult::Ok(output) => {
                let mut warnings = output.warnings;
                if opts.all_warnings {
                    warnings.extend(existing_warnings(&paths.root, &output.sources, &stale_to_compile));
                }
                manifest::write(&paths.manifest, output.modules, output.sources, &paths.compile_dir, timestamp)?;
                Ok(CompileOutcome::Ok(warnings))
            }
            CoordinatorResult::Error { mut errors, warnings } => {
                errors.extend(warnings);
                Err(Error::Compile(errors))
            }
        }
    } else if !removed.is_empty() {
        debug!(count = removed.len(), "pruning removed sources, nothing to compile");
        let mut warnings = Vec::new();
        if opts.all_warnings {
            warnings.extend(existing_warnings(&paths.root, &sources_after, &[]));
        }
        manifest::write(&paths.manifest, solved.surviving_modules, sources_after, &paths.compile_dir, timestamp)?;
        Ok(CompileOutcome::Ok(warnings))
    } else {
        trace!("nothing changed");
        let mut warnings = Vec::new();
        if opts.all_warnings {
            warnings.extend(existing_warnings(&paths.root, &sources_after, &[]));
        }
        Ok(CompileOutcome::Noop(warnings))
    }
}

/// Deletes every artifact listed in the manifest.
pub fn clean(paths: &ProjectPaths) {
    let manifest = manifest::read(&paths.manifest, &paths.compile_dir);
    for record in manifest.modules.values() {
        utils::purge(&record.beam);
    }
}

/// Returns manifest records with artifact paths already expanded under
/// `paths.compile_dir`.
pub fn read_manifest(paths: &ProjectPaths) -> Manifest {
    manifest::read(&paths.manifest, &paths.compile_dir)
}

/// Filters manifest module records down to protocols and protocol
/// implementations. Returned `beam` paths are already expanded under the
/// compile directory; callers must not re-join them.
pub fn protocols_and_impls(paths: &ProjectPaths) -> Vec<ModuleRecord> {
    read_manifest(paths)
        .modules
        .into_values()
        .filter(|m| m.kind.as_ref().is_some_and(ModuleKind::is_protocol_or_impl))
        .collect()
}

fn enumerate_sources(paths: &ProjectPaths) -> HashSet<PathBuf> {
    let mut found = HashSet::new();
    for root in &paths.source_roots {
        for entry in WalkDir::new(root).into_iter().filter_map(std::result::Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            if !paths.accepts(entry.path()) {
                continue;
            }
            found.insert(utils::source_name(entry.path(), &paths.root));
        }
    }
    found
}

fn detect_changed(
    paths: &ProjectPaths,
    current: &HashSet<PathBuf>,
    prev: &HashSet<PathBuf>,
    sources: &HashMap<PathBuf, SourceRecord>,
    manifest_mtime: u64,
) -> Result<HashSet<PathBuf>> {
    let probed = probe::probe(&paths.root, sources);
    let mut changed = HashSet::new();

    for path in current {
        if !prev.contains(path) {
            changed.insert(path.clone());
            continue;
        }

        let record = &sources[path];
        let Some(stat) = probed.get(path) else {
            changed.insert(path.clone());
            continue;
        };

        if stat.size != record.size || stat.mtime > manifest_mtime {
            changed.insert(path.clone());
            continue;
        }

        let externals_stale = record.external.iter().any(|ext| {
            probed.get(ext).map(|s| s.mtime > manifest_mtime).unwrap_or(true)
        });
        if externals_stale {
            changed.insert(path.clone());
        }
    }

    Ok(changed)
}

fn existing_warnings(root: &Path, sources: &HashMap<PathBuf, SourceRecord>, skip: &[PathBuf]) -> Vec<Diagnostic> {
    let skip: HashSet<&PathBuf> = skip.iter().collect();
    let mut out = Vec::new();
    for (path, record) in sources {
        if skip.contains(path) {
            continue;
        }
        for warning in &record.warnings {
            out.push(Diagnostic {
                file: root.join(path),
                position: warning.line,
                message: warning.message.clone(),
                severity: crate::diagnostics::Severity::Warning,
                compiler_name: "core".to_string(),
            });
        }
    }
    out
}
