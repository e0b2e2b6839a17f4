//! The fixed-point algorithm that propagates "stale" through the
//! compile-time and runtime reference graphs.
//!
//! Pure: no I/O beyond the best-effort artifact purge, which is itself
//! swallowed on failure. Tolerates cycles because it only ever grows two
//! finite sets to a monotone fixed point; no explicit cycle breaking is
//! needed.

use crate::{
    ids::ModuleId,
    model::{ModuleRecord, SourceRecord},
    utils,
};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

pub struct SolveResult {
    /// Modules that do NOT need recompiling.
    pub surviving_modules: HashMap<ModuleId, ModuleRecord>,
    /// Every source path that now needs recompiling: the caller's
    /// `changed` plus everything the fixed point pulled in transitively.
    pub changed: HashSet<PathBuf>,
}

fn reference_sets(
    record: &ModuleRecord,
    sources: &HashMap<PathBuf, SourceRecord>,
) -> (HashSet<ModuleId>, HashSet<ModuleId>) {
    let mut compile_refs = HashSet::new();
    let mut runtime_refs = HashSet::new();
    for source in &record.sources {
        if let Some(record) = sources.get(source) {
            compile_refs.extend(record.compile_references.iter().cloned());
            runtime_refs.extend(record.runtime_references.iter().cloned());
        }
    }
    (compile_refs, runtime_refs)
}

/// Runs the solver to a fixed point.
///
/// `changed` should already contain removed source paths and anything the
/// probe found dirty; `stale` should already contain the upstream
/// dependency seed.
pub fn solve(
    modules: HashMap<ModuleId, ModuleRecord>,
    sources: &HashMap<PathBuf, SourceRecord>,
    mut changed: HashSet<PathBuf>,
    mut stale: HashSet<ModuleId>,
    compile_dir: &Path,
) -> SolveResult {
    let mut surviving = modules;

    loop {
        let stale_before = stale.len();
        let changed_before = changed.len();
        let mut next = HashMap::with_capacity(surviving.len());

        for (id, record) in surviving {
            let (compile_refs, runtime_refs) = reference_sets(&record, sources);

            let sources_changed = record.sources.iter().any(|s| changed.contains(s));
            let compile_time_stale = compile_refs.iter().any(|r| stale.contains(r));

            if sources_changed || compile_time_stale {
                purge_artifact(&record, compile_dir);
                changed.extend(record.sources.iter().cloned());
                stale.insert(id);
                continue;
            }

            if runtime_refs.iter().any(|r| stale.contains(r)) {
                stale.insert(id.clone());
            }
            next.insert(id, record);
        }

        surviving = next;
        if stale.len() == stale_before && changed.len() == changed_before {
            break;
        }
    }

    SolveResult { surviving_modules: surviving, changed }
}

fn purge_artifact(record: &ModuleRecord, compile_dir: &Path) {
    let path: PathBuf =
        if record.beam.is_absolute() { record.beam.clone() } else { compile_dir.join(&record.beam) };
    if path.as_os_str().is_empty() {
        return;
    }
    utils::purge(&path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModuleKind;

    fn module(id: &str, sources: &[&str]) -> (ModuleId, ModuleRecord) {
        let mid = ModuleId::new(id);
        let rec = ModuleRecord::new(mid.clone(), ModuleKind::Module, PathBuf::from(sources[0]));
        let mut rec = rec;
        rec.sources = sources.iter().map(PathBuf::from).collect();
        (mid, rec)
    }

    fn source(path: &str, compile_refs: &[&str], runtime_refs: &[&str]) -> (PathBuf, SourceRecord) {
        let mut rec = SourceRecord::empty(PathBuf::from(path));
        rec.compile_references = compile_refs.iter().map(|s| ModuleId::new(*s)).collect();
        rec.runtime_references = runtime_refs.iter().map(|s| ModuleId::new(*s)).collect();
        (PathBuf::from(path), rec)
    }

    #[test]
    fn transitive_compile_staleness_rebuilds_dependent() {
        // b.src compile-references A; a.src changes -> both recompiled.
        let modules = HashMap::from([module("A", &["a.src"]), module("B", &["b.src"])]);
        let sources =
            HashMap::from([source("a.src", &[], &[]), source("b.src", &["A"], &[])]);
        let changed = HashSet::from([PathBuf::from("a.src")]);

        let result = solve(modules, &sources, changed, HashSet::new(), Path::new("/build"));

        assert!(result.surviving_modules.is_empty());
        assert!(result.changed.contains(&PathBuf::from("a.src")));
        assert!(result.changed.contains(&PathBuf::from("b.src")));
    }

    #[test]
    fn runtime_reference_does_not_force_rebuild_but_propagates() {
        // b.src only runtime-references A; a.src changes -> A recompiled,
        // B survives (marked stale for downstream propagation only).
        let modules = HashMap::from([module("A", &["a.src"]), module("B", &["b.src"])]);
        let sources =
            HashMap::from([source("a.src", &[], &[]), source("b.src", &[], &["A"])]);
        let changed = HashSet::from([PathBuf::from("a.src")]);

        let result = solve(modules, &sources, changed, HashSet::new(), Path::new("/build"));

        assert!(!result.surviving_modules.contains_key(&ModuleId::new("A")));
        assert!(result.surviving_modules.contains_key(&ModuleId::new("B")));
        assert!(!result.changed.contains(&PathBuf::from("b.src")));
    }

    #[test]
    fn runtime_stale_consumer_with_compile_edge_rebuilds() {
        // c.src compile-references B; B only runtime-references A.
        // a.src changes: A dirty -> B runtime-stale (kept) -> C compile-stale (dropped).
        let modules = HashMap::from([
            module("A", &["a.src"]),
            module("B", &["b.src"]),
            module("C", &["c.src"]),
        ]);
        let sources = HashMap::from([
            source("a.src", &[], &[]),
            source("b.src", &[], &["A"]),
            source("c.src", &["B"], &[]),
        ]);
        let changed = HashSet::from([PathBuf::from("a.src")]);

        let result = solve(modules, &sources, changed, HashSet::new(), Path::new("/build"));

        assert!(result.surviving_modules.contains_key(&ModuleId::new("B")));
        assert!(!result.surviving_modules.contains_key(&ModuleId::new("C")));
        assert!(result.changed.contains(&PathBuf::from("c.src")));
        assert!(!result.changed.contains(&PathBuf::from("b.src")));
    }

    #[test]
    fn cyclic_compile_references_terminate() {
        let modules = HashMap::from([module("A", &["a.src"]), module("B", &["b.src"])]);
        let sources = HashMap::from([
            source("a.src", &["B"], &[]),
            source("b.src", &["A"], &[]),
        ]);
        let changed = HashSet::from([PathBuf::from("a.src")]);

        let result = solve(modules, &sources, changed, HashSet::new(), Path::new("/build"));
        assert!(result.surviving_modules.is_empty());
        assert!(result.changed.contains(&PathBuf::from("a.src")));
        assert!(result.changed.contains(&PathBuf::from("b.src")));
    }

    #[test]
    fn unaffected_module_stays_clean() {
        let modules = HashMap::from([module("A", &["a.src"]), module("Z", &["z.src"])]);
        let sources = HashMap::from([source("a.src", &[], &[]), source("z.src", &[], &[])]);
        let changed = HashSet::from([PathBuf::from("a.src")]);

        let result = solve(modules, &sources, changed, HashSet::new(), Path::new("/build"));
        assert!(result.surviving_modules.contains_key(&ModuleId::new("Z")));
        assert!(!result.changed.contains(&PathBuf::from("z.src")));
    }
}
