//! Shared scaffolding for the end-to-end scenario tests: a scripted
//! stand-in for the external compiler/lexical-tracker/metadata reader,
//! driven by a tiny per-source text format instead of a real parser.

use increment_core::{
    compiler::{CompileRunOutcome, LexicalTracker, ModuleCompleted, ModuleMetadata, ParallelCompiler},
    config::{CompileOptions, ProjectPaths},
    ids::ModuleId,
    model::Dispatch,
};
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Clone, Default)]
struct Parsed {
    module: String,
    compile_refs: Vec<String>,
    runtime_refs: Vec<String>,
    external: Vec<String>,
    fail: bool,
}

fn parse(contents: &str) -> Parsed {
    let mut parsed = Parsed::default();
    for line in contents.lines() {
        let Some((key, value)) = line.split_once('=') else { continue };
        match key.trim() {
            "module" => parsed.module = value.trim().to_string(),
            "compile_refs" => {
                parsed.compile_refs = value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
            }
            "runtime_refs" => {
                parsed.runtime_refs = value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
            }
            "external" => {
                parsed.external = value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
            }
            "fail" => parsed.fail = value.trim() == "true",
            _ => {}
        }
    }
    parsed
}

/// A scripted front-end: "compiles" a source by parsing its text for a
/// `module=`/`compile_refs=`/`runtime_refs=` mini-format, recording the
/// parse result so `LexicalTracker`/`ModuleMetadata` can answer from it.
pub struct ScriptedCompiler {
    root: PathBuf,
    parsed: Mutex<HashMap<ModuleId, Parsed>>,
    /// Every source path the scripted compiler has been asked to compile,
    /// across every build, so tests can assert on what actually recompiled
    /// rather than inferring it from content.
    log: Mutex<Vec<PathBuf>>,
}

impl ParallelCompiler for ScriptedCompiler {
    fn compile(
        &self,
        sources: &[PathBuf],
        _dest: &Path,
        on_module: &(dyn Fn(ModuleCompleted) + Send + Sync),
        _on_long_compilation: &(dyn Fn(&Path) + Send + Sync),
        _long_compilation_threshold: Duration,
        _extra_opts: &BTreeMap<String, Value>,
    ) -> CompileRunOutcome {
        let mut errors = Vec::new();
        self.log.lock().unwrap().extend(sources.iter().cloned());
        for source in sources {
            let abs = self.root.join(source);
            let contents = match fs::read_to_string(&abs) {
                Ok(c) => c,
                Err(err) => {
                    return CompileRunOutcome::Error {
                        errors: vec![increment_core::diagnostics::RawReport {
                            file: abs,
                            line: 0,
                            message: err.to_string(),
                        }],
                        warnings: Vec::new(),
                    }
                }
            };
            let parsed = parse(&contents);
            if parsed.fail {
                errors.push(increment_core::diagnostics::RawReport {
                    file: abs,
                    line: 1,
                    message: format!("scripted failure in {}", source.display()),
                });
                continue;
            }
            let module = ModuleId::new(parsed.module.clone());
            self.parsed.lock().unwrap().insert(module.clone(), parsed);
            on_module(ModuleCompleted {
                source: source.clone(),
                module,
                binary: contents.into_bytes(),
            });
        }
        if !errors.is_empty() {
            return CompileRunOutcome::Error { errors, warnings: Vec::new() };
        }
        CompileRunOutcome::Ok { warnings: Vec::new() }
    }
}

impl LexicalTracker for ScriptedCompiler {
    fn references(&self, module: &ModuleId) -> (Vec<ModuleId>, Vec<ModuleId>) {
        let guard = self.parsed.lock().unwrap();
        let Some(parsed) = guard.get(module) else { return (Vec::new(), Vec::new()) };
        (
            parsed.compile_refs.iter().cloned().map(ModuleId::new).collect(),
            parsed.runtime_refs.iter().cloned().map(ModuleId::new).collect(),
        )
    }

    fn dispatches(&self, _module: &ModuleId) -> (Vec<Dispatch>, Vec<Dispatch>) {
        (Vec::new(), Vec::new())
    }
}

impl ModuleMetadata for ScriptedCompiler {
    fn protocol(&self, _module: &ModuleId) -> bool {
        false
    }

    fn protocol_impl(&self, _module: &ModuleId) -> Option<ModuleId> {
        None
    }

    fn external_resources(&self, module: &ModuleId) -> Vec<PathBuf> {
        let guard = self.parsed.lock().unwrap();
        let Some(parsed) = guard.get(module) else { return Vec::new() };
        parsed.external.iter().map(|p| self.root.join(p)).collect()
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub paths: ProjectPaths,
    pub compiler: ScriptedCompiler,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        let compiler = ScriptedCompiler {
            root: dir.path().to_path_buf(),
            parsed: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        };
        Self { dir, paths, compiler }
    }

    /// Clears the scripted compiler's log of compiled sources, so a test
    /// can check exactly what the *next* build recompiles.
    pub fn clear_log(&self) {
        self.compiler.log.lock().unwrap().clear();
    }

    /// Every source the scripted compiler has been asked to compile since
    /// the last [`Harness::clear_log`].
    pub fn compiled(&self) -> Vec<PathBuf> {
        self.compiler.log.lock().unwrap().clone()
    }

    pub fn write(&self, relative: &str, module: &str, compile_refs: &[&str], runtime_refs: &[&str]) {
        self.write_full(relative, module, compile_refs, runtime_refs, &[], false);
    }

    pub fn write_with_external(&self, relative: &str, module: &str, external: &[&str]) {
        self.write_full(relative, module, &[], &[], external, false);
    }

    pub fn write_failing(&self, relative: &str, module: &str) {
        self.write_full(relative, module, &[], &[], &[], true);
    }

    #[allow(clippy::too_many_arguments)]
    fn write_full(
        &self,
        relative: &str,
        module: &str,
        compile_refs: &[&str],
        runtime_refs: &[&str],
        external: &[&str],
        fail: bool,
    ) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let contents = format!(
            "module={module}\ncompile_refs={}\nruntime_refs={}\nexternal={}\nfail={}\n",
            compile_refs.join(","),
            runtime_refs.join(","),
            external.join(","),
            fail,
        );
        fs::write(path, contents).unwrap();
    }

    pub fn touch(&self, relative: &str) {
        let path = self.dir.path().join(relative);
        let advanced = increment_core::utils::now_millis() + 60_000;
        increment_core::utils::set_mtime(&path, advanced);
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.dir.path().join(relative)).unwrap();
    }

    pub fn compile(&self) -> increment_core::Result<increment_core::CompileOutcome> {
        self.compile_with(&CompileOptions::new())
    }

    pub fn compile_with(&self, opts: &CompileOptions) -> increment_core::Result<increment_core::CompileOutcome> {
        increment_core::orchestrator::compile(
            &self.paths,
            &self.compiler,
            &self.compiler,
            &self.compiler,
            &[],
            opts,
        )
    }

    pub fn manifest(&self) -> increment_core::Manifest {
        increment_core::orchestrator::read_manifest(&self.paths)
    }
}
