//! Pluggable build reporting.
//!
//! Mirrors this crate's scoped-reporter convention: a thread-local
//! [`Reporter`] the orchestrator and coordinator notify, defaulting to one
//! that simply emits `tracing` events. A CLI embedding this crate can swap
//! in its own reporter (pretty-printing, progress bars, …) for the
//! duration of a build without threading a parameter through every call.

use std::{cell::RefCell, path::Path, rc::Rc, time::Duration};

use crate::ids::ModuleId;

pub trait Reporter {
    fn on_compiling(&self, _source: &Path) {}
    fn on_module_compiled(&self, _source: &Path, _module: &ModuleId) {}
    fn on_long_compilation(&self, source: &Path, threshold: Duration) {
        warn!("compiling {} is taking longer than {}s", source.display(), threshold.as_secs());
    }
}

/// The default reporter: every hook is a `tracing` event.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn on_compiling(&self, source: &Path) {
        debug!("compiling {}", source.display());
    }

    fn on_module_compiled(&self, source: &Path, module: &ModuleId) {
        debug!("compiled {module} from {}", source.display());
    }
}

thread_local! {
    static SCOPED: RefCell<Option<Rc<dyn Reporter>>> = const { RefCell::new(None) };
}

/// Runs `with` against the currently scoped reporter, or [`TracingReporter`]
/// if none is set.
pub fn get_default<T>(with: impl FnOnce(&dyn Reporter) -> T) -> T {
    SCOPED.with(|cell| match cell.borrow().as_ref() {
        Some(reporter) => with(reporter.as_ref()),
        None => with(&TracingReporter),
    })
}

/// A guard that restores the previous scoped reporter on drop.
pub struct ScopedGuard {
    previous: Option<Rc<dyn Reporter>>,
}

impl Drop for ScopedGuard {
    fn drop(&mut self) {
        SCOPED.with(|cell| *cell.borrow_mut() = self.previous.take());
    }
}

/// Installs `reporter` as the scoped reporter for as long as the returned
/// guard is alive.
pub fn set_scoped(reporter: Rc<dyn Reporter>) -> ScopedGuard {
    let previous = SCOPED.with(|cell| cell.borrow_mut().replace(reporter));
    ScopedGuard { previous }
}
