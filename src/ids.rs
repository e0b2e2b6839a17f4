//! Interned-string-shaped identifiers.
//!
//! The source system this crate's staleness model is adapted from represents
//! module names as runtime atoms. Atoms don't have a Rust equivalent worth
//! faking, so a module id is just a cheaply-clonable string newtype; callers
//! that want real interning can wrap their own table behind the same API.

use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::from(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The naming convention internal-toolchain modules are recognized by.
    /// Compile/runtime references into these are filtered out before they
    /// ever reach a source record.
    pub fn is_internal_toolchain(&self) -> bool {
        self.0.starts_with("internal_")
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ModuleId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
