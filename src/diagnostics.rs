//! Normalizes warnings and errors from the compiler interface into a
//! uniform record for the shell.

use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};
use yansi::{Color, Style};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl Severity {
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single, absolute-path-anchored diagnostic.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub position: u32,
    pub message: String,
    pub severity: Severity,
    pub compiler_name: String,
}

impl Diagnostic {
    fn severity_style(&self) -> Style {
        match self.severity {
            Severity::Error => Color::Red.style().bold(),
            Severity::Warning => Color::Yellow.style().bold(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.severity_style();
        style.fmt_prefix(f)?;
        f.write_str(self.severity.as_str())?;
        style.fmt_suffix(f)?;
        write!(f, " {}:{}: {}", self.file.display(), self.position, self.message)
    }
}

/// A raw `(absolute_file, line, message)` triple as reported by the
/// compiler interface.
#[derive(Clone, Debug)]
pub struct RawReport {
    pub file: PathBuf,
    pub line: u32,
    pub message: String,
}

/// Shapes raw compiler reports into uniform [`Diagnostic`]s.
pub fn shape(reports: Vec<RawReport>, severity: Severity, compiler_name: &str) -> Vec<Diagnostic> {
    reports
        .into_iter()
        .map(|r| Diagnostic {
            file: r.file,
            position: r.line,
            message: r.message,
            severity,
            compiler_name: compiler_name.to_string(),
        })
        .collect()
}
