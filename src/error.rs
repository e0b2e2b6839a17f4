//! Crate-wide error type.
//!
//! Mirrors the split this crate's sibling compiler frontends use: a bare
//! [`std::io::Error`] loses the path that caused it, so IO failures that
//! originate from a known path are wrapped in [`IoError`] instead.

use std::{fmt, path::PathBuf};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// An IO error tagged with the path that caused it.
#[derive(Debug, thiserror::Error)]
#[error("{path}: {io}")]
pub struct IoError {
    #[source]
    pub io: std::io::Error,
    pub path: PathBuf,
}

impl IoError {
    pub fn new(io: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error("failed to decode manifest: {0}")]
    ManifestDecode(String),

    #[error("failed to encode manifest: {0}")]
    ManifestEncode(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("compilation failed with {} error(s)", .0.len())]
    Compile(Vec<crate::diagnostics::Diagnostic>),

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub fn io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io(IoError::new(err, path))
    }

    pub fn msg(msg: impl fmt::Display) -> Self {
        Self::Message(msg.to_string())
    }
}
