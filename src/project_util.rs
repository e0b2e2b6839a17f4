//! Utilities for creating and testing throwaway project workspaces.
//!
//! Gated behind the `project-util` feature, the same way this crate's
//! template gates its own scratch-project helpers.

use crate::config::ProjectPaths;
use std::{fs, path::Path};
use tempfile::TempDir;

/// A scratch project rooted in a fresh temporary directory, torn down when
/// dropped.
pub struct TempProject {
    dir: TempDir,
    pub paths: ProjectPaths,
}

impl TempProject {
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let paths = ProjectPaths::new(dir.path());
        Ok(Self { dir, paths })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `relative`, relative to the project root,
    /// creating parent directories as needed.
    pub fn write_source(&self, relative: &str, contents: &str) -> std::io::Result<()> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }

    pub fn remove_source(&self, relative: &str) -> std::io::Result<()> {
        fs::remove_file(self.root().join(relative))
    }

    /// Touches `relative`'s mtime forward so the probe sees it as
    /// modified, without needing to sleep out a filesystem's mtime
    /// resolution.
    pub fn touch(&self, relative: &str) {
        let path = self.root().join(relative);
        crate::utils::set_mtime(&path, crate::utils::now_millis() + 60_000);
    }

    /// Recursively copies another directory tree into the project root,
    /// for tests that seed a project from a fixture.
    pub fn copy_fixture(&self, fixture_dir: &Path) -> Result<(), fs_extra::error::Error> {
        let options = fs_extra::dir::CopyOptions::new().content_only(true);
        fs_extra::dir::copy(fixture_dir, self.root(), &options)?;
        Ok(())
    }
}
