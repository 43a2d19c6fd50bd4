//! Temporary storage locations for tests.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use prefkeep_store::StoreConfig;
use tempfile::TempDir;

/// Temporary settings directory removed when dropped.
#[derive(Debug)]
pub struct TempSettingsDir {
    dir: TempDir,
}

impl TempSettingsDir {
    /// Create a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create temporary settings dir")?;
        Ok(Self { dir })
    }

    /// Store configuration rooted at this directory with the default namespace.
    #[must_use]
    pub fn config(&self) -> StoreConfig {
        StoreConfig::new(self.dir.path())
    }

    /// Path of the settings document for the default namespace.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config().file_path()
    }

    /// Overwrite the settings document with `contents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_settings(&self, contents: &str) -> Result<()> {
        let path = self.settings_file();
        fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Read the settings document back.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_settings(&self) -> Result<String> {
        let path = self.settings_file();
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
    }
}
