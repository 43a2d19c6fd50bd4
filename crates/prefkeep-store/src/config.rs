//! Storage location for the settings document.
//!
//! # Design
//! - The host supplies a directory and a namespace; the document lives at
//!   `<dir>/<namespace>.json`.
//! - Environment parsing goes through `from_lookup` so it can be exercised
//!   without touching the process environment.

use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};

/// Environment variable naming the storage directory.
pub const DATA_DIR_ENV: &str = "PREFKEEP_DATA_DIR";
/// Environment variable naming the settings namespace.
pub const NAMESPACE_ENV: &str = "PREFKEEP_NAMESPACE";
/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "settings";

/// Where the settings document is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the settings document.
    pub dir: PathBuf,
    /// File stem of the settings document.
    pub namespace: String,
}

impl StoreConfig {
    /// Configuration rooted at `dir` with the default namespace.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Replace the namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is empty or contains path separators.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> StoreResult<Self> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;
        self.namespace = namespace;
        Ok(self)
    }

    /// Full path of the settings document.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.namespace))
    }

    /// Resolve the configuration from `PREFKEEP_DATA_DIR` / `PREFKEEP_NAMESPACE`.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and no platform config
    /// directory can be determined, or if the namespace is invalid.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`StoreConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> StoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dir = match non_empty(lookup(DATA_DIR_ENV)) {
            Some(dir) => PathBuf::from(dir),
            None => default_dir().ok_or(StoreError::InvalidConfig {
                field: "dir",
                reason: "no_platform_config_dir",
                value: None,
            })?,
        };

        let config = Self::new(dir);
        match non_empty(lookup(NAMESPACE_ENV)) {
            Some(namespace) => config.with_namespace(namespace),
            None => Ok(config),
        }
    }
}

/// Platform-specific configuration directory for Prefkeep.
///
/// - Linux: `$XDG_CONFIG_HOME/prefkeep` or `~/.config/prefkeep`
/// - macOS: `~/Library/Application Support/dev.prefkeep.prefkeep`
/// - Windows: `%APPDATA%\prefkeep\prefkeep\config`
#[must_use]
pub fn default_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "prefkeep", "prefkeep")
        .map(|dirs| dirs.config_local_dir().to_path_buf())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_namespace(namespace: &str) -> StoreResult<()> {
    if namespace.is_empty() {
        return Err(StoreError::InvalidConfig {
            field: "namespace",
            reason: "empty",
            value: None,
        });
    }
    if namespace.contains(['/', '\\']) || namespace == "." || namespace == ".." {
        return Err(StoreError::InvalidConfig {
            field: "namespace",
            reason: "path_separator",
            value: Some(namespace.to_string()),
        });
    }
    Ok(())
}
