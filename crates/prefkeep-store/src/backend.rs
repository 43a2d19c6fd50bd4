//! Durable backends that hold the committed snapshot between process runs.
//!
//! # Design
//! - Backends persist whole snapshots; partial writes are never visible.
//! - The JSON backend writes to a sibling temp file and renames it over the
//!   target so readers only ever see a complete document.
//! - Entries that fail to decode are skipped on load so one corrupted setting
//!   does not take the rest of the store down with it.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::snapshot::Snapshot;
use crate::value::StoredValue;

/// Whole-snapshot persistence used by the snapshot store.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Load the last persisted entries, or an empty map when nothing is stored.
    async fn load(&self) -> StoreResult<BTreeMap<String, StoredValue>>;
    /// Durably replace the persisted entries with the contents of `snapshot`.
    async fn persist(&self, snapshot: &Snapshot) -> StoreResult<()>;
    /// Short label used in logs.
    fn label(&self) -> &'static str;
}

/// Backend that keeps nothing beyond the process lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackend;

impl MemoryBackend {
    /// Empty in-memory backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Persistence for MemoryBackend {
    async fn load(&self) -> StoreResult<BTreeMap<String, StoredValue>> {
        Ok(BTreeMap::new())
    }

    async fn persist(&self, _snapshot: &Snapshot) -> StoreResult<()> {
        Ok(())
    }

    fn label(&self) -> &'static str {
        "memory"
    }
}

/// Backend persisting the snapshot as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Backend writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the JSON document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn decode(&self, contents: &str) -> StoreResult<BTreeMap<String, StoredValue>> {
        let raw: BTreeMap<String, Value> = serde_json::from_str(contents)
            .map_err(|source| StoreError::json("load", &self.path, source))?;

        let mut entries = BTreeMap::new();
        for (name, value) in raw {
            match serde_json::from_value::<StoredValue>(value) {
                Ok(stored) => {
                    entries.insert(name, stored);
                }
                Err(err) => {
                    warn!(
                        key = %name,
                        path = %self.path.display(),
                        error = %err,
                        "skipping undecodable settings entry"
                    );
                }
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl Persistence for JsonFileBackend {
    async fn load(&self) -> StoreResult<BTreeMap<String, StoredValue>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "settings file absent; starting empty");
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(StoreError::io("load", &self.path, err)),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let entries = self.decode(&contents)?;
        info!(
            path = %self.path.display(),
            entries = entries.len(),
            "loaded persisted settings"
        );
        Ok(entries)
    }

    async fn persist(&self, snapshot: &Snapshot) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::io("create_dir", parent, err))?;
        }

        let payload = serde_json::to_vec_pretty(snapshot.entries())
            .map_err(|source| StoreError::json("persist", &self.path, source))?;

        let temp = self.temp_path();
        let file = fs::File::create(&temp)
            .await
            .map_err(|err| StoreError::io("create_temp", &temp, err))?;

        let written = match write_synced(file, &payload, &temp).await {
            Ok(()) => fs::rename(&temp, &self.path)
                .await
                .map_err(|err| StoreError::io("rename", &self.path, err)),
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            discard_temp(&temp).await;
            return Err(err);
        }

        debug!(
            path = %self.path.display(),
            revision = snapshot.revision(),
            "persisted settings snapshot"
        );
        Ok(())
    }

    fn label(&self) -> &'static str {
        "json_file"
    }
}

async fn write_synced(mut file: fs::File, payload: &[u8], temp: &Path) -> StoreResult<()> {
    file.write_all(payload)
        .await
        .map_err(|err| StoreError::io("write_temp", temp, err))?;
    file.sync_all()
        .await
        .map_err(|err| StoreError::io("sync_temp", temp, err))
}

async fn discard_temp(temp: &Path) {
    match fs::remove_file(temp).await {
        Ok(()) => debug!(path = %temp.display(), "removed partial settings temp file"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(
            path = %temp.display(),
            error = %err,
            "failed to remove partial settings temp file"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn temp_path_is_a_sibling() {
        let backend = JsonFileBackend::new("/var/lib/prefkeep/settings.json");
        assert_eq!(
            backend.temp_path(),
            PathBuf::from("/var/lib/prefkeep/settings.json.tmp")
        );
    }

    #[test]
    fn decode_skips_corrupted_entries() -> StoreResult<()> {
        let backend = JsonFileBackend::new("settings.json");
        let entries = backend.decode(
            r#"{
                "api_key": {"type": "string", "value": "k1"},
                "input_mode": {"type": "float", "value": 1.5},
                "enabled_apps": {"type": "string_set", "value": ["pkg.a"]}
            }"#,
        )?;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries.get("api_key"), Some(&StoredValue::String("k1".into())));
        assert_eq!(
            entries.get("enabled_apps"),
            Some(&StoredValue::StringSet(BTreeSet::from(["pkg.a".to_string()])))
        );
        Ok(())
    }

    #[test]
    fn decode_rejects_non_object_documents() {
        let backend = JsonFileBackend::new("settings.json");
        let err = backend.decode("[1, 2, 3]");
        assert!(matches!(err, Err(StoreError::Json { operation: "load", .. })));
    }

    #[tokio::test]
    async fn memory_backend_forgets_everything() -> StoreResult<()> {
        let backend = MemoryBackend::new();
        let snapshot =
            Snapshot::empty().with("floating_window_enabled", StoredValue::Boolean(true));
        backend.persist(&snapshot).await?;
        assert!(backend.load().await?.is_empty());
        assert_eq!(backend.label(), "memory");
        Ok(())
    }
}
