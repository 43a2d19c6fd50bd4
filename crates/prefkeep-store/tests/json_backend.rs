use std::collections::BTreeSet;
use std::sync::Arc;

use prefkeep_store::{
    JsonFileBackend, Persistence, Snapshot, SnapshotStore, StoreConfig, StoreError, StoredValue,
    WatchedStore,
};
use tempfile::TempDir;

fn set(name: &'static str, value: StoredValue) -> prefkeep_store::Mutator {
    Box::new(move |snapshot: &Snapshot| snapshot.with(name, value))
}

#[tokio::test]
async fn committed_snapshot_survives_reopen() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = StoreConfig::new(dir.path().join("nested"));
    let backend = Arc::new(JsonFileBackend::new(config.file_path()));

    let store = WatchedStore::open(backend.clone()).await?;
    store
        .commit(set("api_key", StoredValue::String("k1".into())))
        .await?;
    store
        .commit(set(
            "enabled_apps",
            StoredValue::StringSet(BTreeSet::from(["pkg.a".to_string()])),
        ))
        .await?;
    drop(store);

    let reopened = WatchedStore::open(backend).await?;
    let snapshot = reopened.current();
    assert_eq!(snapshot.revision(), 0);
    assert_eq!(
        snapshot.get("api_key"),
        Some(&StoredValue::String("k1".into()))
    );
    assert_eq!(
        snapshot.get("enabled_apps"),
        Some(&StoredValue::StringSet(BTreeSet::from([
            "pkg.a".to_string()
        ])))
    );
    Ok(())
}

#[tokio::test]
async fn failed_persist_keeps_previous_file_and_snapshot() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");
    let backend = Arc::new(JsonFileBackend::new(&path));
    let store = WatchedStore::open(backend).await?;

    store
        .commit(set("api_key", StoredValue::String("k1".into())))
        .await?;
    let on_disk = std::fs::read_to_string(&path)?;

    // A directory squatting on the temp path makes the next write fail.
    std::fs::create_dir(dir.path().join("settings.json.tmp"))?;
    let result = store
        .commit(set("api_key", StoredValue::String("k2".into())))
        .await;

    assert!(matches!(result, Err(StoreError::Io { .. })));
    assert_eq!(std::fs::read_to_string(&path)?, on_disk);
    assert_eq!(
        store.current().get("api_key"),
        Some(&StoredValue::String("k1".into()))
    );
    assert_eq!(store.current().revision(), 1);
    Ok(())
}

#[tokio::test]
async fn corrupted_entry_does_not_block_the_rest() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{
            "model_name": {"type": "string", "value": "autoglm-phone"},
            "input_mode": "not-a-tagged-value"
        }"#,
    )?;

    let store = WatchedStore::open(Arc::new(JsonFileBackend::new(&path))).await?;
    let snapshot = store.current();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.get("input_mode").is_none());
    Ok(())
}

#[tokio::test]
async fn malformed_document_fails_open() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json")?;

    let result = WatchedStore::open(Arc::new(JsonFileBackend::new(&path))).await;
    assert!(matches!(result, Err(StoreError::Json { .. })));
    Ok(())
}

#[tokio::test]
async fn failed_rename_leaves_no_temp_file_behind() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");
    // A non-empty directory at the target path cannot be replaced by a file.
    std::fs::create_dir(&path)?;
    std::fs::write(path.join("keep"), "occupied")?;

    let backend = JsonFileBackend::new(&path);
    let snapshot = Snapshot::empty().with("api_key", StoredValue::String("k1".into()));
    let result = backend.persist(&snapshot).await;

    assert!(matches!(
        result,
        Err(StoreError::Io {
            operation: "rename",
            ..
        })
    ));
    assert!(!dir.path().join("settings.json.tmp").exists());
    assert!(path.join("keep").exists());
    Ok(())
}
