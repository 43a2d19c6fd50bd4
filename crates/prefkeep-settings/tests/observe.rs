use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use prefkeep_settings::catalog::{API_KEY, ENABLED_APPS, FLOATING_WINDOW_ENABLED, INPUT_MODE};
use prefkeep_settings::{InputMode, SettingStream, SettingsService};
use prefkeep_store::WatchedStore;
use prefkeep_test_support::mocks::FlakyBackend;
use tokio::time::timeout;
use tokio_stream::StreamExt;

const DELIVERY: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(150);

async fn next<T>(stream: &mut SettingStream<T>) -> Result<T> {
    timeout(DELIVERY, stream.next())
        .await
        .map_err(|_| anyhow!("no value delivered in time"))?
        .ok_or_else(|| anyhow!("stream ended"))
}

async fn assert_quiet<T: std::fmt::Debug>(stream: &mut SettingStream<T>) {
    if let Ok(item) = timeout(QUIET, stream.next()).await {
        panic!("unexpected delivery: {item:?}");
    }
}

#[tokio::test]
async fn observer_sees_current_value_then_changes() -> Result<()> {
    let service = SettingsService::in_memory();
    let mut stream = service.observe(&FLOATING_WINDOW_ENABLED);

    assert!(!next(&mut stream).await?);
    service.write(&FLOATING_WINDOW_ENABLED, true).await?;
    assert!(next(&mut stream).await?);

    service.write(&FLOATING_WINDOW_ENABLED, true).await?;
    service.write(&API_KEY, "sk-unrelated".to_string()).await?;
    assert_quiet(&mut stream).await;
    Ok(())
}

#[tokio::test]
async fn late_subscriber_starts_from_committed_value() -> Result<()> {
    let service = SettingsService::in_memory();
    service.write(&INPUT_MODE, InputMode::Paste).await?;

    let mut stream = service.observe(&INPUT_MODE);
    assert_eq!(next(&mut stream).await?, InputMode::Paste);
    assert_quiet(&mut stream).await;
    Ok(())
}

#[tokio::test]
async fn dropping_one_observer_leaves_others_running() -> Result<()> {
    let service = SettingsService::in_memory();
    let mut kept = service.observe(&API_KEY);
    let dropped = service.observe(&API_KEY);
    assert_eq!(next(&mut kept).await?, "");

    drop(dropped);
    service.write(&API_KEY, "sk-new".to_string()).await?;
    assert_eq!(next(&mut kept).await?, "sk-new");
    Ok(())
}

#[tokio::test]
async fn failed_persist_notifies_nobody() -> Result<()> {
    let backend = Arc::new(FlakyBackend::new());
    let store = WatchedStore::open(backend.clone()).await?;
    let service = SettingsService::with_catalog(Arc::new(store));
    let mut stream = service.observe(&API_KEY);
    assert_eq!(next(&mut stream).await?, "");

    backend.set_failing(true);
    assert!(service.write(&API_KEY, "sk-lost".to_string()).await.is_err());
    assert_quiet(&mut stream).await;
    assert_eq!(service.read(&API_KEY), "");
    Ok(())
}

#[tokio::test]
async fn reset_is_observed_as_return_to_default() -> Result<()> {
    let service = SettingsService::in_memory();
    service
        .toggle_membership(&ENABLED_APPS, "com.example.mail", true)
        .await?;
    let mut stream = service.observe(&ENABLED_APPS);
    assert_eq!(next(&mut stream).await?.len(), 1);

    service.reset_all().await?;
    assert!(next(&mut stream).await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_observer_converges_on_latest_value() -> Result<()> {
    let service = SettingsService::in_memory();
    let mut stream = service.observe(&ENABLED_APPS);
    assert!(next(&mut stream).await?.is_empty());

    for index in 0..20 {
        service
            .toggle_membership(&ENABLED_APPS, format!("com.example.app{index}"), true)
            .await?;
    }

    let mut latest = next(&mut stream).await?;
    while latest.len() < 20 {
        latest = next(&mut stream).await?;
    }
    assert_eq!(latest, service.read(&ENABLED_APPS));
    assert_quiet(&mut stream).await;
    Ok(())
}
