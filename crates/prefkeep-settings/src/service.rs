//! Settings service: typed reads, validated writes, and per-key observation.
//!
//! # Design
//! - Reads resolve against the store's current snapshot and never block on a
//!   commit in flight.
//! - Every write is a single store commit. Set membership updates compute the
//!   new set from the snapshot they are committed against, so concurrent
//!   toggles never lose an update.
//! - Writes are checked against the registry before anything is committed;
//!   reads stay total and fall back to defaults.

use std::collections::BTreeSet;
use std::sync::Arc;

use prefkeep_store::{
    JsonFileBackend, Mutator, Snapshot, SnapshotStore, StoreConfig, StoredValue, ValueKind,
    WatchedStore,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::broadcast::{Broadcaster, SettingStream};
use crate::catalog;
use crate::error::{ALL_SETTINGS, SettingsError, SettingsResult};
use crate::key::{SettingKey, SettingValue};
use crate::registry::KeyRegistry;
use crate::resolve::resolve;

/// Effective state of one registered setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingEntry {
    /// Stable storage name.
    pub name: &'static str,
    /// Stored kind.
    pub kind: ValueKind,
    /// Effective value: the stored entry when usable, otherwise the default.
    pub value: StoredValue,
    /// Whether a usable value was stored rather than defaulted.
    pub configured: bool,
}

struct ServiceInner {
    store: Arc<dyn SnapshotStore>,
    registry: KeyRegistry,
    broadcaster: Broadcaster,
}

/// Shared handle to the settings repository. Clones share one store.
#[derive(Clone)]
pub struct SettingsService {
    inner: Arc<ServiceInner>,
}

impl SettingsService {
    /// Service over `store` accepting writes for the keys in `registry`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(store: Arc<dyn SnapshotStore>, registry: KeyRegistry) -> Self {
        let broadcaster = Broadcaster::spawn(store.as_ref());
        Self {
            inner: Arc::new(ServiceInner {
                store,
                registry,
                broadcaster,
            }),
        }
    }

    /// Service over `store` using the application catalog.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn with_catalog(store: Arc<dyn SnapshotStore>) -> Self {
        Self::new(store, catalog::registry().clone())
    }

    /// Open the JSON-backed catalog service described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted settings cannot be read.
    pub async fn open(config: &StoreConfig) -> SettingsResult<Self> {
        let backend = JsonFileBackend::new(config.file_path());
        let store = WatchedStore::open(Arc::new(backend))
            .await
            .map_err(|source| SettingsError::store("open", source))?;
        info!(path = %config.file_path().display(), "settings service ready");
        Ok(Self::with_catalog(Arc::new(store)))
    }

    /// Catalog service that keeps nothing beyond the process lifetime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_catalog(Arc::new(WatchedStore::in_memory()))
    }

    /// Current value of `key`, or its default when unset or unreadable.
    #[must_use]
    pub fn read<T: SettingValue>(&self, key: &SettingKey<T>) -> T {
        resolve(&self.inner.store.current(), key)
    }

    /// Durably store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not registered, the validator rejects
    /// `value`, or the store fails to persist. On failure the previous value
    /// remains in effect.
    #[instrument(name = "settings.write", skip(self, key, value), fields(key = key.name()))]
    pub async fn write<T: SettingValue>(&self, key: &SettingKey<T>, value: T) -> SettingsResult<()> {
        self.ensure_registered(key)?;
        let stored = value.to_stored();
        key.validate(&value)
            .map_err(|reason| SettingsError::InvalidValue {
                name: key.name(),
                reason,
                value: Some(format!("{stored:?}")),
            })?;

        let name = key.name();
        self.commit(
            name,
            Box::new(move |snapshot: &Snapshot| snapshot.with(name, stored)),
        )
        .await
    }

    /// Add `member` to (or remove it from) the set stored under `key`.
    ///
    /// Adding a present member or removing an absent one commits nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not registered or the store fails to
    /// persist.
    #[instrument(
        name = "settings.toggle_membership",
        skip(self, key, member),
        fields(key = key.name())
    )]
    pub async fn toggle_membership(
        &self,
        key: &SettingKey<BTreeSet<String>>,
        member: impl Into<String> + Send,
        included: bool,
    ) -> SettingsResult<()> {
        self.ensure_registered(key)?;
        let key = *key;
        let member = member.into();
        debug!(member = %member, included, "updating set membership");

        self.commit(
            key.name(),
            Box::new(move |snapshot: &Snapshot| {
                let mut members = resolve(snapshot, &key);
                let changed = if included {
                    members.insert(member)
                } else {
                    members.remove(&member)
                };
                if changed {
                    snapshot.with(key.name(), members.to_stored())
                } else {
                    snapshot.clone()
                }
            }),
        )
        .await
    }

    /// Whether the set under `key` currently contains `member`.
    #[must_use]
    pub fn contains_member(&self, key: &SettingKey<BTreeSet<String>>, member: &str) -> bool {
        self.read(key).contains(member)
    }

    /// Remove the stored value of `key` so it reads as its default.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not registered or the store fails to
    /// persist.
    pub async fn reset<T: SettingValue>(&self, key: &SettingKey<T>) -> SettingsResult<()> {
        self.ensure_registered(key)?;
        let name = key.name();
        self.commit(
            name,
            Box::new(move |snapshot: &Snapshot| snapshot.without(name)),
        )
        .await
    }

    /// Remove every stored value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to persist the empty snapshot.
    pub async fn reset_all(&self) -> SettingsResult<()> {
        self.inner
            .store
            .commit(Box::new(Snapshot::cleared))
            .await
            .map_err(|source| SettingsError::persistence(ALL_SETTINGS, source))?;
        info!("settings reset to defaults");
        Ok(())
    }

    /// Stream of `key`'s value: the current value first, then each change.
    ///
    /// Writes that leave the value unchanged yield nothing. Dropping the
    /// stream ends the subscription.
    #[must_use]
    pub fn observe<T: SettingValue>(&self, key: &SettingKey<T>) -> SettingStream<T> {
        self.inner
            .broadcaster
            .observe(self.inner.store.as_ref(), key)
    }

    /// Effective state of every registered setting, in declaration order.
    #[must_use]
    pub fn entries(&self) -> Vec<SettingEntry> {
        let snapshot = self.inner.store.current();
        self.inner
            .registry
            .iter()
            .map(|descriptor| {
                let stored = snapshot
                    .get(descriptor.name)
                    .and_then(|value| descriptor.decode(value));
                SettingEntry {
                    name: descriptor.name,
                    kind: descriptor.kind,
                    configured: stored.is_some(),
                    value: stored.unwrap_or_else(|| descriptor.default.clone()),
                }
            })
            .collect()
    }

    /// The raw snapshot current at the time of the call.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.current()
    }

    /// Registry of keys this service accepts writes for.
    #[must_use]
    pub fn registry(&self) -> &KeyRegistry {
        &self.inner.registry
    }

    fn ensure_registered<T: SettingValue>(&self, key: &SettingKey<T>) -> SettingsResult<()> {
        let descriptor =
            self.inner
                .registry
                .get(key.name())
                .ok_or_else(|| SettingsError::UnknownKey {
                    name: key.name().to_string(),
                })?;
        if descriptor.kind != T::KIND {
            return Err(SettingsError::KindMismatch {
                name: key.name(),
                declared: descriptor.kind,
                requested: T::KIND,
            });
        }
        Ok(())
    }

    async fn commit(&self, key: &'static str, mutator: Mutator) -> SettingsResult<()> {
        let snapshot = self
            .inner
            .store
            .commit(mutator)
            .await
            .map_err(|source| SettingsError::persistence(key, source))?;
        debug!(key, revision = snapshot.revision(), "setting committed");
        Ok(())
    }
}
