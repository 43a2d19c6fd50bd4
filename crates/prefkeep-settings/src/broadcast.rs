//! Per-key fan-out of snapshot changes.
//!
//! # Design
//! - A single task follows the store's snapshot channel and forwards each new
//!   snapshot to one `watch` channel per observed key.
//! - Channel slots carry the snapshot revision; a slot only moves forward, so
//!   a delayed fan-out can never replay an older value.
//! - Observer streams start with the value at subscription time and then
//!   yield only when the resolved value changes. Intermediate values may be
//!   coalesced for slow consumers; the latest value is always delivered.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use prefkeep_store::{Snapshot, SnapshotStore, StoredValue};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::key::{SettingKey, SettingValue};
use crate::resolve::resolve_entry;

/// Infinite stream of resolved values for one setting. Dropping it cancels
/// the subscription.
pub type SettingStream<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

type Channels = Mutex<HashMap<&'static str, watch::Sender<Slot>>>;

#[derive(Debug, Clone, Default)]
struct Slot {
    revision: u64,
    value: Option<StoredValue>,
}

impl Slot {
    fn at(snapshot: &Snapshot, name: &str) -> Self {
        Self {
            revision: snapshot.revision(),
            value: snapshot.get(name).cloned(),
        }
    }

    /// Move the slot to `snapshot`; returns whether the stored entry changed.
    fn advance(&mut self, snapshot: &Snapshot, name: &str) -> bool {
        if snapshot.revision() <= self.revision {
            return false;
        }
        self.revision = snapshot.revision();
        let value = snapshot.get(name);
        if self.value.as_ref() == value {
            return false;
        }
        self.value = value.cloned();
        true
    }
}

/// Fans snapshot-level changes out to per-key observers.
pub struct Broadcaster {
    channels: Arc<Channels>,
    task: JoinHandle<()>,
}

impl Broadcaster {
    /// Subscribe once to `store` and start forwarding its snapshots.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(store: &dyn SnapshotStore) -> Self {
        let channels: Arc<Channels> = Arc::default();
        let mut snapshots = store.subscribe();
        let fanout = Arc::clone(&channels);

        let task = tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let snapshot = Arc::clone(&*snapshots.borrow_and_update());
                publish(&fanout, &snapshot);
            }
            debug!("snapshot channel closed; broadcaster stopped");
        });

        Self { channels, task }
    }

    /// Observe `key`, starting from its value in `store` right now.
    #[must_use]
    pub fn observe<T: SettingValue>(
        &self,
        store: &dyn SnapshotStore,
        key: &SettingKey<T>,
    ) -> SettingStream<T> {
        let key = *key;
        let mut receiver = {
            let current = store.current();
            let mut channels = lock(&self.channels);
            let sender = channels
                .entry(key.name())
                .or_insert_with(|| watch::channel(Slot::at(&current, key.name())).0);
            sender.send_if_modified(|slot| slot.advance(&current, key.name()));
            sender.subscribe()
        };

        let initial = resolve_entry(receiver.borrow_and_update().value.as_ref(), &key);
        let changes = WatchStream::from_changes(receiver)
            .map(move |slot| resolve_entry(slot.value.as_ref(), &key));

        let mut last: Option<T> = None;
        let stream = tokio_stream::once(initial)
            .chain(changes)
            .filter_map(move |value| {
                if last.as_ref() == Some(&value) {
                    return None;
                }
                last = Some(value.clone());
                Some(value)
            });

        Box::pin(stream)
    }

    #[cfg(test)]
    fn channel_count(&self) -> usize {
        lock(&self.channels).len()
    }
}

impl Drop for Broadcaster {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn publish(channels: &Channels, snapshot: &Snapshot) {
    let mut channels = lock(channels);
    channels.retain(|_, sender| sender.receiver_count() > 0);

    let mut notified = 0_usize;
    for (name, sender) in channels.iter() {
        if sender.send_if_modified(|slot| slot.advance(snapshot, name)) {
            notified += 1;
        }
    }
    debug!(
        revision = snapshot.revision(),
        observed_keys = channels.len(),
        notified,
        "fanned out snapshot"
    );
}

fn lock(channels: &Channels) -> MutexGuard<'_, HashMap<&'static str, watch::Sender<Slot>>> {
    channels.lock().unwrap_or_else(PoisonError::into_inner)
}
