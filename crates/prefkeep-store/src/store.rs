//! Snapshot store: lock-free reads, serialized commits, change publication.
//!
//! # Design
//! - The current snapshot lives in a `tokio::sync::watch` channel as an
//!   `Arc<Snapshot>`; readers clone the `Arc` and never wait on a commit.
//! - Commits are serialized by an async mutex. The mutator always sees the
//!   snapshot it is committed against, so read-modify-write updates compose.
//! - A snapshot is persisted before it is published. A failed persist
//!   publishes nothing and leaves the previous snapshot authoritative.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::backend::{MemoryBackend, Persistence};
use crate::error::StoreResult;
use crate::snapshot::Snapshot;

/// Function deriving the next snapshot from the one being committed against.
pub type Mutator = Box<dyn FnOnce(&Snapshot) -> Snapshot + Send>;

/// Stream of published snapshots: the current one first, then the latest
/// after each commit. Slow consumers skip intermediate snapshots.
pub type SnapshotStream = WatchStream<Arc<Snapshot>>;

/// Interface of the snapshot store consumed by the settings layer.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// The snapshot current at the time of the call.
    fn current(&self) -> Arc<Snapshot>;

    /// Apply `mutator` to the current snapshot, persist the result, and
    /// publish it.
    async fn commit(&self, mutator: Mutator) -> StoreResult<Arc<Snapshot>>;

    /// Receiver observing every published snapshot.
    fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>>;

    /// Stream view over [`SnapshotStore::subscribe`].
    fn changes(&self) -> SnapshotStream {
        WatchStream::new(self.subscribe())
    }
}

/// Snapshot store publishing through a `watch` channel.
pub struct WatchedStore {
    sender: watch::Sender<Arc<Snapshot>>,
    commit_lock: Mutex<()>,
    backend: Arc<dyn Persistence>,
}

impl WatchedStore {
    /// Open a store whose first snapshot is whatever `backend` has persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot load its persisted state.
    pub async fn open(backend: Arc<dyn Persistence>) -> StoreResult<Self> {
        let entries = backend.load().await?;
        info!(
            backend = backend.label(),
            entries = entries.len(),
            "snapshot store opened"
        );
        Ok(Self::with_snapshot(backend, Snapshot::from_entries(entries)))
    }

    /// Store over `backend` starting from `snapshot`, without loading.
    #[must_use]
    pub fn with_snapshot(backend: Arc<dyn Persistence>, snapshot: Snapshot) -> Self {
        let (sender, _) = watch::channel(Arc::new(snapshot));
        Self {
            sender,
            commit_lock: Mutex::new(()),
            backend,
        }
    }

    /// Empty store that keeps nothing beyond the process lifetime.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_snapshot(Arc::new(MemoryBackend::new()), Snapshot::empty())
    }
}

#[async_trait]
impl SnapshotStore for WatchedStore {
    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.sender.borrow())
    }

    async fn commit(&self, mutator: Mutator) -> StoreResult<Arc<Snapshot>> {
        let _guard = self.commit_lock.lock().await;

        let current = self.current();
        let next = mutator(current.as_ref());
        if next.same_entries(&current) {
            debug!(revision = current.revision(), "commit left entries unchanged");
            return Ok(current);
        }

        let next = Arc::new(next.with_revision(current.revision() + 1));
        if let Err(err) = self.backend.persist(&next).await {
            warn!(
                backend = self.backend.label(),
                revision = next.revision(),
                error = ?err,
                "snapshot persist failed; keeping previous snapshot"
            );
            return Err(err);
        }

        self.sender.send_replace(Arc::clone(&next));
        debug!(revision = next.revision(), entries = next.len(), "snapshot committed");
        Ok(next)
    }

    fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.sender.subscribe()
    }
}
