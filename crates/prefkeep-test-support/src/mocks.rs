//! Fault-injecting persistence backends.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use prefkeep_store::{Persistence, Snapshot, StoreError, StoreResult, StoredValue};

/// In-memory backend whose persists can be made to fail on demand.
#[derive(Debug, Default)]
pub struct FlakyBackend {
    failing: AtomicBool,
    persists: AtomicUsize,
    persisted: Mutex<BTreeMap<String, StoredValue>>,
}

impl FlakyBackend {
    /// Backend that succeeds until told otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent persists fail (`true`) or succeed (`false`).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of persists that succeeded.
    #[must_use]
    pub fn persist_count(&self) -> usize {
        self.persists.load(Ordering::SeqCst)
    }

    /// Entries from the last successful persist.
    #[must_use]
    pub fn persisted(&self) -> BTreeMap<String, StoredValue> {
        self.persisted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Persistence for FlakyBackend {
    async fn load(&self) -> StoreResult<BTreeMap<String, StoredValue>> {
        Ok(self.persisted())
    }

    async fn persist(&self, snapshot: &Snapshot) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                operation: "persist",
                reason: "injected",
            });
        }
        *self
            .persisted
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = snapshot.entries().clone();
        self.persists.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn label(&self) -> &'static str {
        "flaky"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failing_backend_keeps_last_good_state() {
        let backend = FlakyBackend::new();
        let first = Snapshot::empty().with("flag", StoredValue::Boolean(true));
        assert!(backend.persist(&first).await.is_ok());

        backend.set_failing(true);
        let second = first.with("flag", StoredValue::Boolean(false));
        assert!(matches!(
            backend.persist(&second).await,
            Err(StoreError::Unavailable { .. })
        ));
        assert_eq!(backend.persist_count(), 1);
        assert_eq!(
            backend.persisted().get("flag"),
            Some(&StoredValue::Boolean(true))
        );
    }
}
