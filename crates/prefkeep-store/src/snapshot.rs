//! Immutable point-in-time view of every stored setting.
//!
//! # Design
//! - A snapshot is never mutated once published; builders return new values.
//! - `revision` is assigned by the store on commit and only grows within a
//!   process, which lets fan-out code discard stale deliveries.

use std::collections::BTreeMap;

use crate::value::StoredValue;

/// Immutable mapping from setting name to stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    revision: u64,
    entries: BTreeMap<String, StoredValue>,
}

impl Snapshot {
    /// Snapshot with no entries at revision zero.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot seeded with the provided entries at revision zero.
    #[must_use]
    pub const fn from_entries(entries: BTreeMap<String, StoredValue>) -> Self {
        Self {
            revision: 0,
            entries,
        }
    }

    /// Commit counter of this snapshot.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Stored value for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StoredValue> {
        self.entries.get(name)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow the underlying entries in name order.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, StoredValue> {
        &self.entries
    }

    /// Copy of this snapshot with `name` set to `value`.
    #[must_use]
    pub fn with(&self, name: impl Into<String>, value: StoredValue) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(name.into(), value);
        Self {
            revision: self.revision,
            entries,
        }
    }

    /// Copy of this snapshot with `name` removed.
    #[must_use]
    pub fn without(&self, name: &str) -> Self {
        if !self.entries.contains_key(name) {
            return self.clone();
        }
        let mut entries = self.entries.clone();
        entries.remove(name);
        Self {
            revision: self.revision,
            entries,
        }
    }

    /// Copy of this snapshot with every entry removed.
    #[must_use]
    pub const fn cleared(&self) -> Self {
        Self {
            revision: self.revision,
            entries: BTreeMap::new(),
        }
    }

    /// Whether both snapshots hold the same entries, ignoring revisions.
    #[must_use]
    pub fn same_entries(&self, other: &Self) -> bool {
        self.entries == other.entries
    }

    pub(crate) fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }
}
