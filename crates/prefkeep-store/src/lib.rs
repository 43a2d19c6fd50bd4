#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Snapshot store underpinning the Prefkeep settings repository.
//!
//! Layout: `value.rs` (untyped stored values), `snapshot.rs` (immutable
//! snapshots), `backend.rs` (persistence backends), `store.rs` (commit and
//! publication), `config.rs` (storage location), `error.rs`.

pub mod backend;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod store;
pub mod value;

pub use backend::{JsonFileBackend, MemoryBackend, Persistence};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use snapshot::Snapshot;
pub use store::{Mutator, SnapshotStore, SnapshotStream, WatchedStore};
pub use value::{StoredValue, ValueKind};
