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

//! Typed, observable settings over the Prefkeep snapshot store.
//!
//! Layout: `key.rs` (typed keys), `registry.rs` and `catalog.rs` (declared
//! settings), `resolve.rs` (default fallback), `broadcast.rs` (per-key
//! observation), `service.rs` (repository operations), `facade.rs` (named
//! accessors), `input_mode.rs`, `error.rs`.

pub mod broadcast;
pub mod catalog;
pub mod error;
pub mod facade;
pub mod input_mode;
pub mod key;
pub mod registry;
pub mod resolve;
pub mod service;

pub use broadcast::{Broadcaster, SettingStream};
pub use error::{ALL_SETTINGS, SettingsError, SettingsResult};
pub use facade::SettingsFacade;
pub use input_mode::InputMode;
pub use key::{KeyDescriptor, SettingKey, SettingValue, Validator};
pub use registry::{KeyRegistry, KeyRegistryBuilder};
pub use resolve::resolve;
pub use service::{SettingEntry, SettingsService};
