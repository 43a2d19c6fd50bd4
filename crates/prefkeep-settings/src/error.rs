//! Error types for settings operations.

use prefkeep_store::{StoreError, ValueKind};
use thiserror::Error;

/// Key reported by a [`SettingsError::PersistenceFailure`] from a write that
/// covers every setting at once.
pub const ALL_SETTINGS: &str = "*";

/// Primary error type for settings operations.
///
/// Type mismatches in stored data and unknown enum integers are never
/// reported here; reads resolve them to the declared default.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The snapshot store could not durably commit a write.
    #[error("failed to persist setting")]
    PersistenceFailure {
        /// Setting whose write failed, or [`ALL_SETTINGS`] for a reset of
        /// every setting.
        key: &'static str,
        /// Source store error.
        source: StoreError,
    },
    /// A store operation outside a single-key write failed.
    #[error("settings store operation failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Source store error.
        source: StoreError,
    },
    /// The key is not part of the registry backing the service.
    #[error("unknown setting key")]
    UnknownKey {
        /// Name of the unregistered key.
        name: String,
    },
    /// A typed key disagreed with the registered value kind.
    #[error("setting kind mismatch")]
    KindMismatch {
        /// Name of the setting.
        name: &'static str,
        /// Kind recorded in the registry.
        declared: ValueKind,
        /// Kind carried by the key used for the call.
        requested: ValueKind,
    },
    /// The key's validator rejected the value.
    #[error("invalid setting value")]
    InvalidValue {
        /// Name of the setting.
        name: &'static str,
        /// Machine-readable reason for the rejection.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// Input mode text did not name a known mode.
    #[error("invalid input mode")]
    InvalidInputMode {
        /// Input mode payload provided by the caller.
        value: String,
    },
}

impl SettingsError {
    pub(crate) const fn persistence(key: &'static str, source: StoreError) -> Self {
        Self::PersistenceFailure { key, source }
    }

    pub(crate) const fn store(operation: &'static str, source: StoreError) -> Self {
        Self::Store { operation, source }
    }
}

/// Convenience alias for settings results.
pub type SettingsResult<T> = Result<T, SettingsError>;
