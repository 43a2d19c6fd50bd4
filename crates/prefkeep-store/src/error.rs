//! # Design
//!
//! - Structured, constant-message errors for snapshot persistence.
//! - Carry the operation and path so failures are reproducible in tests.
//! - Preserve source errors without interpolating them into messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for snapshot store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors produced by the snapshot store and its persistence backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO failures while reading or writing the backing file.
    #[error("store io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// JSON encoding or decoding failures for the backing file.
    #[error("store json failure")]
    Json {
        /// Operation that triggered the JSON failure.
        operation: &'static str,
        /// Path involved in the JSON failure.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The backend refused the operation without an IO cause.
    #[error("store backend unavailable")]
    Unavailable {
        /// Operation that was refused.
        operation: &'static str,
        /// Machine-readable reason for the refusal.
        reason: &'static str,
    },
    /// Storage location configuration was invalid.
    #[error("invalid store configuration")]
    InvalidConfig {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: serde_json::Error,
    ) -> Self {
        Self::Json {
            operation,
            path: path.into(),
            source,
        }
    }
}
