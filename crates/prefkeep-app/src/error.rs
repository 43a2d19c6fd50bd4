//! # Design
//!
//! - Centralize application-level errors for bootstrap.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Settings service operations failed.
    #[error("settings operation failed")]
    Settings {
        /// Operation identifier.
        operation: &'static str,
        /// Source settings error.
        source: prefkeep_settings::SettingsError,
    },
    /// Storage configuration could not be resolved.
    #[error("store configuration failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Source store error.
        source: prefkeep_store::StoreError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: prefkeep_telemetry::TelemetryError,
    },
    /// IO operations failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) const fn settings(
        operation: &'static str,
        source: prefkeep_settings::SettingsError,
    ) -> Self {
        Self::Settings { operation, source }
    }

    pub(crate) const fn store(operation: &'static str, source: prefkeep_store::StoreError) -> Self {
        Self::Store { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: prefkeep_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn io(operation: &'static str, source: io::Error) -> Self {
        Self::Io { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn app_error_helpers_build_variants() {
        let settings = AppError::settings(
            "open",
            prefkeep_settings::SettingsError::InvalidInputMode {
                value: "typing".to_string(),
            },
        );
        assert!(matches!(settings, AppError::Settings { operation: "open", .. }));
        assert_eq!(settings.to_string(), "settings operation failed");
        assert!(settings.source().is_some());

        let store = AppError::store(
            "store_config",
            prefkeep_store::StoreError::InvalidConfig {
                field: "namespace",
                reason: "empty",
                value: None,
            },
        );
        assert!(matches!(store, AppError::Store { .. }));

        let telemetry = AppError::telemetry(
            "log_format",
            prefkeep_telemetry::TelemetryError::UnknownLogFormat {
                value: "xml".to_string(),
            },
        );
        assert_eq!(telemetry.to_string(), "telemetry operation failed");

        let signal = AppError::io("ctrl_c", io::Error::other("signal"));
        assert!(matches!(signal, AppError::Io { .. }));
        assert!(signal.source().is_some());
    }
}
