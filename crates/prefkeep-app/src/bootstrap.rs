use std::collections::BTreeSet;
use std::future::Future;

use prefkeep_settings::catalog::API_KEY;
use prefkeep_settings::{SettingStream, SettingsFacade, SettingsService};
use prefkeep_store::{StoreConfig, StoredValue};
use prefkeep_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::info;

use crate::error::{AppError, AppResult};

/// Environment variable selecting the log filter directive.
pub const LOG_LEVEL_ENV: &str = "PREFKEEP_LOG_LEVEL";
/// Environment variable selecting `json` or `pretty` log output.
pub const LOG_FORMAT_ENV: &str = "PREFKEEP_LOG_FORMAT";
/// Environment flag that reports the settings and exits instead of watching.
pub const REPORT_ONLY_ENV: &str = "PREFKEEP_REPORT_ONLY";

const REDACTED: &str = "<redacted>";

/// Everything the binary reads from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Location of the settings document.
    pub store: StoreConfig,
    /// Subscriber configuration.
    pub logging: LoggingConfig,
    /// Report the settings once and exit.
    pub report_only: bool,
}

impl AppConfig {
    /// Load the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage location or log format is invalid.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store =
            StoreConfig::from_lookup(&lookup).map_err(|err| AppError::store("store_config", err))?;

        let level = lookup(LOG_LEVEL_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let format = match lookup(LOG_FORMAT_ENV).filter(|value| !value.trim().is_empty()) {
            Some(value) => value
                .parse::<LogFormat>()
                .map_err(|err| AppError::telemetry("log_format", err))?,
            None => LogFormat::infer(),
        };

        Ok(Self {
            store,
            logging: LoggingConfig { level, format },
            report_only: env_flag_value(lookup(REPORT_ONLY_ENV).as_deref()),
        })
    }
}

/// Entrypoint used by the binary: configure logging, open the store, and
/// report changes until Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration, logging, or the store cannot be set up.
pub async fn run_app() -> AppResult<()> {
    let config = AppConfig::from_env()?;
    init_logging(&config.logging).map_err(|err| AppError::telemetry("telemetry.init", err))?;
    info!(
        path = %config.store.file_path().display(),
        format = %config.logging.format,
        "Prefkeep bootstrap starting"
    );

    if config.report_only {
        return serve(&config.store, async { Ok(()) }).await;
    }
    serve(&config.store, async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|err| AppError::io("signal.ctrl_c", err))
    })
    .await
}

/// Open the store at `store`, log every setting, and log changes until
/// `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or `shutdown` fails.
pub async fn serve<F>(store: &StoreConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>> + Send,
{
    let service = SettingsService::open(store)
        .await
        .map_err(|err| AppError::settings("settings.open", err))?;
    report_settings(&service);

    let watchers = spawn_change_loggers(&service);
    let outcome = shutdown.await;
    for watcher in &watchers {
        watcher.abort();
    }
    info!("Prefkeep shutting down");
    outcome
}

fn report_settings(service: &SettingsService) {
    for entry in service.entries() {
        let value = if entry.name == API_KEY.name() {
            redact_stored(&entry.value)
        } else {
            render_stored(&entry.value)
        };
        info!(
            setting = entry.name,
            kind = %entry.kind,
            configured = entry.configured,
            value = %value,
            "setting loaded"
        );
    }
}

fn spawn_change_loggers(service: &SettingsService) -> Vec<JoinHandle<()>> {
    vec![
        log_changes("api_key", service.observe_api_key(), |key| {
            redact(key).to_string()
        }),
        log_changes("base_url", service.observe_base_url(), Clone::clone),
        log_changes("model_name", service.observe_model_name(), Clone::clone),
        log_changes(
            "floating_window_enabled",
            service.observe_floating_window_enabled(),
            ToString::to_string,
        ),
        log_changes(
            "input_mode",
            service.observe_input_mode(),
            ToString::to_string,
        ),
        log_changes(
            "image_compression_enabled",
            service.observe_image_compression_enabled(),
            ToString::to_string,
        ),
        log_changes(
            "image_compression_level",
            service.observe_image_compression_level(),
            ToString::to_string,
        ),
        log_changes(
            "enabled_apps",
            service.observe_enabled_apps(),
            render_set,
        ),
    ]
}

fn log_changes<T, R>(
    setting: &'static str,
    mut stream: SettingStream<T>,
    render: R,
) -> JoinHandle<()>
where
    T: Send + 'static,
    R: Fn(&T) -> String + Send + 'static,
{
    tokio::spawn(async move {
        // The first item is the value already reported at startup.
        if stream.next().await.is_none() {
            return;
        }
        while let Some(value) = stream.next().await {
            info!(setting, value = %render(&value), "setting changed");
        }
    })
}

fn render_stored(value: &StoredValue) -> String {
    match value {
        StoredValue::String(text) => text.clone(),
        StoredValue::Boolean(flag) => flag.to_string(),
        StoredValue::Integer(number) => number.to_string(),
        StoredValue::StringSet(members) => render_set(members),
    }
}

fn redact_stored(value: &StoredValue) -> String {
    match value {
        StoredValue::String(text) => redact(text).to_string(),
        other => render_stored(other),
    }
}

fn render_set(members: &BTreeSet<String>) -> String {
    format!(
        "[{}]",
        members
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    )
}

const fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { REDACTED }
}

fn env_flag_value(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn env_flag_handles_truthy_and_falsey() {
        assert!(env_flag_value(Some("TrUe")));
        assert!(env_flag_value(Some(" 1 ")));
        assert!(!env_flag_value(Some("no")));
        assert!(!env_flag_value(None));
    }

    #[test]
    fn config_reads_every_variable() -> AppResult<()> {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PREFKEEP_DATA_DIR", "/var/lib/prefkeep"),
            ("PREFKEEP_NAMESPACE", "agent"),
            (LOG_LEVEL_ENV, "prefkeep_settings=debug"),
            (LOG_FORMAT_ENV, "json"),
            (REPORT_ONLY_ENV, "yes"),
        ]))?;

        assert_eq!(
            config.store.file_path(),
            PathBuf::from("/var/lib/prefkeep/agent.json")
        );
        assert_eq!(config.logging.level, "prefkeep_settings=debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.report_only);
        Ok(())
    }

    #[test]
    fn config_defaults_logging_when_unset() -> AppResult<()> {
        let config =
            AppConfig::from_lookup(lookup_from(&[("PREFKEEP_DATA_DIR", "/tmp/prefkeep")]))?;
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.logging.format, LogFormat::infer());
        assert!(!config.report_only);
        Ok(())
    }

    #[test]
    fn config_rejects_unknown_log_format() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("PREFKEEP_DATA_DIR", "/tmp/prefkeep"),
            (LOG_FORMAT_ENV, "xml"),
        ]));
        assert!(matches!(
            result,
            Err(AppError::Telemetry {
                operation: "log_format",
                ..
            })
        ));
    }

    #[test]
    fn api_key_is_never_rendered() {
        assert_eq!(
            redact_stored(&StoredValue::String("sk-secret".into())),
            REDACTED
        );
        assert_eq!(redact_stored(&StoredValue::String(String::new())), "<unset>");
        assert_eq!(render_stored(&StoredValue::Integer(50)), "50");
    }

    #[test]
    fn sets_render_in_order() {
        let members: BTreeSet<String> = ["b", "a"].into_iter().map(str::to_string).collect();
        assert_eq!(render_set(&members), "[a, b]");
        assert_eq!(render_set(&BTreeSet::new()), "[]");
    }
}
