//! Named accessors for every catalog setting.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::broadcast::SettingStream;
use crate::catalog::{
    API_KEY, BASE_URL, ENABLED_APPS, FLOATING_WINDOW_ENABLED, IMAGE_COMPRESSION_ENABLED,
    IMAGE_COMPRESSION_LEVEL, INPUT_MODE, MODEL_NAME,
};
use crate::error::SettingsResult;
use crate::input_mode::InputMode;
use crate::service::SettingsService;

/// Typed surface over the application settings.
///
/// Getters never fail; setters return an error only when the value is
/// rejected or cannot be persisted.
#[async_trait]
pub trait SettingsFacade: Send + Sync {
    /// Model API key; empty when unset.
    fn api_key(&self) -> String;
    /// Store the model API key.
    async fn set_api_key(&self, api_key: String) -> SettingsResult<()>;
    /// Observe the model API key.
    fn observe_api_key(&self) -> SettingStream<String>;

    /// Model endpoint base URL.
    fn base_url(&self) -> String;
    /// Store the model endpoint base URL.
    async fn set_base_url(&self, base_url: String) -> SettingsResult<()>;
    /// Observe the model endpoint base URL.
    fn observe_base_url(&self) -> SettingStream<String>;

    /// Model identifier.
    fn model_name(&self) -> String;
    /// Store the model identifier.
    async fn set_model_name(&self, model_name: String) -> SettingsResult<()>;
    /// Observe the model identifier.
    fn observe_model_name(&self) -> SettingStream<String>;

    /// Whether the floating window is enabled.
    fn floating_window_enabled(&self) -> bool;
    /// Enable or disable the floating window.
    async fn set_floating_window_enabled(&self, enabled: bool) -> SettingsResult<()>;
    /// Observe the floating window flag.
    fn observe_floating_window_enabled(&self) -> SettingStream<bool>;

    /// Text input strategy.
    fn input_mode(&self) -> InputMode;
    /// Store the text input strategy.
    async fn set_input_mode(&self, mode: InputMode) -> SettingsResult<()>;
    /// Observe the text input strategy.
    fn observe_input_mode(&self) -> SettingStream<InputMode>;

    /// Whether screenshots are compressed.
    fn image_compression_enabled(&self) -> bool;
    /// Enable or disable screenshot compression.
    async fn set_image_compression_enabled(&self, enabled: bool) -> SettingsResult<()>;
    /// Observe the screenshot compression flag.
    fn observe_image_compression_enabled(&self) -> SettingStream<bool>;

    /// Screenshot compression level.
    fn image_compression_level(&self) -> i32;
    /// Store the screenshot compression level (0 to 100).
    async fn set_image_compression_level(&self, level: i32) -> SettingsResult<()>;
    /// Observe the screenshot compression level.
    fn observe_image_compression_level(&self) -> SettingStream<i32>;

    /// Applications the agent may operate.
    fn enabled_apps(&self) -> BTreeSet<String>;
    /// Replace the set of enabled applications.
    async fn set_enabled_apps(&self, packages: BTreeSet<String>) -> SettingsResult<()>;
    /// Enable or disable a single application.
    async fn toggle_app_enabled(&self, package: String, enabled: bool) -> SettingsResult<()>;
    /// Whether `package` is currently enabled.
    fn is_app_enabled(&self, package: &str) -> bool;
    /// Observe the set of enabled applications.
    fn observe_enabled_apps(&self) -> SettingStream<BTreeSet<String>>;
}

#[async_trait]
impl SettingsFacade for SettingsService {
    fn api_key(&self) -> String {
        self.read(&API_KEY)
    }

    async fn set_api_key(&self, api_key: String) -> SettingsResult<()> {
        self.write(&API_KEY, api_key).await
    }

    fn observe_api_key(&self) -> SettingStream<String> {
        self.observe(&API_KEY)
    }

    fn base_url(&self) -> String {
        self.read(&BASE_URL)
    }

    async fn set_base_url(&self, base_url: String) -> SettingsResult<()> {
        self.write(&BASE_URL, base_url).await
    }

    fn observe_base_url(&self) -> SettingStream<String> {
        self.observe(&BASE_URL)
    }

    fn model_name(&self) -> String {
        self.read(&MODEL_NAME)
    }

    async fn set_model_name(&self, model_name: String) -> SettingsResult<()> {
        self.write(&MODEL_NAME, model_name).await
    }

    fn observe_model_name(&self) -> SettingStream<String> {
        self.observe(&MODEL_NAME)
    }

    fn floating_window_enabled(&self) -> bool {
        self.read(&FLOATING_WINDOW_ENABLED)
    }

    async fn set_floating_window_enabled(&self, enabled: bool) -> SettingsResult<()> {
        self.write(&FLOATING_WINDOW_ENABLED, enabled).await
    }

    fn observe_floating_window_enabled(&self) -> SettingStream<bool> {
        self.observe(&FLOATING_WINDOW_ENABLED)
    }

    fn input_mode(&self) -> InputMode {
        self.read(&INPUT_MODE)
    }

    async fn set_input_mode(&self, mode: InputMode) -> SettingsResult<()> {
        self.write(&INPUT_MODE, mode).await
    }

    fn observe_input_mode(&self) -> SettingStream<InputMode> {
        self.observe(&INPUT_MODE)
    }

    fn image_compression_enabled(&self) -> bool {
        self.read(&IMAGE_COMPRESSION_ENABLED)
    }

    async fn set_image_compression_enabled(&self, enabled: bool) -> SettingsResult<()> {
        self.write(&IMAGE_COMPRESSION_ENABLED, enabled).await
    }

    fn observe_image_compression_enabled(&self) -> SettingStream<bool> {
        self.observe(&IMAGE_COMPRESSION_ENABLED)
    }

    fn image_compression_level(&self) -> i32 {
        self.read(&IMAGE_COMPRESSION_LEVEL)
    }

    async fn set_image_compression_level(&self, level: i32) -> SettingsResult<()> {
        self.write(&IMAGE_COMPRESSION_LEVEL, level).await
    }

    fn observe_image_compression_level(&self) -> SettingStream<i32> {
        self.observe(&IMAGE_COMPRESSION_LEVEL)
    }

    fn enabled_apps(&self) -> BTreeSet<String> {
        self.read(&ENABLED_APPS)
    }

    async fn set_enabled_apps(&self, packages: BTreeSet<String>) -> SettingsResult<()> {
        self.write(&ENABLED_APPS, packages).await
    }

    async fn toggle_app_enabled(&self, package: String, enabled: bool) -> SettingsResult<()> {
        self.toggle_membership(&ENABLED_APPS, package, enabled).await
    }

    fn is_app_enabled(&self, package: &str) -> bool {
        self.contains_member(&ENABLED_APPS, package)
    }

    fn observe_enabled_apps(&self) -> SettingStream<BTreeSet<String>> {
        self.observe(&ENABLED_APPS)
    }
}
