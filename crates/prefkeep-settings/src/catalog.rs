//! Settings declared by the application.
//!
//! # Design
//! - One `const` key per setting; names are the persisted identifiers and must
//!   never change.
//! - `registry()` lists every key exactly once and is built on first use.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;

use crate::input_mode::InputMode;
use crate::key::SettingKey;
use crate::registry::KeyRegistry;

/// Model endpoint used until the user configures one.
pub const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";
/// Model identifier used until the user configures one.
pub const DEFAULT_MODEL_NAME: &str = "autoglm-phone";
/// Screenshot compression level used until the user configures one.
pub const DEFAULT_IMAGE_COMPRESSION_LEVEL: i32 = 50;

/// API key for the model endpoint; empty when unset.
pub const API_KEY: SettingKey<String> = SettingKey::new("api_key", String::new);
/// Base URL of the model endpoint.
pub const BASE_URL: SettingKey<String> = SettingKey::new("base_url", default_base_url);
/// Model identifier sent with each request.
pub const MODEL_NAME: SettingKey<String> = SettingKey::new("model_name", default_model_name);
/// Whether the floating control window is shown.
pub const FLOATING_WINDOW_ENABLED: SettingKey<bool> =
    SettingKey::new("floating_window_enabled", disabled);
/// Strategy used to type text into the device.
pub const INPUT_MODE: SettingKey<InputMode> = SettingKey::new("input_mode", InputMode::default);
/// Whether screenshots are compressed before upload.
pub const IMAGE_COMPRESSION_ENABLED: SettingKey<bool> =
    SettingKey::new("image_compression_enabled", disabled);
/// Screenshot compression level, 0 to 100.
pub const IMAGE_COMPRESSION_LEVEL: SettingKey<i32> = SettingKey::validated(
    "image_compression_level",
    default_image_compression_level,
    percentage,
);
/// Package identifiers of the applications the agent may operate.
pub const ENABLED_APPS: SettingKey<BTreeSet<String>> =
    SettingKey::new("enabled_apps", BTreeSet::new);

static REGISTRY: Lazy<KeyRegistry> = Lazy::new(|| {
    KeyRegistry::builder()
        .register(&API_KEY)
        .register(&BASE_URL)
        .register(&MODEL_NAME)
        .register(&FLOATING_WINDOW_ENABLED)
        .register(&INPUT_MODE)
        .register(&IMAGE_COMPRESSION_ENABLED)
        .register(&IMAGE_COMPRESSION_LEVEL)
        .register(&ENABLED_APPS)
        .build()
});

/// Registry of every declared setting.
#[must_use]
pub fn registry() -> &'static KeyRegistry {
    &REGISTRY
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

const fn disabled() -> bool {
    false
}

const fn default_image_compression_level() -> i32 {
    DEFAULT_IMAGE_COMPRESSION_LEVEL
}

fn percentage(level: &i32) -> Result<(), &'static str> {
    if (0..=100).contains(level) {
        Ok(())
    } else {
        Err("out_of_range")
    }
}
