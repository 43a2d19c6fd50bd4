//! Registry of declared settings.
//!
//! Pure lookup data. Registering the same name twice is a programming error
//! and panics while the registry is being built.

use std::collections::HashMap;

use crate::key::{KeyDescriptor, SettingKey, SettingValue};

/// Declared settings in declaration order, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    keys: Vec<KeyDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl KeyRegistry {
    /// Start an empty registry builder.
    #[must_use]
    pub fn builder() -> KeyRegistryBuilder {
        KeyRegistryBuilder::default()
    }

    /// Descriptor registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&KeyDescriptor> {
        self.index.get(name).map(|&position| &self.keys[position])
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyDescriptor> {
        self.keys.iter()
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Builder enforcing unique key names.
#[derive(Debug, Default)]
pub struct KeyRegistryBuilder {
    registry: KeyRegistry,
}

impl KeyRegistryBuilder {
    /// Register `key`.
    ///
    /// # Panics
    ///
    /// Panics if a key with the same name was already registered.
    #[must_use]
    pub fn register<T: SettingValue>(mut self, key: &SettingKey<T>) -> Self {
        let descriptor = key.descriptor();
        assert!(
            !self.registry.contains(descriptor.name),
            "setting key '{}' registered twice",
            descriptor.name
        );
        self.registry
            .index
            .insert(descriptor.name, self.registry.keys.len());
        self.registry.keys.push(descriptor);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> KeyRegistry {
        self.registry
    }
}
