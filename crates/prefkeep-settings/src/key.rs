//! Typed setting keys and the mapping between typed and stored values.
//!
//! # Design
//! - `SettingValue` is the only bridge between a Rust type and a
//!   `StoredValue`; decoding returns `None` on a type mismatch and the caller
//!   falls back to the key's default.
//! - Keys are `Copy` and `const`-constructible so the catalog can be a set of
//!   plain constants.

use std::collections::BTreeSet;
use std::fmt;

use prefkeep_store::{StoredValue, ValueKind};

/// Rust types that can be held by a setting.
pub trait SettingValue: Clone + PartialEq + Send + Sync + 'static {
    /// Stored kind backing this type.
    const KIND: ValueKind;

    /// Decode a stored value, returning `None` if it has the wrong shape.
    fn from_stored(value: &StoredValue) -> Option<Self>;

    /// Encode this value for storage.
    fn to_stored(&self) -> StoredValue;
}

impl SettingValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::String(text) => Some(text.clone()),
            _ => None,
        }
    }

    fn to_stored(&self) -> StoredValue {
        StoredValue::String(self.clone())
    }
}

impl SettingValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Boolean(flag) => Some(*flag),
            _ => None,
        }
    }

    fn to_stored(&self) -> StoredValue {
        StoredValue::Boolean(*self)
    }
}

impl SettingValue for i64 {
    const KIND: ValueKind = ValueKind::Integer;

    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Integer(number) => Some(*number),
            _ => None,
        }
    }

    fn to_stored(&self) -> StoredValue {
        StoredValue::Integer(*self)
    }
}

impl SettingValue for i32 {
    const KIND: ValueKind = ValueKind::Integer;

    // Integers outside the i32 range count as a type mismatch.
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Integer(number) => Self::try_from(*number).ok(),
            _ => None,
        }
    }

    fn to_stored(&self) -> StoredValue {
        StoredValue::Integer(i64::from(*self))
    }
}

impl SettingValue for BTreeSet<String> {
    const KIND: ValueKind = ValueKind::StringSet;

    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::StringSet(members) => Some(members.clone()),
            _ => None,
        }
    }

    fn to_stored(&self) -> StoredValue {
        StoredValue::StringSet(self.clone())
    }
}

/// Validator hook attached to a key; returns a machine-readable reason on rejection.
pub type Validator<T> = fn(&T) -> Result<(), &'static str>;

/// Uniquely named, typed configuration slot with a declared default.
pub struct SettingKey<T> {
    name: &'static str,
    default: fn() -> T,
    validator: Option<Validator<T>>,
}

impl<T: SettingValue> SettingKey<T> {
    /// Key named `name` whose default is produced by `default`.
    #[must_use]
    pub const fn new(name: &'static str, default: fn() -> T) -> Self {
        Self {
            name,
            default,
            validator: None,
        }
    }

    /// Key that additionally rejects writes failing `validator`.
    #[must_use]
    pub const fn validated(
        name: &'static str,
        default: fn() -> T,
        validator: Validator<T>,
    ) -> Self {
        Self {
            name,
            default,
            validator: Some(validator),
        }
    }

    /// Stable storage name of the key.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Stored kind of the key.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        T::KIND
    }

    /// Fresh copy of the declared default.
    #[must_use]
    pub fn default_value(&self) -> T {
        (self.default)()
    }

    /// Run the key's validator, if any.
    ///
    /// # Errors
    ///
    /// Returns the validator's reason when `value` is rejected.
    pub fn validate(&self, value: &T) -> Result<(), &'static str> {
        self.validator.map_or(Ok(()), |validate| validate(value))
    }

    /// Untyped description used by the registry.
    #[must_use]
    pub fn descriptor(&self) -> KeyDescriptor {
        KeyDescriptor {
            name: self.name,
            kind: T::KIND,
            default: self.default_value().to_stored(),
            decode: normalize::<T>,
        }
    }
}

fn normalize<T: SettingValue>(value: &StoredValue) -> Option<StoredValue> {
    T::from_stored(value).map(|decoded| decoded.to_stored())
}

impl<T> Clone for SettingKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SettingKey<T> {}

impl<T> fmt::Debug for SettingKey<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SettingKey")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registry view of a key: name, stored kind, and encoded default.
#[derive(Clone)]
pub struct KeyDescriptor {
    /// Stable storage name.
    pub name: &'static str,
    /// Stored kind.
    pub kind: ValueKind,
    /// Encoded default value.
    pub default: StoredValue,
    decode: fn(&StoredValue) -> Option<StoredValue>,
}

impl KeyDescriptor {
    /// Decode `value` the way a typed read of this key would, returning the
    /// re-encoded value or `None` when a typed read falls back to the default.
    #[must_use]
    pub fn decode(&self, value: &StoredValue) -> Option<StoredValue> {
        (self.decode)(value)
    }
}

impl fmt::Debug for KeyDescriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("KeyDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}
