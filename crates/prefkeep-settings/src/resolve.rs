//! Total default-value resolution.

use prefkeep_store::{Snapshot, StoredValue};
use tracing::debug;

use crate::key::{SettingKey, SettingValue};

/// Effective value of `key` in `snapshot`.
///
/// Absent entries and entries of the wrong type both resolve to the key's
/// default; this never fails.
pub fn resolve<T: SettingValue>(snapshot: &Snapshot, key: &SettingKey<T>) -> T {
    resolve_entry(snapshot.get(key.name()), key)
}

pub(crate) fn resolve_entry<T: SettingValue>(entry: Option<&StoredValue>, key: &SettingKey<T>) -> T {
    let Some(stored) = entry else {
        return key.default_value();
    };
    T::from_stored(stored).unwrap_or_else(|| {
        debug!(
            key = key.name(),
            expected = %T::KIND,
            found = %stored.kind(),
            "stored setting has unexpected type; using default"
        );
        key.default_value()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> String {
        "fallback".to_string()
    }

    const TITLE: SettingKey<String> = SettingKey::new("title", fallback);

    #[test]
    fn absent_entry_resolves_to_default() {
        assert_eq!(resolve(&Snapshot::empty(), &TITLE), "fallback");
    }

    #[test]
    fn stored_entry_wins() {
        let snapshot = Snapshot::empty().with("title", StoredValue::String("stored".into()));
        assert_eq!(resolve(&snapshot, &TITLE), "stored");
    }

    #[test]
    fn mismatched_entry_resolves_to_default() {
        let snapshot = Snapshot::empty().with("title", StoredValue::Boolean(true));
        assert_eq!(resolve(&snapshot, &TITLE), "fallback");
    }
}
