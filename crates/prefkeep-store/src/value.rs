//! Untyped values as they are held in a snapshot and written to disk.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Primitive type tag of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// UTF-8 string.
    String,
    /// Boolean flag.
    Boolean,
    /// Signed 64-bit integer.
    Integer,
    /// Unordered set of strings.
    StringSet,
}

impl ValueKind {
    /// Render the kind as its snake-case tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::StringSet => "string_set",
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A single stored setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    /// String payload.
    String(String),
    /// Boolean payload.
    Boolean(bool),
    /// Integer payload.
    Integer(i64),
    /// String-set payload, kept sorted for stable output.
    StringSet(BTreeSet<String>),
}

impl StoredValue {
    /// Type tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::StringSet(_) => ValueKind::StringSet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_values_serialize_with_type_tags() -> Result<(), serde_json::Error> {
        let set = StoredValue::StringSet(BTreeSet::from(["pkg.b".to_string(), "pkg.a".into()]));
        assert_eq!(
            serde_json::to_string(&set)?,
            r#"{"type":"string_set","value":["pkg.a","pkg.b"]}"#
        );

        let parsed: StoredValue = serde_json::from_str(r#"{"type":"integer","value":2}"#)?;
        assert_eq!(parsed, StoredValue::Integer(2));
        assert_eq!(parsed.kind(), ValueKind::Integer);
        Ok(())
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let parsed = serde_json::from_str::<StoredValue>(r#"{"type":"float","value":1.5}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn kind_tags_match_serde_names() {
        assert_eq!(ValueKind::StringSet.as_str(), "string_set");
        assert_eq!(ValueKind::Boolean.to_string(), "boolean");
    }
}
