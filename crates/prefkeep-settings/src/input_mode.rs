//! Text input strategy, stored as an integer setting.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use prefkeep_store::{StoredValue, ValueKind};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::key::SettingValue;

/// How text is delivered into the focused input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Set the field's text directly.
    #[default]
    SetText,
    /// Copy to the clipboard and paste.
    Paste,
    /// Type through a simulated input method.
    Ime,
}

impl InputMode {
    /// Every mode in backing-integer order.
    pub const ALL: [Self; 3] = [Self::SetText, Self::Paste, Self::Ime];

    /// Backing integer persisted for this mode.
    #[must_use]
    pub const fn to_int(self) -> i64 {
        match self {
            Self::SetText => 0,
            Self::Paste => 1,
            Self::Ime => 2,
        }
    }

    /// Mode for a backing integer; unknown integers map to the default mode.
    #[must_use]
    pub fn from_int(value: i64) -> Self {
        Self::ALL
            .into_iter()
            .find(|mode| mode.to_int() == value)
            .unwrap_or_default()
    }

    /// Render the mode as its snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SetText => "set_text",
            Self::Paste => "paste",
            Self::Ime => "ime",
        }
    }
}

impl Display for InputMode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for InputMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set_text" => Ok(Self::SetText),
            "paste" => Ok(Self::Paste),
            "ime" => Ok(Self::Ime),
            other => Err(SettingsError::InvalidInputMode {
                value: other.to_string(),
            }),
        }
    }
}

impl SettingValue for InputMode {
    const KIND: ValueKind = ValueKind::Integer;

    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Integer(number) => Some(Self::from_int(*number)),
            _ => None,
        }
    }

    fn to_stored(&self) -> StoredValue {
        StoredValue::Integer(self.to_int())
    }
}
