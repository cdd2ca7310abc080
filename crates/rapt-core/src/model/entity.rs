// ── Entity state ──
//
// One display value derived from a device record. Entity states carry no
// identity of their own beyond `key`: they are rebuilt from the latest
// record on every poll.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mapped value of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    Number(f64),
    Count(i64),
    Text(String),
    Flag(bool),
    /// Field absent from the payload or not convertible.
    Unknown,
}

impl EntityValue {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Count(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Flag(b) => f.write_str(if *b { "on" } else { "off" }),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Unit of measurement attached to an entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::IntoStaticStr,
)]
pub enum Unit {
    #[serde(rename = "°C")]
    #[strum(serialize = "°C")]
    Celsius,
    #[serde(rename = "%")]
    #[strum(serialize = "%")]
    Percent,
    #[serde(rename = "s")]
    #[strum(serialize = "s")]
    Seconds,
    #[serde(rename = "min")]
    #[strum(serialize = "min")]
    Minutes,
    #[serde(rename = "dBm")]
    #[strum(serialize = "dBm")]
    DecibelMilliwatts,
}

/// Whether an entity is a primary reading or a diagnostic detail.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Measurement,
    Diagnostic,
}

/// Current state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// `<device_id>.<suffix>`, stable for the life of the device.
    pub key: String,
    pub device_id: String,
    /// Human-readable measurement name, e.g. "Target Temperature".
    pub name: String,
    pub value: EntityValue,
    pub unit: Option<Unit>,
    pub kind: EntityKind,
    /// Set while the bridge is unavailable; the value is the last known one.
    #[serde(default)]
    pub stale: bool,
}

impl EntityState {
    pub fn entity_key(device_id: &str, suffix: &str) -> String {
        format!("{device_id}.{suffix}")
    }

    /// Value with its unit, for display.
    pub fn display_value(&self) -> String {
        match self.unit {
            Some(unit) if !self.value.is_unknown() => {
                let symbol: &'static str = unit.into();
                if matches!(unit, Unit::Percent | Unit::Celsius) {
                    format!("{}{symbol}", self.value)
                } else {
                    format!("{} {symbol}", self.value)
                }
            }
            _ => self.value.to_string(),
        }
    }
}
