// ── Device records ──
//
// A `DeviceRecord` is one element of a list response, kept verbatim.
// `DeviceInfo` is the metadata the display layer groups entities under.

use chrono::{DateTime, Utc};
use rapt_api::DeviceCategory;
use serde::Serialize;
use serde_json::{Map, Value};

/// Raw telemetry for one device as last returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRecord {
    pub device_id: String,
    pub category: DeviceCategory,
    pub raw_fields: Map<String, Value>,
    pub received_at: DateTime<Utc>,
}

impl DeviceRecord {
    /// Parse one list element. Returns `None` for non-objects and for
    /// records without a non-empty string `id`.
    pub fn from_json(category: DeviceCategory, value: Value) -> Option<Self> {
        let Value::Object(raw_fields) = value else {
            return None;
        };
        let device_id = raw_fields
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())?
            .to_owned();
        Some(Self {
            device_id,
            category,
            raw_fields,
            received_at: Utc::now(),
        })
    }

    /// Look a field up on the record, falling back to the most recent
    /// entry of its `telemetry` array.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.raw_fields
            .get(name)
            .or_else(|| self.latest_telemetry().and_then(|t| t.get(name)))
    }

    fn latest_telemetry(&self) -> Option<&Map<String, Value>> {
        self.raw_fields
            .get("telemetry")
            .and_then(Value::as_array)
            .and_then(|entries| entries.first())
            .and_then(Value::as_object)
    }

    fn text_field(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn info(&self) -> DeviceInfo {
        let name = self.text_field("name").unwrap_or_else(|| {
            let short: String = self.device_id.chars().take(8).collect();
            format!("RAPT {} {short}", self.category)
        });
        DeviceInfo {
            device_id: self.device_id.clone(),
            category: self.category,
            name,
            firmware_version: self.text_field("firmwareVersion"),
            connection_state: self.text_field("connectionState"),
        }
    }
}

/// Device metadata used for grouping entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub category: DeviceCategory,
    pub name: String,
    pub firmware_version: Option<String>,
    pub connection_state: Option<String>,
}
