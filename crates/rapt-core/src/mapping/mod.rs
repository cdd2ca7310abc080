// ── Entity mapper ──
//
// Pure translation from a `DeviceRecord` to its entity states. Each
// category has one fixed, ordered field table; the output always has one
// entry per table row, with `EntityValue::Unknown` standing in for fields
// the payload did not carry.

mod brewzilla;
mod chamber;
mod controller;
mod fields;
mod hydrometer;

use rapt_api::DeviceCategory;
use serde_json::Value;

use crate::model::{DeviceRecord, EntityKind, EntityState, EntityValue, Unit};

/// How a raw JSON value becomes an [`EntityValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Number or numeric string, as `f64`.
    Number,
    /// Integral number or numeric string, as `i64`.
    Count,
    Text,
    /// Boolean, `"true"`/`"false"`, or 0/1.
    Flag,
}

impl Transform {
    pub fn apply(self, raw: &Value) -> EntityValue {
        let mapped = match self {
            Self::Number => number(raw).map(EntityValue::Number),
            Self::Count => count(raw).map(EntityValue::Count),
            Self::Text => text(raw).map(EntityValue::Text),
            Self::Flag => flag(raw).map(EntityValue::Flag),
        };
        mapped.unwrap_or(EntityValue::Unknown)
    }
}

fn number(raw: &Value) -> Option<f64> {
    let n = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn count(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            // Integral floats such as 3600.0 are accepted; 1.5 is not.
            (f.fract() == 0.0 && f.abs() < 9.0e15).then(|| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flag(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        Value::Number(n) => match n.as_i64()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
        _ => None,
    }
}

/// One row of a category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name in the API payload.
    pub source: &'static str,
    /// Entity key suffix, snake_case.
    pub suffix: &'static str,
    pub name: &'static str,
    pub unit: Option<Unit>,
    pub kind: EntityKind,
    pub transform: Transform,
}

/// The field table for `category`, in display order.
pub fn table(category: DeviceCategory) -> &'static [FieldSpec] {
    match category {
        DeviceCategory::Controller => controller::FIELDS,
        DeviceCategory::Hydrometer => hydrometer::FIELDS,
        DeviceCategory::Chamber => chamber::FIELDS,
        DeviceCategory::BrewZilla => brewzilla::FIELDS,
    }
}

/// Map a record to its full, ordered entity set.
pub fn map(record: &DeviceRecord) -> Vec<EntityState> {
    table(record.category)
        .iter()
        .map(|spec| EntityState {
            key: EntityState::entity_key(&record.device_id, spec.suffix),
            device_id: record.device_id.clone(),
            name: spec.name.to_owned(),
            value: record
                .field(spec.source)
                .map_or(EntityValue::Unknown, |raw| spec.transform.apply(raw)),
            unit: spec.unit,
            kind: spec.kind,
            stale: false,
        })
        .collect()
}
