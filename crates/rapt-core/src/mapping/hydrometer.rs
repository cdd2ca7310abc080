// RAPT Pill hydrometer fields.

use super::FieldSpec;
use super::fields::{
    ACTIVE, BATTERY, FIRMWARE_VERSION, GRAVITY, GRAVITY_VELOCITY, PAIRED_DEVICE_TYPE, RSSI,
    TEMPERATURE,
};

pub(super) const FIELDS: &[FieldSpec] = &[
    TEMPERATURE,
    GRAVITY,
    GRAVITY_VELOCITY,
    BATTERY,
    RSSI,
    FIRMWARE_VERSION,
    PAIRED_DEVICE_TYPE,
    ACTIVE,
];
