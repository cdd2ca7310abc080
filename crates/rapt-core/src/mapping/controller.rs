// Temperature controller fields.

use super::FieldSpec;
use super::fields::{
    CONNECTION_STATE, COOLING_RUN_TIME, FIRMWARE_VERSION, HEATING_RUN_TIME, HEATING_UTILISATION,
    RSSI, TARGET_TEMPERATURE, TEMPERATURE, TOTAL_RUN_TIME,
};

pub(super) const FIELDS: &[FieldSpec] = &[
    TEMPERATURE,
    TARGET_TEMPERATURE,
    HEATING_UTILISATION,
    CONNECTION_STATE,
    RSSI,
    TOTAL_RUN_TIME,
    COOLING_RUN_TIME,
    HEATING_RUN_TIME,
    FIRMWARE_VERSION,
];
