// Fermentation chamber fields.

use super::FieldSpec;
use super::fields::{
    AUXILIARY_RUN_TIME, AUXILIARY_STARTS, COMPRESSOR_RUN_TIME, COMPRESSOR_STARTS,
    CONNECTION_STATE, CONTROL_DEVICE_TEMPERATURE, CONTROL_DEVICE_TYPE, COOLING_ENABLED,
    COOLING_RUN_TIME, COOLING_STARTS, FAN_ENABLED, FIRMWARE_VERSION, HEATING_ENABLED,
    HEATING_RUN_TIME, HEATING_STARTS, HEATING_UTILISATION, HIGH_TEMP_ALARM, LIGHT_ENABLED,
    LOW_TEMP_ALARM, MAX_TARGET_TEMPERATURE, MIN_TARGET_TEMPERATURE, PID_DERIVATIVE, PID_ENABLED,
    PID_INTEGRAL, PID_PROPORTIONAL, RSSI, STATUS, TARGET_TEMPERATURE, TEMPERATURE, TOTAL_RUN_TIME,
};

pub(super) const FIELDS: &[FieldSpec] = &[
    TEMPERATURE,
    TARGET_TEMPERATURE,
    MIN_TARGET_TEMPERATURE,
    MAX_TARGET_TEMPERATURE,
    HEATING_UTILISATION,
    TOTAL_RUN_TIME,
    COOLING_RUN_TIME,
    HEATING_RUN_TIME,
    COMPRESSOR_RUN_TIME,
    AUXILIARY_RUN_TIME,
    COOLING_STARTS,
    HEATING_STARTS,
    COMPRESSOR_STARTS,
    AUXILIARY_STARTS,
    HIGH_TEMP_ALARM,
    LOW_TEMP_ALARM,
    CONNECTION_STATE,
    STATUS,
    RSSI,
    FIRMWARE_VERSION,
    PID_ENABLED,
    PID_PROPORTIONAL,
    PID_INTEGRAL,
    PID_DERIVATIVE,
    COOLING_ENABLED,
    HEATING_ENABLED,
    FAN_ENABLED,
    LIGHT_ENABLED,
    CONTROL_DEVICE_TYPE,
    CONTROL_DEVICE_TEMPERATURE,
];
