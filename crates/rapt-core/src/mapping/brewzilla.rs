// BrewZilla all-in-one brewing system fields.

use super::FieldSpec;
use super::fields::{
    AUXILIARY_RUN_TIME, AUXILIARY_STARTS, BETA_UPDATES, BLUETOOTH_ENABLED, COMPRESSOR_DELAY,
    CONNECTION_STATE, CONTROL_DEVICE_TEMPERATURE, CONTROL_DEVICE_TYPE, COOLING_ENABLED,
    COOLING_HYSTERESIS, COOLING_RUN_TIME, COOLING_STARTS, DISTILLATION_MODE, FIRMWARE_VERSION,
    HEATING_ENABLED, HEATING_HYSTERESIS, HEATING_RUN_TIME, HEATING_STARTS, HEATING_UTILISATION,
    HIGH_TEMP_ALARM, LOW_TEMP_ALARM, MAX_TARGET_TEMPERATURE, MIN_TARGET_TEMPERATURE,
    MODE_SWITCH_DELAY, NTC_BETA, NTC_REF_RESISTANCE, NTC_REF_TEMPERATURE, PID_CYCLE_TIME,
    PID_DERIVATIVE, PID_ENABLED, PID_INTEGRAL, PID_PROPORTIONAL, PUMP_ENABLED, PUMP_UTILISATION,
    RSSI, SENSOR_DIFFERENTIAL, SENSOR_TIMEOUT, SOUNDS_ENABLED, STATUS, TARGET_TEMPERATURE,
    TELEMETRY_FREQUENCY, TEMP_UNIT, TEMPERATURE, TOTAL_RUN_TIME, USE_INTERNAL_SENSOR,
};

pub(super) const FIELDS: &[FieldSpec] = &[
    TEMPERATURE,
    TARGET_TEMPERATURE,
    MIN_TARGET_TEMPERATURE,
    MAX_TARGET_TEMPERATURE,
    HEATING_UTILISATION,
    PUMP_UTILISATION,
    TOTAL_RUN_TIME,
    COOLING_RUN_TIME,
    HEATING_RUN_TIME,
    AUXILIARY_RUN_TIME,
    COOLING_STARTS,
    HEATING_STARTS,
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
    PID_CYCLE_TIME,
    COOLING_ENABLED,
    HEATING_ENABLED,
    PUMP_ENABLED,
    DISTILLATION_MODE,
    BLUETOOTH_ENABLED,
    BETA_UPDATES,
    SOUNDS_ENABLED,
    CONTROL_DEVICE_TYPE,
    CONTROL_DEVICE_TEMPERATURE,
    TEMP_UNIT,
    USE_INTERNAL_SENSOR,
    SENSOR_DIFFERENTIAL,
    SENSOR_TIMEOUT,
    COMPRESSOR_DELAY,
    MODE_SWITCH_DELAY,
    COOLING_HYSTERESIS,
    HEATING_HYSTERESIS,
    TELEMETRY_FREQUENCY,
    NTC_BETA,
    NTC_REF_RESISTANCE,
    NTC_REF_TEMPERATURE,
];
