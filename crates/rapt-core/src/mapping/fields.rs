// ── Shared field definitions ──
//
// Every field that appears in more than one category table is defined
// once here, so a field name always maps to the same key suffix, unit and
// transform. Values are passed through as the API reports them: run times
// and timeouts are seconds, compressor delay is minutes, temperatures are
// degrees Celsius. Only the start counters are whole numbers.

use super::{FieldSpec, Transform};
use crate::model::{EntityKind, Unit};

const fn measurement(
    source: &'static str,
    suffix: &'static str,
    name: &'static str,
    unit: Option<Unit>,
    transform: Transform,
) -> FieldSpec {
    FieldSpec {
        source,
        suffix,
        name,
        unit,
        kind: EntityKind::Measurement,
        transform,
    }
}

const fn diagnostic(
    source: &'static str,
    suffix: &'static str,
    name: &'static str,
    unit: Option<Unit>,
    transform: Transform,
) -> FieldSpec {
    FieldSpec {
        source,
        suffix,
        name,
        unit,
        kind: EntityKind::Diagnostic,
        transform,
    }
}

const CELSIUS: Option<Unit> = Some(Unit::Celsius);
const PERCENT: Option<Unit> = Some(Unit::Percent);
const SECONDS: Option<Unit> = Some(Unit::Seconds);

// ── Readings ─────────────────────────────────────────────────────────

pub(super) const TEMPERATURE: FieldSpec =
    measurement("temperature", "temperature", "Temperature", CELSIUS, Transform::Number);
pub(super) const TARGET_TEMPERATURE: FieldSpec = measurement(
    "targetTemperature",
    "target_temperature",
    "Target Temperature",
    CELSIUS,
    Transform::Number,
);
pub(super) const MIN_TARGET_TEMPERATURE: FieldSpec = measurement(
    "minTargetTemperature",
    "min_target_temperature",
    "Min Target Temperature",
    CELSIUS,
    Transform::Number,
);
pub(super) const MAX_TARGET_TEMPERATURE: FieldSpec = measurement(
    "maxTargetTemperature",
    "max_target_temperature",
    "Max Target Temperature",
    CELSIUS,
    Transform::Number,
);
pub(super) const HEATING_UTILISATION: FieldSpec = measurement(
    "heatingUtilisation",
    "heating_utilisation",
    "Heating Utilization",
    PERCENT,
    Transform::Number,
);
pub(super) const PUMP_UTILISATION: FieldSpec = measurement(
    "pumpUtilisation",
    "pump_utilisation",
    "Pump Utilization",
    PERCENT,
    Transform::Number,
);
/// Specific gravity, unitless (1.042 style).
pub(super) const GRAVITY: FieldSpec =
    measurement("gravity", "gravity", "Specific Gravity", None, Transform::Number);
/// Gravity change per day, unitless.
pub(super) const GRAVITY_VELOCITY: FieldSpec = measurement(
    "gravityVelocity",
    "gravity_velocity",
    "Gravity Velocity",
    None,
    Transform::Number,
);
pub(super) const BATTERY: FieldSpec =
    measurement("battery", "battery", "Battery Level", PERCENT, Transform::Number);

// ── Connectivity and identity ────────────────────────────────────────

pub(super) const CONNECTION_STATE: FieldSpec = diagnostic(
    "connectionState",
    "connection_state",
    "Connection Status",
    None,
    Transform::Text,
);
pub(super) const RSSI: FieldSpec = diagnostic(
    "rssi",
    "rssi",
    "Signal Strength",
    Some(Unit::DecibelMilliwatts),
    Transform::Number,
);
pub(super) const FIRMWARE_VERSION: FieldSpec = diagnostic(
    "firmwareVersion",
    "firmware_version",
    "Firmware Version",
    None,
    Transform::Text,
);
pub(super) const STATUS: FieldSpec =
    diagnostic("status", "status", "Status", None, Transform::Text);
pub(super) const PAIRED_DEVICE_TYPE: FieldSpec = diagnostic(
    "pairedDeviceType",
    "paired_device_type",
    "Paired Device Type",
    None,
    Transform::Text,
);
pub(super) const ACTIVE: FieldSpec =
    diagnostic("active", "active", "Active Status", None, Transform::Flag);

// ── Run counters (run times in seconds, as reported) ─────────────────

pub(super) const TOTAL_RUN_TIME: FieldSpec = diagnostic(
    "totalRunTime",
    "total_run_time",
    "Total Runtime",
    SECONDS,
    Transform::Number,
);
pub(super) const COOLING_RUN_TIME: FieldSpec = diagnostic(
    "coolingRunTime",
    "cooling_run_time",
    "Cooling Runtime",
    SECONDS,
    Transform::Number,
);
pub(super) const HEATING_RUN_TIME: FieldSpec = diagnostic(
    "heatingRunTime",
    "heating_run_time",
    "Heating Runtime",
    SECONDS,
    Transform::Number,
);
pub(super) const COMPRESSOR_RUN_TIME: FieldSpec = diagnostic(
    "compressorRunTime",
    "compressor_run_time",
    "Compressor Runtime",
    SECONDS,
    Transform::Number,
);
// The API spells it "auxillary".
pub(super) const AUXILIARY_RUN_TIME: FieldSpec = diagnostic(
    "auxillaryRunTime",
    "auxiliary_run_time",
    "Auxiliary Runtime",
    SECONDS,
    Transform::Number,
);
pub(super) const COOLING_STARTS: FieldSpec = diagnostic(
    "coolingStarts",
    "cooling_starts",
    "Cooling Starts",
    None,
    Transform::Count,
);
pub(super) const HEATING_STARTS: FieldSpec = diagnostic(
    "heatingStarts",
    "heating_starts",
    "Heating Starts",
    None,
    Transform::Count,
);
pub(super) const COMPRESSOR_STARTS: FieldSpec = diagnostic(
    "compressorStarts",
    "compressor_starts",
    "Compressor Starts",
    None,
    Transform::Count,
);
pub(super) const AUXILIARY_STARTS: FieldSpec = diagnostic(
    "auxillaryStarts",
    "auxiliary_starts",
    "Auxiliary Starts",
    None,
    Transform::Count,
);

// ── Alarms and control settings ──────────────────────────────────────

pub(super) const HIGH_TEMP_ALARM: FieldSpec = diagnostic(
    "highTempAlarm",
    "high_temp_alarm",
    "High Temperature Alarm",
    CELSIUS,
    Transform::Number,
);
pub(super) const LOW_TEMP_ALARM: FieldSpec = diagnostic(
    "lowTempAlarm",
    "low_temp_alarm",
    "Low Temperature Alarm",
    CELSIUS,
    Transform::Number,
);
pub(super) const PID_ENABLED: FieldSpec =
    diagnostic("pidEnabled", "pid_enabled", "PID Enabled", None, Transform::Flag);
pub(super) const PID_PROPORTIONAL: FieldSpec = diagnostic(
    "pidProportional",
    "pid_proportional",
    "PID Proportional",
    None,
    Transform::Number,
);
pub(super) const PID_INTEGRAL: FieldSpec = diagnostic(
    "pidIntegral",
    "pid_integral",
    "PID Integral",
    None,
    Transform::Number,
);
pub(super) const PID_DERIVATIVE: FieldSpec = diagnostic(
    "pidDerivative",
    "pid_derivative",
    "PID Derivative",
    None,
    Transform::Number,
);
pub(super) const PID_CYCLE_TIME: FieldSpec = diagnostic(
    "pidCycleTime",
    "pid_cycle_time",
    "PID Cycle Time",
    SECONDS,
    Transform::Number,
);
pub(super) const COOLING_ENABLED: FieldSpec = diagnostic(
    "coolingEnabled",
    "cooling_enabled",
    "Cooling Enabled",
    None,
    Transform::Flag,
);
pub(super) const HEATING_ENABLED: FieldSpec = diagnostic(
    "heatingEnabled",
    "heating_enabled",
    "Heating Enabled",
    None,
    Transform::Flag,
);
pub(super) const FAN_ENABLED: FieldSpec =
    diagnostic("fanEnabled", "fan_enabled", "Fan Enabled", None, Transform::Flag);
/// Reported as a mode value on some firmware, so kept as text.
pub(super) const LIGHT_ENABLED: FieldSpec =
    diagnostic("lightEnabled", "light_enabled", "Light Setting", None, Transform::Text);
pub(super) const CONTROL_DEVICE_TYPE: FieldSpec = diagnostic(
    "controlDeviceType",
    "control_device_type",
    "Control Device Type",
    None,
    Transform::Text,
);
pub(super) const CONTROL_DEVICE_TEMPERATURE: FieldSpec = diagnostic(
    "controlDeviceTemperature",
    "control_device_temperature",
    "Control Device Temperature",
    CELSIUS,
    Transform::Number,
);

// ── BrewZilla settings ───────────────────────────────────────────────

pub(super) const PUMP_ENABLED: FieldSpec =
    diagnostic("pumpEnabled", "pump_enabled", "Pump Enabled", None, Transform::Flag);
pub(super) const DISTILLATION_MODE: FieldSpec = diagnostic(
    "distillationMode",
    "distillation_mode",
    "Distillation Mode",
    None,
    Transform::Flag,
);
pub(super) const BLUETOOTH_ENABLED: FieldSpec = diagnostic(
    "bluetoothEnabled",
    "bluetooth_enabled",
    "Bluetooth Enabled",
    None,
    Transform::Flag,
);
pub(super) const BETA_UPDATES: FieldSpec = diagnostic(
    "betaUpdates",
    "beta_updates",
    "Beta Updates Enabled",
    None,
    Transform::Flag,
);
pub(super) const SOUNDS_ENABLED: FieldSpec = diagnostic(
    "soundsEnabled",
    "sounds_enabled",
    "Sounds Enabled",
    None,
    Transform::Flag,
);
pub(super) const TEMP_UNIT: FieldSpec =
    diagnostic("tempUnit", "temp_unit", "Temperature Unit", None, Transform::Text);
pub(super) const USE_INTERNAL_SENSOR: FieldSpec = diagnostic(
    "useInternalSensor",
    "use_internal_sensor",
    "Use Internal Sensor",
    None,
    Transform::Flag,
);
pub(super) const SENSOR_DIFFERENTIAL: FieldSpec = diagnostic(
    "sensorDifferential",
    "sensor_differential",
    "Sensor Differential",
    CELSIUS,
    Transform::Number,
);
pub(super) const SENSOR_TIMEOUT: FieldSpec = diagnostic(
    "sensorTimeout",
    "sensor_timeout",
    "Sensor Timeout",
    SECONDS,
    Transform::Number,
);
/// Minutes, unlike every other duration.
pub(super) const COMPRESSOR_DELAY: FieldSpec = diagnostic(
    "compressorDelay",
    "compressor_delay",
    "Compressor Delay",
    Some(Unit::Minutes),
    Transform::Number,
);
pub(super) const MODE_SWITCH_DELAY: FieldSpec = diagnostic(
    "modeSwitchDelay",
    "mode_switch_delay",
    "Mode Switch Delay",
    SECONDS,
    Transform::Number,
);
pub(super) const COOLING_HYSTERESIS: FieldSpec = diagnostic(
    "coolingHysteresis",
    "cooling_hysteresis",
    "Cooling Hysteresis",
    CELSIUS,
    Transform::Number,
);
pub(super) const HEATING_HYSTERESIS: FieldSpec = diagnostic(
    "heatingHysteresis",
    "heating_hysteresis",
    "Heating Hysteresis",
    CELSIUS,
    Transform::Number,
);
pub(super) const TELEMETRY_FREQUENCY: FieldSpec = diagnostic(
    "telemetryFrequency",
    "telemetry_frequency",
    "Telemetry Frequency",
    SECONDS,
    Transform::Number,
);
pub(super) const NTC_BETA: FieldSpec =
    diagnostic("ntcBeta", "ntc_beta", "NTC Beta", None, Transform::Number);
pub(super) const NTC_REF_RESISTANCE: FieldSpec = diagnostic(
    "ntcRefResistance",
    "ntc_ref_resistance",
    "NTC Reference Resistance",
    None,
    Transform::Number,
);
pub(super) const NTC_REF_TEMPERATURE: FieldSpec = diagnostic(
    "ntcRefTemperature",
    "ntc_ref_temperature",
    "NTC Reference Temperature",
    CELSIUS,
    Transform::Number,
);
