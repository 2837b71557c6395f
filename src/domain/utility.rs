use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

pub const TV: &str = "tv";
pub const HEATER: &str = "heater";
pub const ALARM: &str = "alarm";
pub const LAMP_FLOOR: &str = "lamp_floor";
pub const LAMP_CEIL: &str = "lamp_ceil";
pub const LED_PWM: &str = "led_pwm";
pub const TEMPERATURE: &str = "temperature";

/// Every utility the device knows about, requested in full after each (re)connect.
pub const ALL_UTILITIES: [&str; 7] = [TV, HEATER, ALARM, LAMP_FLOOR, LAMP_CEIL, LED_PWM, TEMPERATURE];

/// Utilities whose state can change without a user action and therefore have to be polled.
pub const VOLATILE_UTILITIES: [&str; 2] = [ALARM, TEMPERATURE];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UtilityKind {
    /// On/off, 0 or 1.
    Binary,
    /// A level between 0 and 100.
    Level,
    /// A read-only sensor reading.
    Reading,
}

pub fn kind_of(utility: &str) -> Option<UtilityKind> {
    match utility {
        TV | HEATER | ALARM | LAMP_FLOOR | LAMP_CEIL => Some(UtilityKind::Binary),
        LED_PWM => Some(UtilityKind::Level),
        TEMPERATURE => Some(UtilityKind::Reading),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UtilityValue {
    Integer(i64),
    Float(f64),
}

impl UtilityValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            UtilityValue::Integer(n) => *n as f64,
            UtilityValue::Float(n) => *n,
        }
    }

    pub fn is_on(&self) -> bool {
        self.as_f64() != 0.0
    }

    /// Reads a value the device reported. Booleans count as 0 and 1, anything else non-numeric is `None`.
    pub fn from_json(value: &Value) -> Option<UtilityValue> {
        match value {
            Value::Number(n) => n.as_i64().map(UtilityValue::Integer).or_else(|| n.as_f64().map(UtilityValue::Float)),
            Value::Bool(on) => Some(UtilityValue::Integer(*on as i64)),
            _ => None,
        }
    }

    /// The value a toggle command is expected to produce.
    pub fn toggled(&self) -> UtilityValue {
        UtilityValue::Integer(if self.is_on() { 0 } else { 1 })
    }
}

impl From<i64> for UtilityValue {
    fn from(value: i64) -> Self {
        UtilityValue::Integer(value)
    }
}

impl From<u8> for UtilityValue {
    fn from(value: u8) -> Self {
        UtilityValue::Integer(value as i64)
    }
}

impl From<f64> for UtilityValue {
    fn from(value: f64) -> Self {
        UtilityValue::Float(value)
    }
}

impl Display for UtilityValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UtilityValue::Integer(n) => write!(f, "{}", n),
            UtilityValue::Float(n) => write!(f, "{}", n),
        }
    }
}
