//! Scalar and passthrough field kinds

use super::{DumpContext, FieldKind, LoadContext};
use crate::error::ErrorMessages;
use crate::value::Value;
use regex::Regex;
use serde_json::{Number, Value as JsonValue};
use std::sync::OnceLock;

const TRUTHY: &[&str] = &["t", "true", "on", "y", "yes", "1"];
const FALSY: &[&str] = &["f", "false", "off", "n", "no", "0"];

fn invalid(message: &str) -> ErrorMessages {
    ErrorMessages::message(message)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Str;

impl FieldKind for Str {
    fn name(&self) -> &'static str {
        "string"
    }

    fn deserialize(&self, value: Value, _ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        match value {
            Value::Str(s) => Ok(Value::Str(s)),
            _ => Err(invalid("Not a valid string.")),
        }
    }

    fn serialize(&self, value: Value, _ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        match value {
            Value::Str(s) => Ok(JsonValue::String(s)),
            Value::Int(i) => Ok(JsonValue::String(i.to_string())),
            Value::Float(f) => Ok(JsonValue::String(f.to_string())),
            Value::Bool(b) => Ok(JsonValue::String(b.to_string())),
            _ => Err(invalid("Not a valid string.")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Int;

/// `i64` range as floats: `-2^63` is representable, `2^63` is not
const I64_MIN_F: f64 = i64::MIN as f64;
const I64_MAX_EXCLUSIVE_F: f64 = -(i64::MIN as f64);

impl Int {
    /// A whole float within `i64` range; `as` would saturate silently
    fn from_whole_float(f: f64) -> Option<i64> {
        (f.fract() == 0.0 && (I64_MIN_F..I64_MAX_EXCLUSIVE_F).contains(&f)).then_some(f as i64)
    }

    fn coerce(value: &Value) -> Option<i64> {
        match value {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() => Int::from_whole_float(*f),
            Value::Str(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .and_then(|f| Int::coerce(&Value::Float(f)))
                })
            }
            _ => None,
        }
    }
}

impl FieldKind for Int {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn deserialize(&self, value: Value, _ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        Int::coerce(&value)
            .map(Value::Int)
            .ok_or_else(|| invalid("Not a valid integer."))
    }

    fn serialize(&self, value: Value, _ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        let coerced = match &value {
            Value::Float(f) if f.is_finite() => Int::from_whole_float(f.trunc()),
            other => Int::coerce(other),
        };
        coerced
            .map(|i| JsonValue::Number(i.into()))
            .ok_or_else(|| invalid("Not a valid integer."))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Float;

impl Float {
    fn coerce(value: &Value) -> Result<f64, ErrorMessages> {
        let f = match value {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid("Not a valid number."))?,
            _ => return Err(invalid("Not a valid number.")),
        };
        if f.is_finite() {
            Ok(f)
        } else {
            Err(invalid(
                "Special numeric values (nan or infinity) are not permitted.",
            ))
        }
    }
}

impl FieldKind for Float {
    fn name(&self) -> &'static str {
        "float"
    }

    fn deserialize(&self, value: Value, _ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        Float::coerce(&value).map(Value::Float)
    }

    fn serialize(&self, value: Value, _ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        let f = Float::coerce(&value)?;
        Number::from_f64(f)
            .map(JsonValue::Number)
            .ok_or_else(|| invalid("Not a valid number."))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

impl Bool {
    /// Truthiness by the extended word sets, case-insensitive
    pub fn coerce(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Int(1) => Some(true),
            Value::Int(0) => Some(false),
            Value::Float(f) if *f == 1.0 => Some(true),
            Value::Float(f) if *f == 0.0 => Some(false),
            Value::Str(s) => {
                let lowered = s.to_lowercase();
                if TRUTHY.contains(&lowered.as_str()) {
                    Some(true)
                } else if FALSY.contains(&lowered.as_str()) {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl FieldKind for Bool {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn deserialize(&self, value: Value, _ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        Bool::coerce(&value)
            .map(Value::Bool)
            .ok_or_else(|| invalid("Not a valid boolean."))
    }

    fn serialize(&self, value: Value, _ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        Bool::coerce(&value)
            .map(JsonValue::Bool)
            .ok_or_else(|| invalid("Not a valid boolean."))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

impl Email {
    fn is_valid(address: &str) -> bool {
        EMAIL_REGEX
            .get_or_init(|| Regex::new(EMAIL_PATTERN).expect("valid email pattern"))
            .is_match(address)
    }
}

impl FieldKind for Email {
    fn name(&self) -> &'static str {
        "email"
    }

    fn deserialize(&self, value: Value, _ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        match value {
            Value::Str(s) if Email::is_valid(&s) => Ok(Value::Str(s)),
            Value::Str(_) => Err(invalid("Not a valid email address.")),
            _ => Err(invalid("Not a valid string.")),
        }
    }

    fn serialize(&self, value: Value, _ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        match value {
            Value::Str(s) => Ok(JsonValue::String(s)),
            _ => Err(invalid("Not a valid string.")),
        }
    }
}

/// Any plain value, unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl FieldKind for Raw {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn deserialize(&self, value: Value, _ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        Ok(value)
    }

    fn serialize(&self, value: Value, _ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        value
            .to_json()
            .ok_or_else(|| invalid("Value cannot be serialized."))
    }
}

/// A free-form mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct Dict;

impl FieldKind for Dict {
    fn name(&self) -> &'static str {
        "dict"
    }

    fn deserialize(&self, value: Value, _ctx: &LoadContext<'_>) -> Result<Value, ErrorMessages> {
        match value {
            Value::Map(map) => Ok(Value::Map(map)),
            _ => Err(invalid("Not a valid mapping type.")),
        }
    }

    fn serialize(&self, value: Value, _ctx: &DumpContext<'_>) -> Result<JsonValue, ErrorMessages> {
        match &value {
            Value::Map(_) => value
                .to_json()
                .ok_or_else(|| invalid("Value cannot be serialized.")),
            _ => Err(invalid("Not a valid mapping type.")),
        }
    }
}
