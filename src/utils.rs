// Input coercion helpers shared by handlers

use serde_json::Value;

use crate::error::{AppError, Result};

/// Coerces a loosely typed JSON value into an integer.
///
/// Accepts integers, finite floats (truncated toward zero) and numeric
/// strings. Anything else yields `None`.
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Reads a required integer field, rejecting absent, null or non-numeric input.
pub fn require_integer(value: Option<&Value>, field: &str) -> Result<i64> {
    match value {
        None | Some(Value::Null) => Err(AppError::BadRequest(format!("{} is required", field))),
        Some(v) => coerce_integer(v)
            .ok_or_else(|| AppError::BadRequest(format!("{} must be an integer", field))),
    }
}

/// Reads a required level: an integer that is not negative.
pub fn require_level(value: Option<&Value>) -> Result<u32> {
    let level = require_integer(value, "level")?;
    u32::try_from(level)
        .map_err(|_| AppError::BadRequest("level must be a non-negative integer".to_string()))
}
