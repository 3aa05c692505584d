//! Telemetry normalization: raw JSON fields -> typed `AttemptMetrics`.
//!
//! Clients send numbers, numeric strings or omit fields entirely. Omitted and
//! `null` fields count as zero; anything negative, non-finite or non-numeric
//! is rejected.

use serde::Deserialize;
use serde_json::Value;

use crate::adaptive::error::EngineError;
use crate::adaptive::types::AttemptMetrics;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTelemetry {
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default)]
    pub errors: Option<Value>,
    #[serde(default)]
    pub hints: Option<Value>,
}

pub fn normalize(raw: &RawTelemetry) -> Result<AttemptMetrics, EngineError> {
    Ok(AttemptMetrics {
        time: parse_seconds("time", raw.time.as_ref())?,
        errors: parse_count("errors", raw.errors.as_ref())?,
        hints: parse_count("hints", raw.hints.as_ref())?,
    })
}

fn numeric_value(field: &str, value: Option<&Value>) -> Result<Option<f64>, EngineError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| EngineError::validation(format!("{field} is not a valid number"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| EngineError::validation(format!("{field} must be numeric"))),
        Some(_) => Err(EngineError::validation(format!("{field} must be numeric"))),
    }
}

fn parse_seconds(field: &str, value: Option<&Value>) -> Result<f64, EngineError> {
    let Some(v) = numeric_value(field, value)? else {
        return Ok(0.0);
    };
    if !v.is_finite() {
        return Err(EngineError::validation(format!("{field} must be finite")));
    }
    if v < 0.0 {
        return Err(EngineError::validation(format!("{field} must be >= 0")));
    }
    Ok(v)
}

fn parse_count(field: &str, value: Option<&Value>) -> Result<u32, EngineError> {
    let Some(v) = numeric_value(field, value)? else {
        return Ok(0);
    };
    if !v.is_finite() {
        return Err(EngineError::validation(format!("{field} must be finite")));
    }
    if v < 0.0 {
        return Err(EngineError::validation(format!("{field} must be >= 0")));
    }
    if v.fract() != 0.0 {
        return Err(EngineError::validation(format!("{field} must be an integer")));
    }
    if v > u32::MAX as f64 {
        return Err(EngineError::validation(format!("{field} is too large")));
    }
    Ok(v as u32)
}
