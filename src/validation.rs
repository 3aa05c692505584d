//! Request field checks shared by the algorithm endpoints.

use crate::adaptive::error::EngineError;
use crate::adaptive::types::{DifficultyTier, StruggleStatus};
use crate::constants::MAX_USER_ID_LEN;

/// Trimmed, non-empty, bounded, and free of the store's key separator.
pub fn require_user_id(raw: Option<&str>) -> Result<&str, EngineError> {
    let id = raw.map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(EngineError::validation("userId is required"));
    }
    if id.len() > MAX_USER_ID_LEN {
        return Err(EngineError::validation(format!(
            "userId must be at most {MAX_USER_ID_LEN} bytes"
        )));
    }
    if id.contains(':') || id.chars().any(char::is_control) {
        return Err(EngineError::validation("userId contains invalid characters"));
    }
    Ok(id)
}

pub fn parse_tier(field: &str, raw: Option<&str>) -> Result<DifficultyTier, EngineError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EngineError::validation(format!("{field} is required")))?;
    raw.parse().map_err(|_| {
        EngineError::validation(format!(
            "{field} must be one of Easy, Medium, Hard (got {raw:?})"
        ))
    })
}

pub fn parse_status(field: &str, raw: Option<&str>) -> Result<StruggleStatus, EngineError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EngineError::validation(format!("{field} is required")))?;
    raw.parse().map_err(|_| {
        EngineError::validation(format!(
            "{field} must be one of SuperStruggling, MediumStruggling, NotStruggling (got {raw:?})"
        ))
    })
}

/// Any positive `k` is accepted; the matchmaker clamps it to the pool size.
pub fn parse_k(raw: Option<i64>, default_k: usize) -> Result<usize, EngineError> {
    match raw {
        None => Ok(default_k),
        Some(k) if k >= 1 => Ok(usize::try_from(k).unwrap_or(usize::MAX)),
        Some(k) => Err(EngineError::validation(format!(
            "k must be a positive integer (got {k})"
        ))),
    }
}
