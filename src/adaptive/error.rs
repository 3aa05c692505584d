use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Missing or malformed request input. Safe to show to the caller.
    #[error("validation error: {0}")]
    Validation(String),
    /// An algorithmic invariant was violated.
    #[error("compute error: {0}")]
    Compute(String),
    /// External store read/write failed or timed out.
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("not found: {entity} {key}")]
    NotFound { entity: String, key: String },
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn compute(message: impl Into<String>) -> Self {
        EngineError::Compute(message.into())
    }

    pub fn dependency(message: impl Into<String>) -> Self {
        EngineError::Dependency(message.into())
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(msg) => EngineError::Validation(msg),
            StoreError::NotFound { entity, key } => EngineError::NotFound { entity, key },
            other => EngineError::Dependency(other.to_string()),
        }
    }
}
