//! Error taxonomy for the matching system
//!
//! Validation and state-conflict errors surface to callers; storage errors
//! are retried and only surfaced when a terminal record could not be made
//! durable. Kernel invariant violations are panics, never errors.

use thiserror::Error;

/// Errors reported by the book controller and the storage layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("trade not found: {0}")]
    TradeNotFound(String),

    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Machine-readable error kind for API responses
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION",
            EngineError::OrderNotFound(_) | EngineError::TradeNotFound(_) => "NOT_FOUND",
            EngineError::StateConflict(_) => "STATE_CONFLICT",
            EngineError::Storage(_) => "STORAGE",
            EngineError::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

impl From<crate::numeric::PriceError> for EngineError {
    fn from(err: crate::numeric::PriceError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::PriceError;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EngineError::Validation("q".into()).kind(), "VALIDATION");
        assert_eq!(EngineError::OrderNotFound("x".into()).kind(), "NOT_FOUND");
        assert_eq!(EngineError::TradeNotFound("x".into()).kind(), "NOT_FOUND");
        assert_eq!(EngineError::StateConflict("s".into()).kind(), "STATE_CONFLICT");
        assert_eq!(EngineError::Storage("db".into()).kind(), "STORAGE");
    }

    #[test]
    fn test_price_error_converts_to_validation() {
        let err: EngineError = PriceError::NotPositive.into();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(err.to_string().contains("positive"));
    }
}
