//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic, business-level failure.
///
/// Infrastructure failures (storage, log connectivity) live in their own
/// crates; this enum only covers outcomes a caller must handle as an
/// ordinary domain answer, never as a crash.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A take was requested for more instances than the projection holds.
    #[error("insufficient quantity of {object:?}: requested {requested}, stored {stored}")]
    InsufficientQuantity {
        object: String,
        requested: i64,
        stored: i64,
    },

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_quantity(object: impl Into<String>, requested: i64, stored: i64) -> Self {
        Self::InsufficientQuantity {
            object: object.into(),
            requested,
            stored,
        }
    }
}

/// Validate a put/take request before any event is built.
pub fn validate_request(object: &str, quantity: i64) -> DomainResult<()> {
    if object.is_empty() {
        return Err(DomainError::validation(format!(
            "invalid object: {object:?}"
        )));
    }
    if quantity < 0 {
        return Err(DomainError::validation(format!(
            "invalid quantity: {quantity}"
        )));
    }
    Ok(())
}
