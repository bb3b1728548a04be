//! Aggregate error model.

use stockpile_core::DomainError;
use stockpile_events::CodecError;
use stockpile_log::LogError;
use stockpile_store::StoreError;
use thiserror::Error;

/// Failure of an aggregate operation.
///
/// Domain answers (insufficient quantity, validation) and infrastructure
/// failures (log, store) arrive through one enum so callers can match on
/// what they care about and propagate the rest.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("decoding event: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AggregateError {
    /// Whether this is the insufficient-quantity domain answer.
    pub fn is_insufficient_quantity(&self) -> bool {
        matches!(
            self,
            Self::Domain(DomainError::InsufficientQuantity { .. })
        )
    }
}
