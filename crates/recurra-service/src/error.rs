use std::time::Duration;

use recurra_rrule::error::RuleError;
use thiserror::Error;

use crate::occurrence::IntegrityFault;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    StoreError(#[from] recurra_store::error::StoreError),

    #[error(transparent)]
    CoreError(#[from] recurra_core::error::CoreError),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Integrity fault: {0}")]
    IntegrityFault(IntegrityFault),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Batch partially failed: {succeeded} succeeded, {failed} failed")]
    PartialBatchFailure { succeeded: usize, failed: usize },

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

impl From<RuleError> for ServiceError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::InvalidRule(reason) => Self::InvalidRule(reason),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<IntegrityFault> for ServiceError {
    fn from(fault: IntegrityFault) -> Self {
        Self::IntegrityFault(fault)
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
