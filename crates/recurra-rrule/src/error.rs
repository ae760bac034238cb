use thiserror::Error;

/// Errors raised while validating or expanding a recurrence rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Malformed rule: frequency, interval or a filter out of range.
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    /// Unknown or invalid timezone identifier.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Local time skipped by a DST gap.
    #[error("Non-existent time (DST gap): {0}")]
    NonExistentTime(String),

    /// Invalid datetime component.
    #[error("Invalid datetime: {0}")]
    InvalidDateTime(String),
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;
