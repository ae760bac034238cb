use chrono::NaiveDate;
use thiserror::Error;

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The at-most-one-occurrence-per-day constraint rejected a create.
    #[error("Occurrence already exists: series={series_slug}, day={day}")]
    DuplicateOccurrence { series_slug: String, day: NaiveDate },

    #[error("Slug already in use: {0}")]
    SlugConflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    RuleError(#[from] recurra_rrule::error::RuleError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
