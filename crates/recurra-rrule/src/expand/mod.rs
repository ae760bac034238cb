//! Wall-clock recurrence expansion.

mod evaluator;
mod options;
pub mod timezone;

pub use evaluator::{DEFAULT_MAX_OCCURRENCES, generate};
pub use options::{EvaluationOptions, Occurrence};
pub use timezone::{
    TimeZoneResolver, local_to_utc, local_to_utc_lenient, resolve_timezone, to_local,
};
