//! Occurrence materialization for recurring event series.
//!
//! Every operation takes a [`context::MaterializerContext`] carrying the
//! storage collaborators and tuning, plus plain identifiers and dates.

pub mod context;
pub mod day;
pub mod error;
pub mod occurrence;
