//! Recurrence rule evaluation.
//!
//! Turns an anchor instant, a [`rule::RecurrenceRule`] and
//! [`expand::EvaluationOptions`] into the ordered list of occurrence instants.
//! Expansion runs on wall-clock tuples; real UTC offsets are attached per
//! candidate afterwards. Nothing in this crate performs I/O.

pub mod error;
pub mod expand;
pub mod rule;
