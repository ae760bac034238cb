//! Shared configuration, errors and utilities for the recurra workspace.

pub mod config;
pub mod error;
pub mod util;
