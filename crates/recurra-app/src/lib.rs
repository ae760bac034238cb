//! Recurra occurrence engine - seeding and look-ahead job.

pub mod error;
pub mod job;
pub mod seed;
