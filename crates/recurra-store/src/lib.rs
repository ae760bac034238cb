//! Persisted event and series records and the storage contracts the
//! materializer runs against.

pub mod db;
pub mod error;
pub mod model;
