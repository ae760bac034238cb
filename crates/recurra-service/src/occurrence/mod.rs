//! Occurrence materialization.
//!
//! Occurrence days come from the series rule. An occurrence is persisted
//! lazily, the first time something asks for it, by cloning the series
//! template onto that day at the template's local wall-clock time.

mod batch;
mod lookup;
mod materialize;
mod propagate;
mod template;
mod upcoming;

#[cfg(test)]
mod test_support;

use std::fmt;

use chrono::{DateTime, Utc};
use recurra_store::model::event::Event;
use serde::Serialize;

pub use batch::{
    BatchFailure, BatchOutcome, SeriesBuffer, materialize_buffer_for_user,
    materialize_next_n_occurrences, materialize_next_n_occurrences_as_of,
};
pub use lookup::{find_occurrence, get_or_create_occurrence};
pub use materialize::materialize_occurrence;
pub use propagate::{PropagationOutcome, update_future_occurrences};
pub use template::{Template, TemplateSource};
pub use upcoming::{
    OccurrenceResult, UpcomingOccurrences, get_upcoming_occurrences,
    get_upcoming_occurrences_as_of,
};

/// What went wrong with a persisted occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The stored event does not point back to its series.
    SeriesLinkMismatch,
    /// The event could not be read back after an update.
    MissingAfterUpdate,
}

/// A stored event that no longer satisfies the series linkage invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityFault {
    pub kind: FaultKind,
    pub event_slug: String,
    pub expected_series_slug: String,
    pub actual_series_slug: Option<String>,
}

impl IntegrityFault {
    /// Checks that `event` links back to `series_slug`, logging a fault if not.
    #[must_use]
    pub fn check_link(event: &Event, series_slug: &str) -> Option<Self> {
        if event.series_slug.as_deref() == Some(series_slug) {
            return None;
        }

        tracing::error!(
            event_slug = %event.slug,
            expected_series_slug = series_slug,
            actual_series_slug = ?event.series_slug,
            "Occurrence is not linked to its series"
        );
        Some(Self {
            kind: FaultKind::SeriesLinkMismatch,
            event_slug: event.slug.clone(),
            expected_series_slug: series_slug.to_string(),
            actual_series_slug: event.series_slug.clone(),
        })
    }

    #[must_use]
    pub fn missing(event_slug: &str, series_slug: &str) -> Self {
        tracing::error!(
            event_slug,
            expected_series_slug = series_slug,
            "Occurrence missing after update"
        );
        Self {
            kind: FaultKind::MissingAfterUpdate,
            event_slug: event_slug.to_string(),
            expected_series_slug: series_slug.to_string(),
            actual_series_slug: None,
        }
    }
}

impl fmt::Display for IntegrityFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FaultKind::SeriesLinkMismatch => write!(
                f,
                "event {} expected series {}, found {:?}",
                self.event_slug, self.expected_series_slug, self.actual_series_slug
            ),
            FaultKind::MissingAfterUpdate => write!(
                f,
                "event {} of series {} vanished after update",
                self.event_slug, self.expected_series_slug
            ),
        }
    }
}

/// An occurrence event together with the anomalies seen while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub event: Event,
    /// `false` when an already stored event was returned.
    pub created: bool,
    pub warnings: Vec<IntegrityFault>,
}

impl Materialized {
    #[must_use]
    pub const fn existing(event: Event) -> Self {
        Self {
            event,
            created: false,
            warnings: Vec::new(),
        }
    }

    /// Instant the occurrence was materialized for, falling back to its start.
    #[must_use]
    pub fn occurrence_date(&self) -> DateTime<Utc> {
        self.event
            .original_occurrence_date
            .unwrap_or(self.event.start_date)
    }
}
