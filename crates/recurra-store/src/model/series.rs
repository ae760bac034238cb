use chrono::{DateTime, Utc};
use recurra_rrule::rule::RecurrenceRule;
use serde::{Deserialize, Serialize};

/// Where a series' occurrences originate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSource {
    /// Created in this system.
    #[default]
    Native,
    /// Mirrored from an external feed; kept with a shorter look-ahead.
    External,
}

/// A recurring event series.
///
/// The series owns the rule that generates occurrence instants, never the
/// instants themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSeries {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub time_zone: String,
    pub recurrence_rule: RecurrenceRule,
    /// Event whose fields are cloned onto new occurrences.
    #[serde(default)]
    pub template_event_slug: Option<String>,
    pub user_id: uuid::Uuid,
    #[serde(default)]
    pub source_type: SeriesSource,
    /// Instants whose local day is skipped by the series.
    #[serde(default)]
    pub exception_dates: Vec<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl EventSeries {
    #[must_use]
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        time_zone: impl Into<String>,
        recurrence_rule: RecurrenceRule,
        user_id: uuid::Uuid,
    ) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
            time_zone: time_zone.into(),
            recurrence_rule,
            template_event_slug: None,
            user_id,
            source_type: SeriesSource::Native,
            exception_dates: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_template(mut self, template_event_slug: impl Into<String>) -> Self {
        self.template_event_slug = Some(template_event_slug.into());
        self
    }

    #[must_use]
    pub const fn with_source(mut self, source_type: SeriesSource) -> Self {
        self.source_type = source_type;
        self
    }

    #[must_use]
    pub const fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
