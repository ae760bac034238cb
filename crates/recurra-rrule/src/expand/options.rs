use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Per-call tuning for [`super::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// IANA identifier the anchor's wall-clock time is read in.
    pub time_zone: String,
    /// Hard ceiling on returned occurrences, applied on top of `count`/`until`.
    /// Can only lower the engine default.
    pub max_occurrences: Option<usize>,
    /// Inclusive lower bound of the generation interval.
    pub window_start: Option<DateTime<Utc>>,
    /// Inclusive upper bound of the generation interval.
    pub window_end: Option<DateTime<Utc>>,
    /// Instants whose local calendar day is dropped from the result.
    pub excluded_dates: Vec<DateTime<Utc>>,
    /// Keep excluded days anyway.
    pub include_excluded: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            time_zone: "UTC".to_string(),
            max_occurrences: None,
            window_start: None,
            window_end: None,
            excluded_dates: Vec::new(),
            include_excluded: false,
        }
    }
}

impl EvaluationOptions {
    #[must_use]
    pub fn in_time_zone(time_zone: impl Into<String>) -> Self {
        Self {
            time_zone: time_zone.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_max_occurrences(mut self, max: usize) -> Self {
        self.max_occurrences = Some(max);
        self
    }

    #[must_use]
    pub const fn with_window(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.window_start = start;
        self.window_end = end;
        self
    }

    #[must_use]
    pub fn with_excluded_dates(mut self, dates: impl Into<Vec<DateTime<Utc>>>) -> Self {
        self.excluded_dates = dates.into();
        self
    }

    #[must_use]
    pub const fn including_excluded(mut self) -> Self {
        self.include_excluded = true;
        self
    }
}

/// One computed occurrence with its wall-clock label in the evaluation timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub instant_utc: DateTime<Utc>,
    pub local_date: NaiveDate,
    pub local_time: NaiveTime,
}

impl Occurrence {
    /// `YYYY-MM-DD`
    #[must_use]
    pub fn local_date_label(&self) -> String {
        self.local_date.format("%Y-%m-%d").to_string()
    }

    /// `HH:MM:SS`
    #[must_use]
    pub fn local_time_label(&self) -> String {
        self.local_time.format("%H:%M:%S").to_string()
    }
}
