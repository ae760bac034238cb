//! Recurrence rule value objects.
//!
//! A [`RecurrenceRule`] is supplied by the caller and never mutated by the
//! engine. Weekday filters are kept as iCalendar codes (`MO`, `2MO`, `-1FR`)
//! so rules round-trip through storage unchanged; they are mapped to
//! [`NthWeekday`] only when a rule is evaluated.

mod format;
mod parse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RuleError, RuleResult};

/// Recurrence frequency (RFC 5545 `FREQ`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Day of the week as a two-letter iCalendar code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Weekday {
    #[default]
    #[serde(rename = "MO")]
    Monday,
    #[serde(rename = "TU")]
    Tuesday,
    #[serde(rename = "WE")]
    Wednesday,
    #[serde(rename = "TH")]
    Thursday,
    #[serde(rename = "FR")]
    Friday,
    #[serde(rename = "SA")]
    Saturday,
    #[serde(rename = "SU")]
    Sunday,
}

impl Weekday {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
            Self::Sunday => "SU",
        }
    }

    /// Parses a two-letter code, ignoring ASCII case.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "MO" => Some(Self::Monday),
            "TU" => Some(Self::Tuesday),
            "WE" => Some(Self::Wednesday),
            "TH" => Some(Self::Thursday),
            "FR" => Some(Self::Friday),
            "SA" => Some(Self::Saturday),
            "SU" => Some(Self::Sunday),
            _ => None,
        }
    }
}

impl From<Weekday> for chrono::Weekday {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Monday => Self::Mon,
            Weekday::Tuesday => Self::Tue,
            Weekday::Wednesday => Self::Wed,
            Weekday::Thursday => Self::Thu,
            Weekday::Friday => Self::Fri,
            Weekday::Saturday => Self::Sat,
            Weekday::Sunday => Self::Sun,
        }
    }
}

/// A weekday filter entry, optionally restricted to the nth match in the period.
///
/// `position` is signed: `Some(2)` is the second, `Some(-1)` the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NthWeekday {
    pub position: Option<i8>,
    pub weekday: Weekday,
}

impl NthWeekday {
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            position: None,
            weekday,
        }
    }

    #[must_use]
    pub const fn nth(position: i8, weekday: Weekday) -> Self {
        Self {
            position: Some(position),
            weekday,
        }
    }
}

impl std::str::FromStr for NthWeekday {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        let split = code.len().saturating_sub(2);
        let (prefix, day) = code
            .split_at_checked(split)
            .ok_or_else(|| RuleError::InvalidRule(format!("invalid weekday code: {s}")))?;

        let weekday = Weekday::from_code(day)
            .ok_or_else(|| RuleError::InvalidRule(format!("invalid weekday code: {s}")))?;

        if prefix.is_empty() {
            return Ok(Self::every(weekday));
        }

        let position = prefix
            .trim_start_matches('+')
            .parse::<i8>()
            .map_err(|err| RuleError::InvalidRule(format!("invalid weekday position {s}: {err}")))?;
        if position == 0 || !(-53..=53).contains(&position) {
            return Err(RuleError::InvalidRule(format!(
                "weekday position out of range: {s}"
            )));
        }

        Ok(Self::nth(position, weekday))
    }
}

impl std::fmt::Display for NthWeekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(position) = self.position {
            write!(f, "{position}")?;
        }
        f.write_str(self.weekday.code())
    }
}

/// An abstract recurrence rule.
///
/// Empty filter lists mean "no constraint". `by_month_day` accepts `1..=31`
/// and `-31..=-1` (counted from the end of the month).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_weekday: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_month_day: Vec<i8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_month: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_set_position: Vec<i16>,
    #[serde(default)]
    pub week_start: Weekday,
}

const fn default_interval() -> u16 {
    1
}

impl RecurrenceRule {
    /// Creates a rule with the given frequency and every option at its default.
    #[must_use]
    pub const fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            count: None,
            until: None,
            by_weekday: Vec::new(),
            by_month_day: Vec::new(),
            by_month: Vec::new(),
            by_set_position: Vec::new(),
            week_start: Weekday::Monday,
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: u16) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub const fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    #[must_use]
    pub fn with_weekdays<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_weekday = codes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_month_days(mut self, days: impl Into<Vec<i8>>) -> Self {
        self.by_month_day = days.into();
        self
    }

    #[must_use]
    pub fn with_months(mut self, months: impl Into<Vec<u8>>) -> Self {
        self.by_month = months.into();
        self
    }

    #[must_use]
    pub fn with_set_positions(mut self, positions: impl Into<Vec<i16>>) -> Self {
        self.by_set_position = positions.into();
        self
    }

    #[must_use]
    pub const fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    /// ## Summary
    /// Checks interval and numeric filter ranges.
    ///
    /// Weekday codes are not checked here; unparseable codes are dropped
    /// when the rule is evaluated.
    ///
    /// ## Errors
    /// Returns `RuleError::InvalidRule` on the first value out of range.
    pub fn validate(&self) -> RuleResult<()> {
        if self.interval < 1 {
            return Err(RuleError::InvalidRule(format!(
                "interval must be at least 1, got {}",
                self.interval
            )));
        }
        if let Some(day) = self
            .by_month_day
            .iter()
            .find(|day| **day == 0 || !(-31..=31).contains(*day))
        {
            return Err(RuleError::InvalidRule(format!(
                "month day out of range: {day}"
            )));
        }
        if let Some(month) = self.by_month.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(RuleError::InvalidRule(format!(
                "month out of range: {month}"
            )));
        }
        if let Some(pos) = self
            .by_set_position
            .iter()
            .find(|pos| **pos == 0 || !(-366..=366).contains(*pos))
        {
            return Err(RuleError::InvalidRule(format!(
                "set position out of range: {pos}"
            )));
        }
        Ok(())
    }

    /// ## Summary
    /// Maps the weekday codes to typed filters, dropping codes that do not parse.
    #[must_use]
    pub fn weekday_filters(&self) -> Vec<NthWeekday> {
        self.by_weekday
            .iter()
            .filter_map(|code| match code.parse::<NthWeekday>() {
                Ok(weekday) => Some(weekday),
                Err(err) => {
                    tracing::debug!(code = %code, error = %err, "Dropping invalid weekday code");
                    None
                }
            })
            .collect()
    }
}
