//! RFC 5545 `RRULE` rendering.

use super::{NthWeekday, RecurrenceRule};

impl RecurrenceRule {
    /// ## Summary
    /// Renders the rule as an RFC 5545 `RRULE` value (without the `RRULE:` name).
    ///
    /// `UNTIL` is written in UTC form. Weekday codes are written after
    /// mapping, so invalid codes do not appear in the output.
    #[must_use]
    pub fn to_rrule_string(&self) -> String {
        let mut out = self.expansion_text(&self.weekday_filters());
        if let Some(until) = self.until {
            out.push_str(&format!(";UNTIL={}", until.format("%Y%m%dT%H%M%SZ")));
        }
        out
    }

    /// Rule text handed to the expansion engine.
    ///
    /// `UNTIL` is left out: the evaluator applies it itself in the wall-clock
    /// domain.
    pub(crate) fn expansion_text(&self, weekdays: &[NthWeekday]) -> String {
        let mut out = format!("FREQ={}", self.frequency);

        if self.interval != 1 {
            out.push_str(&format!(";INTERVAL={}", self.interval));
        }
        if let Some(count) = self.count {
            out.push_str(&format!(";COUNT={count}"));
        }
        if !weekdays.is_empty() {
            out.push_str(&format!(";BYDAY={}", join(weekdays)));
        }
        if !self.by_month_day.is_empty() {
            out.push_str(&format!(";BYMONTHDAY={}", join(&self.by_month_day)));
        }
        if !self.by_month.is_empty() {
            out.push_str(&format!(";BYMONTH={}", join(&self.by_month)));
        }
        if !self.by_set_position.is_empty() {
            out.push_str(&format!(";BYSETPOS={}", join(&self.by_set_position)));
        }
        if self.week_start != super::Weekday::Monday {
            out.push_str(&format!(";WKST={}", self.week_start.code()));
        }

        out
    }
}

impl std::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rrule_string())
    }
}

fn join<T: std::fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
