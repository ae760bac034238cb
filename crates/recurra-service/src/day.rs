//! Local-day arithmetic shared by the occurrence operations.
//!
//! Occurrence identity is the calendar day in the series timezone, never the
//! UTC instant.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use recurra_rrule::error::RuleResult;
use recurra_rrule::expand::{local_to_utc_lenient, to_local};
use recurra_store::model::event::Event;

/// Calendar day of `instant` in `tz`.
#[must_use]
pub fn local_day(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    to_local(instant, tz).date()
}

#[must_use]
pub fn is_same_local_day(a: DateTime<Utc>, b: DateTime<Utc>, tz: Tz) -> bool {
    local_day(a, tz) == local_day(b, tz)
}

/// First event in `events` whose start falls on `day` in `tz`.
#[must_use]
pub fn find_event_for_day(events: &[Event], day: NaiveDate, tz: Tz) -> Option<&Event> {
    events
        .iter()
        .find(|event| local_day(event.start_date, tz) == day)
}

/// ## Summary
/// UTC instants covering the whole local `day`: local midnight through the
/// next local midnight, exclusive.
///
/// ## Errors
/// Returns an error if either midnight cannot be placed on the timeline.
pub fn local_day_bounds(day: NaiveDate, tz: Tz) -> RuleResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_to_utc_lenient(day.and_time(NaiveTime::MIN), tz)?;
    let next = day + TimeDelta::days(1);
    let end = local_to_utc_lenient(next.and_time(NaiveTime::MIN), tz)?;
    Ok((start, end))
}
