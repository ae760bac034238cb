//! Recurrence expansion in the wall-clock domain.
//!
//! The anchor is reduced to its local wall-clock components in the evaluation
//! timezone and handed to the `rrule` engine tagged as UTC, so the engine only
//! ever does floating-time arithmetic. Each surviving candidate is then given
//! the anchor's time of day again and converted back to a real instant with
//! the offset of its own date.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use rrule::{RRule, Unvalidated};

use super::options::{EvaluationOptions, Occurrence};
use super::timezone::{local_to_utc_lenient, resolve_timezone, to_local};
use crate::error::{RuleError, RuleResult};
use crate::rule::{NthWeekday, RecurrenceRule};

/// ## Summary
/// Maximum number of occurrences returned by a single call (safety limit).
///
/// Applied even when the rule has neither `count` nor `until`;
/// `EvaluationOptions::max_occurrences` can only lower it.
pub const DEFAULT_MAX_OCCURRENCES: usize = 730;

/// Bounds of the generation interval, in the wall-clock domain.
#[derive(Debug, Clone, Copy, Default)]
struct NaiveBounds {
    lower: Option<NaiveDateTime>,
    upper: Option<NaiveDateTime>,
}

impl NaiveBounds {
    fn contains(&self, candidate: NaiveDateTime) -> bool {
        self.lower.is_none_or(|lower| candidate >= lower)
            && self.upper.is_none_or(|upper| candidate <= upper)
    }
}

/// ## Summary
/// Expands `rule` from `anchor_start` into an ordered, deduplicated list of
/// occurrences.
///
/// The local time of day of `anchor_start` in `opts.time_zone` is kept for
/// every occurrence; the UTC instant absorbs any DST offset change. A local
/// time that does not exist on a given date (DST gap) is moved forward one
/// hour. Exclusions match on local calendar day, not on instant.
///
/// ## Errors
///
/// Returns an error if:
/// - The rule is invalid (`RuleError::InvalidRule`)
/// - The timezone cannot be resolved (`RuleError::UnknownTimezone`)
#[tracing::instrument(skip(rule, opts), fields(
    rule = %rule,
    time_zone = %opts.time_zone,
    max_occurrences = ?opts.max_occurrences
))]
pub fn generate(
    anchor_start: DateTime<Utc>,
    rule: &RecurrenceRule,
    opts: &EvaluationOptions,
) -> RuleResult<Vec<Occurrence>> {
    rule.validate()?;
    let tz = resolve_timezone(&opts.time_zone)?;

    let cap = opts
        .max_occurrences
        .map_or(DEFAULT_MAX_OCCURRENCES, |max| max.min(DEFAULT_MAX_OCCURRENCES));
    if cap == 0 {
        return Ok(Vec::new());
    }

    let weekdays = rule.weekday_filters();
    if !rule.by_weekday.is_empty() && weekdays.is_empty() {
        tracing::debug!("No usable weekday codes, rule matches no day");
        return Ok(Vec::new());
    }

    let anchor_local = to_local(anchor_start, tz);
    let bounds = naive_bounds(rule, opts, tz);
    if bounds.upper.is_some_and(|upper| upper < anchor_local) {
        tracing::debug!("Upper bound precedes anchor, nothing to generate");
        return Ok(Vec::new());
    }

    let candidates = expand_naive(anchor_local, rule, &weekdays, bounds, cap)?;
    tracing::trace!(candidates = candidates.len(), "Expanded wall-clock candidates");

    let mut occurrences = attach_offsets(&candidates, anchor_local.time(), tz);

    if !opts.include_excluded && !opts.excluded_dates.is_empty() {
        let excluded: HashSet<NaiveDate> = opts
            .excluded_dates
            .iter()
            .map(|date| to_local(*date, tz).date())
            .collect();
        occurrences.retain(|occurrence| !excluded.contains(&occurrence.local_date));
    }

    occurrences.sort();
    occurrences.dedup_by_key(|occurrence| occurrence.instant_utc);

    tracing::debug!(occurrences = occurrences.len(), "Generated occurrences");

    Ok(occurrences)
}

/// Converts `until` and the evaluation window into the wall-clock domain.
fn naive_bounds(rule: &RecurrenceRule, opts: &EvaluationOptions, tz: Tz) -> NaiveBounds {
    let until = rule.until.map(|until| to_local(until, tz));
    let window_end = opts.window_end.map(|end| to_local(end, tz));

    let upper = match (until, window_end) {
        (Some(until), Some(end)) => Some(until.min(end)),
        (until, end) => until.or(end),
    };

    NaiveBounds {
        lower: opts.window_start.map(|start| to_local(start, tz)),
        upper,
    }
}

/// Runs the `rrule` engine on a UTC-tagged wall-clock anchor.
fn expand_naive(
    anchor_local: NaiveDateTime,
    rule: &RecurrenceRule,
    weekdays: &[NthWeekday],
    bounds: NaiveBounds,
    cap: usize,
) -> RuleResult<Vec<NaiveDateTime>> {
    let text = rule.expansion_text(weekdays);
    let dt_start = floating(anchor_local);

    let mut rrule_set = text
        .parse::<RRule<Unvalidated>>()
        .map_err(|err| RuleError::InvalidRule(err.to_string()))?
        .build(dt_start)
        .map_err(|err| RuleError::InvalidRule(err.to_string()))?;

    // The engine's own bounds are padded by a second and re-applied below,
    // so the result does not depend on whether they are inclusive.
    if let Some(lower) = bounds.lower {
        rrule_set = rrule_set.after(floating(lower - Duration::seconds(1)));
    }
    if let Some(upper) = bounds.upper {
        rrule_set = rrule_set.before(floating(upper + Duration::seconds(1)));
    }

    let limit = u16::try_from(cap.saturating_add(1)).unwrap_or(u16::MAX);
    let result = rrule_set.all(limit);
    if result.limited {
        tracing::trace!(limit, "rrule expansion hit its iteration limit");
    }

    Ok(result
        .dates
        .iter()
        .map(chrono::DateTime::naive_utc)
        .filter(|candidate| bounds.contains(*candidate))
        .take(cap)
        .collect())
}

/// Re-attaches the anchor time of day and converts each candidate to UTC.
fn attach_offsets(candidates: &[NaiveDateTime], wall_time: NaiveTime, tz: Tz) -> Vec<Occurrence> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let wall = candidate.date().and_time(wall_time);
            match local_to_utc_lenient(wall, tz) {
                Ok(instant) => {
                    let local = to_local(instant, tz);
                    Some(Occurrence {
                        instant_utc: instant,
                        local_date: local.date(),
                        local_time: local.time(),
                    })
                }
                Err(err) => {
                    tracing::warn!(%wall, %tz, error = %err, "Dropping unrepresentable occurrence");
                    None
                }
            }
        })
        .collect()
}

fn floating(naive: NaiveDateTime) -> DateTime<rrule::Tz> {
    naive.and_utc().with_timezone(&rrule::Tz::UTC)
}
