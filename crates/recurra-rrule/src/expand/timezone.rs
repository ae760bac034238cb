//! Timezone resolution and wall-clock/UTC conversion.
//!
//! Uses ICU4X for Windows timezone ID to IANA mapping and timezone canonicalization.
//! Every conversion looks up the offset for the specific local date being
//! converted; an offset is never carried from one instant to another.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{RuleError, RuleResult};

/// Resolver for timezone identifiers.
///
/// Maintains a cache of resolved timezones by identifier.
pub struct TimeZoneResolver {
    cache: HashMap<String, Tz>,
}

impl TimeZoneResolver {
    /// Creates a new timezone resolver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// ## Summary
    /// Resolves a timezone identifier to a `chrono_tz::Tz`.
    ///
    /// Windows names, `/mozilla.org/`-style prefixes and IANA aliases are
    /// normalized before parsing. An empty identifier resolves to UTC.
    ///
    /// ## Errors
    ///
    /// Returns `RuleError::UnknownTimezone` if the identifier cannot be resolved.
    ///
    /// ## Side Effects
    ///
    /// Caches successful resolutions to avoid repeated parsing.
    pub fn resolve(&mut self, tzid: &str) -> RuleResult<Tz> {
        if let Some(tz) = self.cache.get(tzid) {
            return Ok(*tz);
        }

        let tz = if tzid.trim().is_empty() {
            Tz::UTC
        } else {
            let normalized = normalize_tzid(tzid.trim());
            Tz::from_str(&normalized)
                .map_err(|_e| RuleError::UnknownTimezone(tzid.to_string()))?
        };

        self.cache.insert(tzid.to_string(), tz);

        Ok(tz)
    }
}

impl Default for TimeZoneResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// ## Summary
/// Resolves a single timezone identifier without keeping a cache.
///
/// ## Errors
/// Returns `RuleError::UnknownTimezone` if the identifier cannot be resolved.
pub fn resolve_timezone(tzid: &str) -> RuleResult<Tz> {
    TimeZoneResolver::new().resolve(tzid)
}

/// Normalizes common calendar-client timezone identifiers to IANA names.
fn normalize_tzid(tzid: &str) -> String {
    let stripped = tzid
        .strip_prefix("/mozilla.org/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
        .unwrap_or(tzid);

    let windows_parser = WindowsParser::new();
    if let Some(tz) = windows_parser.parse(stripped, None) {
        let iana_parser = IanaParserExtended::new();
        for entry in iana_parser.iter() {
            if entry.time_zone == tz {
                return entry.canonical.to_string();
            }
        }
    }

    // Europe/Kiev -> Europe/Kyiv, US/Eastern -> America/New_York
    let iana_parser = IanaParserExtended::new();
    let parsed = iana_parser.parse(stripped);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    stripped.to_string()
}

/// ## Summary
/// Returns the wall-clock date-time of `instant` in `tz`.
#[must_use]
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// ## Summary
/// Converts a wall-clock date-time in `tz` to UTC using the offset in force
/// on that date.
///
/// A time inside a DST fold resolves to the earlier of its two instants.
///
/// ## Errors
///
/// Returns `RuleError::NonExistentTime` if the time falls inside a DST gap.
pub fn local_to_utc(local_time: NaiveDateTime, tz: Tz) -> RuleResult<DateTime<Utc>> {
    match tz.from_local_datetime(&local_time) {
        LocalResult::None => Err(RuleError::NonExistentTime(format!(
            "{local_time} in timezone {tz}"
        ))),
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _later) => Ok(earlier.with_timezone(&Utc)),
    }
}

/// ## Summary
/// Lenient version of [`local_to_utc`] that shifts a time inside a DST gap
/// forward by one hour instead of failing.
///
/// ## Errors
///
/// Returns `RuleError::NonExistentTime` if the shifted time still does not exist.
pub fn local_to_utc_lenient(local_time: NaiveDateTime, tz: Tz) -> RuleResult<DateTime<Utc>> {
    match local_to_utc(local_time, tz) {
        Err(RuleError::NonExistentTime(_)) => {
            let shifted = local_time + chrono::Duration::hours(1);
            tracing::trace!(%local_time, %shifted, %tz, "Shifting local time out of DST gap");
            local_to_utc(shifted, tz)
        }
        other => other,
    }
}
