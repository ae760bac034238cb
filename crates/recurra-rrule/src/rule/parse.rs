//! RFC 5545 `RRULE` value parsing.
//!
//! Supports the rule parts the engine evaluates: `FREQ`, `INTERVAL`, `COUNT`,
//! `UNTIL`, `BYDAY`, `BYMONTHDAY`, `BYMONTH`, `BYSETPOS` and `WKST`. Any other
//! part is rejected rather than silently ignored.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::{Frequency, RecurrenceRule, Weekday};
use crate::error::{RuleError, RuleResult};

impl FromStr for Frequency {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            other => Err(RuleError::InvalidRule(format!(
                "unsupported frequency: {other}"
            ))),
        }
    }
}

impl FromStr for RecurrenceRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let text = text
            .strip_prefix("RRULE:")
            .or_else(|| text.strip_prefix("rrule:"))
            .unwrap_or(text);

        let mut frequency = None;
        let mut rule = RecurrenceRule::new(Frequency::Daily);

        for part in text.split(';').filter(|part| !part.trim().is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| RuleError::InvalidRule(format!("malformed rule part: {part}")))?;
            let value = value.trim();

            match key.trim().to_ascii_uppercase().as_str() {
                "FREQ" => frequency = Some(value.parse::<Frequency>()?),
                "INTERVAL" => rule.interval = parse_number(key, value)?,
                "COUNT" => rule.count = Some(parse_number(key, value)?),
                "UNTIL" => rule.until = Some(parse_until(value)?),
                "BYDAY" => {
                    rule.by_weekday = split_list(value).map(str::to_ascii_uppercase).collect();
                }
                "BYMONTHDAY" => rule.by_month_day = parse_list(key, value)?,
                "BYMONTH" => rule.by_month = parse_list(key, value)?,
                "BYSETPOS" => rule.by_set_position = parse_list(key, value)?,
                "WKST" => {
                    rule.week_start = Weekday::from_code(value).ok_or_else(|| {
                        RuleError::InvalidRule(format!("invalid week start: {value}"))
                    })?;
                }
                other => {
                    return Err(RuleError::InvalidRule(format!(
                        "unsupported rule part: {other}"
                    )));
                }
            }
        }

        rule.frequency =
            frequency.ok_or_else(|| RuleError::InvalidRule("missing FREQ".to_string()))?;
        rule.validate()?;

        Ok(rule)
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_number<T>(key: &str, value: &str) -> RuleResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|err| RuleError::InvalidRule(format!("invalid {key} value {value}: {err}")))
}

fn parse_list<T>(key: &str, value: &str) -> RuleResult<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    split_list(value)
        .map(|item| parse_number(key, item))
        .collect()
}

/// Parses `UNTIL` in UTC (`...Z`), floating date-time or date form.
///
/// Floating values are read as UTC; date values as the end of that UTC day.
fn parse_until(value: &str) -> RuleResult<DateTime<Utc>> {
    if let Some(utc) = value.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .map(|naive| naive.and_utc())
            .map_err(|err| RuleError::InvalidDateTime(format!("UNTIL {value}: {err}")));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Ok(naive.and_utc());
    }

    NaiveDate::parse_from_str(value, "%Y%m%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RuleError::InvalidDateTime(format!("UNTIL {value}")))
}
