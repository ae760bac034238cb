use chrono::{NaiveTime, TimeDelta, Timelike};
use chrono_tz::Tz;

use super::helpers::{TestEnv, local_time, utc};
use recurra_test::component::expand::{EvaluationOptions, generate};
use recurra_test::component::occurrence::{get_or_create_occurrence, materialize_occurrence};
use recurra_test::component::rule::{Frequency, RecurrenceRule};

fn seven_pm() -> NaiveTime {
    NaiveTime::from_hms_opt(19, 0, 0).expect("valid time")
}

/// ## Summary
/// A year of daily occurrences keeps the anchor's local time in zones with
/// northern, southern and no DST.
#[test_log::test]
fn local_time_is_invariant_for_a_year() {
    let zones = [
        ("America/Los_Angeles", utc(2025, 10, 16, 2, 0)),
        ("Europe/Berlin", utc(2025, 3, 1, 18, 0)),
        ("Australia/Sydney", utc(2025, 1, 10, 8, 0)),
        ("Asia/Tokyo", utc(2025, 1, 10, 10, 0)),
    ];
    let rule = RecurrenceRule::new(Frequency::Daily).with_count(366);

    for (zone, anchor) in zones {
        let tz: Tz = zone.parse().expect("known zone");
        let expected = local_time(anchor, tz);
        let occurrences = generate(anchor, &rule, &EvaluationOptions::in_time_zone(zone))
            .expect("Failed to generate");

        assert_eq!(occurrences.len(), 366, "{zone}");
        for occurrence in &occurrences {
            assert_eq!(occurrence.local_time, expected, "{zone} {}", occurrence.local_date);
            assert_eq!(local_time(occurrence.instant_utc, tz), expected, "{zone}");
        }
    }
}

#[test_log::test]
fn fall_back_shifts_utc_hour_not_local_hour() {
    let tz = Tz::America__Los_Angeles;
    // 2025-10-29 19:00 PDT
    let anchor = utc(2025, 10, 30, 2, 0);
    let rule = RecurrenceRule::new(Frequency::Daily).with_count(10);

    let occurrences = generate(
        anchor,
        &rule,
        &EvaluationOptions::in_time_zone("America/Los_Angeles"),
    )
    .expect("Failed to generate");

    for occurrence in &occurrences {
        assert_eq!(local_time(occurrence.instant_utc, tz), seven_pm());
        let expected_hour = if occurrence.instant_utc < utc(2025, 11, 2, 9, 0) { 2 } else { 3 };
        assert_eq!(occurrence.instant_utc.hour(), expected_hour);
    }
}

/// ## Summary
/// A template dated before the fall-back transition produces a 7pm
/// occurrence after it, one UTC hour later, with the same duration.
#[test_log::test(tokio::test)]
async fn materialized_occurrence_after_fall_back_keeps_wall_clock() {
    let env = TestEnv::new();
    let tz = Tz::America__Los_Angeles;
    let template = env
        .series_with_template(
            "evening",
            "America/Los_Angeles",
            RecurrenceRule::new(Frequency::Daily),
            utc(2025, 10, 30, 2, 0),
            TimeDelta::minutes(150),
        )
        .await;

    let event = materialize_occurrence(&env.ctx, "evening", utc(2025, 11, 10, 20, 0), env.owner)
        .await
        .expect("Failed to materialize")
        .event;

    assert_eq!(event.start_date, utc(2025, 11, 11, 3, 0));
    assert_eq!(local_time(event.start_date, tz), seven_pm());
    assert_eq!(event.start_date.hour(), template.start_date.hour() + 1);
    assert_eq!(event.duration(), template.duration());
    assert_eq!(event.fields, template.fields);
    assert_eq!(event.series_slug.as_deref(), Some("evening"));
}

#[test_log::test(tokio::test)]
async fn materialized_occurrence_after_spring_forward_keeps_wall_clock() {
    let env = TestEnv::new();
    let tz = Tz::Europe__Berlin;
    // Sunday 2026-03-22 18:00 CET
    let template = env
        .series_with_template(
            "choir",
            "Europe/Berlin",
            RecurrenceRule::new(Frequency::Weekly),
            utc(2026, 3, 22, 17, 0),
            TimeDelta::hours(2),
        )
        .await;

    let event = get_or_create_occurrence(&env.ctx, "choir", utc(2026, 4, 5, 12, 0), env.owner)
        .await
        .expect("Failed to materialize")
        .event;

    assert_eq!(event.start_date, utc(2026, 4, 5, 16, 0));
    assert_eq!(local_time(event.start_date, tz), local_time(template.start_date, tz));
    assert_eq!(event.duration(), TimeDelta::hours(2));
}

/// ## Summary
/// Durations are carried verbatim for every occurrence of a month that
/// contains a DST transition.
#[test_log::test(tokio::test)]
async fn duration_is_invariant_across_transition() {
    let env = TestEnv::new();
    let duration = TimeDelta::minutes(95);
    let template = env
        .series_with_template(
            "night",
            "America/New_York",
            RecurrenceRule::new(Frequency::Daily),
            // 2025-02-25 23:30 EST
            utc(2025, 2, 26, 4, 30),
            duration,
        )
        .await;

    for day in 1..=20 {
        let requested = template.start_date + TimeDelta::days(day);
        let event = get_or_create_occurrence(&env.ctx, "night", requested, env.owner)
            .await
            .expect("Failed to materialize")
            .event;
        assert_eq!(event.duration(), duration, "day {day}");
        assert_eq!(
            local_time(event.start_date, Tz::America__New_York),
            NaiveTime::from_hms_opt(23, 30, 0).expect("valid time")
        );
    }
}
