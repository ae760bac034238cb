use std::collections::HashSet;

use chrono::TimeDelta;
use chrono_tz::Tz;

use super::helpers::utc;
use recurra_test::component::day::local_day;
use recurra_test::component::error::RuleError;
use recurra_test::component::expand::{DEFAULT_MAX_OCCURRENCES, EvaluationOptions, generate};
use recurra_test::component::rule::{Frequency, RecurrenceRule};

#[test_log::test]
fn excluded_days_never_appear() {
    let tz = Tz::America__Chicago;
    let anchor = utc(2025, 3, 1, 15, 0);
    let rule = RecurrenceRule::new(Frequency::Daily).with_count(60);
    // Instants at other times of day than the occurrences, spread over DST
    let excluded: Vec<_> = (0..60)
        .step_by(7)
        .map(|days| anchor + TimeDelta::days(days) + TimeDelta::hours(6))
        .collect();
    let excluded_days: HashSet<_> = excluded.iter().map(|d| local_day(*d, tz)).collect();

    let opts = EvaluationOptions::in_time_zone("America/Chicago").with_excluded_dates(excluded);
    let occurrences = generate(anchor, &rule, &opts).expect("Failed to generate");

    assert!(!occurrences.is_empty());
    assert!(occurrences.len() < 60);
    for occurrence in &occurrences {
        assert!(
            !excluded_days.contains(&occurrence.local_date),
            "Excluded day {} was generated",
            occurrence.local_date
        );
    }

    let restored = generate(anchor, &rule, &opts.clone().including_excluded())
        .expect("Failed to generate");
    assert_eq!(restored.len(), 60);
}

#[test_log::test]
fn cap_is_min_of_count_and_max_occurrences() {
    let anchor = utc(2025, 1, 1, 9, 0);
    let opts = EvaluationOptions::default().with_max_occurrences(20);

    let long = RecurrenceRule::new(Frequency::Daily).with_count(50);
    assert_eq!(generate(anchor, &long, &opts).expect("generated").len(), 20);

    let short = RecurrenceRule::new(Frequency::Daily).with_count(10);
    assert_eq!(generate(anchor, &short, &opts).expect("generated").len(), 10);
}

#[test_log::test]
fn unbounded_rule_stops_at_engine_default() {
    let anchor = utc(2025, 1, 1, 9, 0);
    let rule = RecurrenceRule::new(Frequency::Daily);

    let unbounded = generate(anchor, &rule, &EvaluationOptions::default()).expect("generated");
    assert_eq!(unbounded.len(), DEFAULT_MAX_OCCURRENCES);

    let raised = EvaluationOptions::default().with_max_occurrences(DEFAULT_MAX_OCCURRENCES * 2);
    assert_eq!(
        generate(anchor, &rule, &raised).expect("generated").len(),
        DEFAULT_MAX_OCCURRENCES
    );
}

#[test_log::test]
fn output_is_ordered_and_unique() {
    let anchor = utc(2025, 1, 1, 9, 0);
    let rule = RecurrenceRule::new(Frequency::Monthly)
        .with_month_days(vec![1, 15, -1])
        .with_count(36);

    let occurrences =
        generate(anchor, &rule, &EvaluationOptions::default()).expect("generated");
    assert_eq!(occurrences.len(), 36);
    assert!(occurrences.windows(2).all(|pair| pair[0].instant_utc < pair[1].instant_utc));
}

#[test_log::test]
fn zero_interval_is_invalid() {
    let rule = RecurrenceRule::new(Frequency::Weekly).with_interval(0);
    let err = generate(utc(2025, 1, 1, 9, 0), &rule, &EvaluationOptions::default())
        .expect_err("interval 0 rejected");
    assert!(matches!(err, RuleError::InvalidRule(_)));
}

#[test_log::test]
fn unknown_frequency_is_invalid() {
    let err = "FREQ=HOURLY".parse::<RecurrenceRule>().expect_err("rejected");
    assert!(matches!(err, RuleError::InvalidRule(_)));
}

#[test_log::test]
fn unparseable_weekdays_yield_nothing() {
    let rule = RecurrenceRule::new(Frequency::Weekly).with_weekdays(["XX", "monday"]);
    let occurrences = generate(utc(2025, 1, 1, 9, 0), &rule, &EvaluationOptions::default())
        .expect("no runtime failure");
    assert!(occurrences.is_empty());
}
