use std::sync::Arc;

use chrono::TimeDelta;
use futures::future::join_all;

use super::helpers::{TestEnv, utc};
use recurra_test::component::db::memory::Faults;
use recurra_test::component::error::{ServiceError, StoreError};
use recurra_test::component::occurrence::{
    FaultKind, find_occurrence, get_or_create_occurrence, materialize_occurrence,
};
use recurra_test::component::rule::{Frequency, RecurrenceRule};

async fn weekly_env() -> TestEnv {
    let env = TestEnv::new();
    env.series_with_template(
        "meetup",
        "America/Los_Angeles",
        RecurrenceRule::new(Frequency::Weekly).with_weekdays(["TH"]),
        // Thursday 2025-10-16 18:30 PDT
        utc(2025, 10, 17, 1, 30),
        TimeDelta::hours(3),
    )
    .await;
    env
}

#[test_log::test(tokio::test)]
async fn sequential_get_or_create_returns_same_event() {
    let env = weekly_env().await;
    let requested = utc(2025, 10, 24, 1, 30);

    let first = get_or_create_occurrence(&env.ctx, "meetup", requested, env.owner)
        .await
        .expect("first call");
    let second = get_or_create_occurrence(&env.ctx, "meetup", requested, env.owner)
        .await
        .expect("second call");

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.event.slug, second.event.slug);
    assert_eq!(first.event.id, second.event.id);
    assert_eq!(env.store.count_series_events("meetup").await, 2);
}

#[test_log::test(tokio::test)]
async fn concurrent_get_or_create_persists_one_event() {
    let env = weekly_env().await;
    // Different instants, same local day (2025-10-30 in Los Angeles)
    let instants = [
        utc(2025, 10, 30, 16, 0),
        utc(2025, 10, 31, 1, 30),
        utc(2025, 10, 31, 6, 0),
    ];

    let calls = (0..12).map(|i| {
        get_or_create_occurrence(&env.ctx, "meetup", instants[i % instants.len()], env.owner)
    });
    let results = join_all(calls).await;

    let mut ids: Vec<_> = results
        .into_iter()
        .map(|result| result.expect("every caller succeeds").event.id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(env.store.count_series_events("meetup").await, 2);
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_tasks_persist_one_event() {
    let env = Arc::new(weekly_env().await);
    let requested = utc(2025, 11, 7, 2, 30);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let env = env.clone();
            tokio::spawn(async move {
                get_or_create_occurrence(&env.ctx, "meetup", requested, env.owner)
                    .await
                    .map(|materialized| materialized.event.id)
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.expect("task joined").expect("call succeeded"));
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(env.store.count_series_events("meetup").await, 2);
}

#[test_log::test(tokio::test)]
async fn find_occurrence_is_typed_not_found() {
    let env = weekly_env().await;

    let absent = find_occurrence(&env.ctx, "meetup", utc(2025, 10, 24, 1, 30))
        .await
        .expect("lookup succeeds");
    assert!(absent.is_none());

    let err = find_occurrence(&env.ctx, "no-such-series", utc(2025, 10, 24, 1, 30))
        .await
        .expect_err("unknown series");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[test_log::test(tokio::test)]
async fn materialize_rejects_non_occurrence_day() {
    let env = weekly_env().await;
    // Friday
    let err = materialize_occurrence(&env.ctx, "meetup", utc(2025, 10, 25, 1, 30), env.owner)
        .await
        .expect_err("not a Thursday");
    assert!(matches!(err, ServiceError::BadRequest(_)));
    assert_eq!(env.store.count_series_events("meetup").await, 1);
}

#[test_log::test(tokio::test)]
async fn materialize_on_template_day_is_duplicate() {
    let env = weekly_env().await;
    let err = materialize_occurrence(&env.ctx, "meetup", utc(2025, 10, 16, 20, 0), env.owner)
        .await
        .expect_err("template already owns the day");
    assert!(matches!(
        err,
        ServiceError::StoreError(StoreError::DuplicateOccurrence { .. })
    ));
}

#[test_log::test(tokio::test)]
async fn dropped_series_link_is_surfaced_as_warning() {
    let env = weekly_env().await;
    env.store
        .set_faults(Faults {
            strip_series_slug: true,
            ..Faults::default()
        })
        .await;

    let materialized =
        materialize_occurrence(&env.ctx, "meetup", utc(2025, 10, 24, 1, 30), env.owner)
            .await
            .expect("event still created");

    assert_eq!(materialized.warnings.len(), 1);
    let fault = &materialized.warnings[0];
    assert_eq!(fault.kind, FaultKind::SeriesLinkMismatch);
    assert_eq!(fault.event_slug, "meetup-20251023");
    assert_eq!(fault.expected_series_slug, "meetup");
    assert!(fault.actual_series_slug.is_none());
}
