use chrono::TimeDelta;

use super::helpers::{TestEnv, utc};
use recurra_test::component::db::memory::Faults;
use recurra_test::component::model::event::{EventFieldsPatch, EventUpdate, EventVisibility};
use recurra_test::component::occurrence::{
    FaultKind, materialize_next_n_occurrences_as_of, update_future_occurrences,
};
use recurra_test::component::rule::{Frequency, RecurrenceRule};

async fn env_with_occurrences() -> TestEnv {
    let env = TestEnv::new();
    env.series_with_template(
        "club",
        "Australia/Sydney",
        RecurrenceRule::new(Frequency::Weekly),
        // Monday 2025-03-31 19:00 AEDT
        utc(2025, 3, 31, 8, 0),
        TimeDelta::hours(2),
    )
    .await;
    materialize_next_n_occurrences_as_of(
        &env.ctx,
        "club",
        env.owner,
        Some(4),
        utc(2025, 3, 30, 0, 0),
    )
    .await
    .expect("batch runs");
    env
}

fn private_in_new_room() -> EventUpdate {
    EventUpdate {
        description: Some("Moved upstairs".to_string()),
        fields: EventFieldsPatch {
            location: Some("Room 2".to_string()),
            visibility: Some(EventVisibility::Private),
            ..EventFieldsPatch::default()
        },
        ..EventUpdate::default()
    }
}

#[test_log::test(tokio::test)]
async fn propagates_template_state_from_date_inclusive() {
    let env = env_with_occurrences().await;
    let all = recurra_test::component::db::all_series_events(env.ctx.events.as_ref(), "club")
        .await
        .expect("listed");
    assert_eq!(all.len(), 5);
    // Start of the second materialized occurrence, inclusive
    let from = all[2].start_date;

    let outcome =
        update_future_occurrences(&env.ctx, "club", from, private_in_new_room(), env.owner)
            .await
            .expect("propagation runs");

    assert_eq!(outcome.updated_count, 3);
    assert!(outcome.faults.is_empty());

    let after = recurra_test::component::db::all_series_events(env.ctx.events.as_ref(), "club")
        .await
        .expect("listed");
    for (before, event) in all.iter().zip(&after) {
        assert_eq!(before.start_date, event.start_date);
        assert_eq!(before.end_date, event.end_date);
        let expect_updated = event.slug == "club-template" || event.start_date >= from;
        assert_eq!(
            event.fields.location.as_deref() == Some("Room 2"),
            expect_updated,
            "{}",
            event.slug
        );
    }
    let last = after.last().expect("non-empty");
    assert_eq!(last.fields.visibility, EventVisibility::Private);
    assert_eq!(last.description.as_deref(), Some("Moved upstairs"));
    assert!(last.fields.require_approval);
}

#[test_log::test(tokio::test)]
async fn vanished_occurrence_is_reported() {
    let env = env_with_occurrences().await;
    env.store
        .set_faults(Faults {
            lose_on_update: ["club-20250414".to_string()].into(),
            ..Faults::default()
        })
        .await;

    let outcome = update_future_occurrences(
        &env.ctx,
        "club",
        utc(2025, 4, 1, 0, 0),
        private_in_new_room(),
        env.owner,
    )
    .await
    .expect("propagation runs");

    assert_eq!(outcome.updated_count, 3);
    assert_eq!(outcome.faults.len(), 1);
    assert_eq!(outcome.faults[0].kind, FaultKind::MissingAfterUpdate);
    assert_eq!(outcome.faults[0].event_slug, "club-20250414");
}
