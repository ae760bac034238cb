#![allow(clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Every test builds its own in-memory store, so tests run in parallel
//! without sharing state.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use recurra_test::component::config::MaterializerConfig;
use recurra_test::component::context::MaterializerContext;
use recurra_test::component::db::memory::MemoryStore;
use recurra_test::component::db::{EventRepository, SeriesRepository};
use recurra_test::component::expand::to_local;
use recurra_test::component::model::event::{Event, EventFields, NewEvent};
use recurra_test::component::model::series::EventSeries;
use recurra_test::component::rule::RecurrenceRule;

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub ctx: MaterializerContext,
    pub owner: uuid::Uuid,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(MaterializerConfig::default())
    }

    pub fn with_config(config: MaterializerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let ctx = MaterializerContext::from_store(store.clone(), config);
        Self {
            store,
            ctx,
            owner: uuid::Uuid::now_v7(),
        }
    }

    /// ## Summary
    /// Stores a series named after `slug` whose template `<slug>-template`
    /// starts at `start` and lasts `duration`.
    pub async fn series_with_template(
        &self,
        slug: &str,
        time_zone: &str,
        rule: RecurrenceRule,
        start: DateTime<Utc>,
        duration: TimeDelta,
    ) -> Event {
        let template_slug = format!("{slug}-template");
        SeriesRepository::create(
            self.store.as_ref(),
            EventSeries::new(slug, slug, time_zone, rule, self.owner).with_template(&template_slug),
        )
        .await
        .expect("Failed to store series");

        EventRepository::create(
            self.store.as_ref(),
            NewEvent {
                slug: template_slug,
                series_slug: Some(slug.to_string()),
                name: format!("{slug} template"),
                description: Some("Template description".to_string()),
                start_date: start,
                end_date: start + duration,
                time_zone: time_zone.to_string(),
                fields: EventFields {
                    location: Some("Main hall".to_string()),
                    max_attendees: Some(40),
                    require_approval: true,
                    ..EventFields::default()
                },
                original_occurrence_date: None,
            },
            self.owner,
        )
        .await
        .expect("Failed to store template")
    }
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid UTC instant")
}

pub fn local_time(instant: DateTime<Utc>, tz: Tz) -> NaiveTime {
    to_local(instant, tz).time()
}
