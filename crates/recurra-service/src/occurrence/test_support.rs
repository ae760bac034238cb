use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use recurra_core::config::MaterializerConfig;
use recurra_rrule::rule::{Frequency, RecurrenceRule};
use recurra_store::db::memory::MemoryStore;
use recurra_store::db::{EventRepository, SeriesRepository};
use recurra_store::model::event::{Event, EventFields, NewEvent};
use recurra_store::model::series::EventSeries;

use crate::context::MaterializerContext;

pub(crate) fn weekly_rule() -> RecurrenceRule {
    RecurrenceRule::new(Frequency::Weekly).with_weekdays(["WE"])
}

pub(crate) fn template_event(slug: &str, series_slug: &str, start: DateTime<Utc>) -> NewEvent {
    NewEvent {
        slug: slug.to_string(),
        series_slug: Some(series_slug.to_string()),
        name: "Standup".to_string(),
        description: Some("Daily sync".to_string()),
        start_date: start,
        end_date: start + TimeDelta::minutes(90),
        time_zone: "America/Los_Angeles".to_string(),
        fields: EventFields {
            location: Some("Room 4".to_string()),
            max_attendees: Some(12),
            ..EventFields::default()
        },
        original_occurrence_date: None,
    }
}

pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub ctx: MaterializerContext,
    pub user: uuid::Uuid,
    pub template_start: DateTime<Utc>,
}

impl Fixture {
    pub fn empty() -> Self {
        Self::with_config(MaterializerConfig::default())
    }

    pub fn with_config(config: MaterializerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let ctx = MaterializerContext::from_store(store.clone(), config);
        Self {
            store,
            ctx,
            user: uuid::Uuid::now_v7(),
            // Wednesday 2025-10-15 19:00 in Los Angeles
            template_start: Utc.with_ymd_and_hms(2025, 10, 16, 2, 0, 0).unwrap(),
        }
    }

    /// Weekly Wednesday 7pm Los Angeles series `standup` with template
    /// `standup-template`.
    pub async fn los_angeles_weekly() -> Self {
        Self::los_angeles_weekly_with(MaterializerConfig::default()).await
    }

    pub async fn los_angeles_weekly_with(config: MaterializerConfig) -> Self {
        let fixture = Self::with_config(config);
        fixture
            .add_series(
                EventSeries::new(
                    "standup",
                    "Standup",
                    "America/Los_Angeles",
                    weekly_rule(),
                    fixture.user,
                )
                .with_template("standup-template"),
            )
            .await;
        fixture
            .add_event(template_event(
                "standup-template",
                "standup",
                fixture.template_start,
            ))
            .await;
        fixture
    }

    pub async fn add_series(&self, series: EventSeries) {
        SeriesRepository::create(self.store.as_ref(), series)
            .await
            .unwrap();
    }

    pub async fn add_event(&self, event: NewEvent) -> Event {
        EventRepository::create(self.store.as_ref(), event, self.user)
            .await
            .unwrap()
    }
}
