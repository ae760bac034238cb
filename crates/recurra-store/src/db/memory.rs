//! In-process implementation of the storage contracts.
//!
//! All state sits behind one `RwLock`, so the per-day uniqueness check and the
//! insert it guards happen atomically. Fault hooks let tests simulate a
//! misbehaving backend.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use recurra_rrule::expand::{resolve_timezone, to_local};
use tokio::sync::RwLock;

use super::{EventRepository, Page, Pagination, SeriesRepository};
use crate::error::{StoreError, StoreResult};
use crate::model::event::{Event, EventUpdate, NewEvent};
use crate::model::series::EventSeries;

/// Injected misbehaviour, all off by default.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Local days (series timezone) on which event creation fails.
    pub fail_create_on: HashSet<NaiveDate>,
    /// Return created events with their series link removed.
    pub strip_series_slug: bool,
    /// Delay applied before every series event listing.
    pub read_delay: Option<Duration>,
    /// Slugs that disappear as soon as they are updated.
    pub lose_on_update: HashSet<String>,
}

#[derive(Debug, Default)]
struct State {
    series: HashMap<String, EventSeries>,
    events: HashMap<String, Event>,
    faults: Faults,
}

impl State {
    fn series_timezone(&self, series_slug: &str) -> StoreResult<Tz> {
        match self.series.get(series_slug) {
            Some(series) => Ok(resolve_timezone(&series.time_zone)?),
            None => Ok(Tz::UTC),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active fault hooks.
    pub async fn set_faults(&self, faults: Faults) {
        self.state.write().await.faults = faults;
    }

    /// Number of stored events linked to `series_slug`.
    pub async fn count_series_events(&self, series_slug: &str) -> usize {
        self.state
            .read()
            .await
            .events
            .values()
            .filter(|event| event.series_slug.as_deref() == Some(series_slug))
            .count()
    }
}

#[async_trait]
impl SeriesRepository for MemoryStore {
    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<EventSeries>> {
        Ok(self.state.read().await.series.get(slug).cloned())
    }

    async fn find_by_user(
        &self,
        user_id: uuid::Uuid,
        pagination: Pagination,
    ) -> StoreResult<Page<EventSeries>> {
        let state = self.state.read().await;
        let mut owned: Vec<_> = state
            .series
            .values()
            .filter(|series| series.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.slug.cmp(&b.slug)));

        Ok(paginate(owned, pagination))
    }

    async fn create(&self, series: EventSeries) -> StoreResult<EventSeries> {
        let mut state = self.state.write().await;
        if state.series.contains_key(&series.slug) {
            return Err(StoreError::SlugConflict(series.slug));
        }
        resolve_timezone(&series.time_zone)?;
        state.series.insert(series.slug.clone(), series.clone());
        tracing::debug!(series_slug = %series.slug, "Stored series");
        Ok(series)
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn create(&self, event: NewEvent, actor: uuid::Uuid) -> StoreResult<Event> {
        let mut state = self.state.write().await;

        if let Some(series_slug) = &event.series_slug {
            let tz = state.series_timezone(series_slug)?;
            let day = to_local(event.start_date, tz).date();

            if state.faults.fail_create_on.contains(&day) {
                return Err(StoreError::Backend(format!(
                    "injected create failure for {series_slug} on {day}"
                )));
            }

            let taken = state.events.values().any(|existing| {
                existing.series_slug.as_deref() == Some(series_slug.as_str())
                    && to_local(existing.start_date, tz).date() == day
            });
            if taken {
                return Err(StoreError::DuplicateOccurrence {
                    series_slug: series_slug.clone(),
                    day,
                });
            }
        }

        if state.events.contains_key(&event.slug) {
            return Err(StoreError::SlugConflict(event.slug));
        }

        let now = Utc::now();
        let stored = Event {
            id: uuid::Uuid::now_v7(),
            slug: event.slug,
            series_slug: event.series_slug,
            name: event.name,
            description: event.description,
            start_date: event.start_date,
            end_date: event.end_date,
            time_zone: event.time_zone,
            fields: event.fields,
            user_id: actor,
            original_occurrence_date: event.original_occurrence_date,
            created_at: now,
            updated_at: now,
        };
        state.events.insert(stored.slug.clone(), stored.clone());
        tracing::debug!(event_slug = %stored.slug, series_slug = ?stored.series_slug, "Stored event");

        let mut returned = stored;
        if state.faults.strip_series_slug {
            returned.series_slug = None;
        }
        Ok(returned)
    }

    async fn update(
        &self,
        slug: &str,
        update: EventUpdate,
        _actor: uuid::Uuid,
    ) -> StoreResult<Event> {
        let mut state = self.state.write().await;
        let lose = state.faults.lose_on_update.contains(slug);

        let event = state
            .events
            .get_mut(slug)
            .ok_or_else(|| StoreError::NotFound(format!("event {slug}")))?;
        event.apply(&update);
        event.updated_at = Utc::now();
        let updated = event.clone();

        if lose {
            state.events.remove(slug);
        }
        Ok(updated)
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Event>> {
        Ok(self.state.read().await.events.get(slug).cloned())
    }

    async fn find_by_series_slug(
        &self,
        series_slug: &str,
        pagination: Pagination,
    ) -> StoreResult<Page<Event>> {
        let delay = self.state.read().await.faults.read_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.read().await;
        let mut linked: Vec<_> = state
            .events
            .values()
            .filter(|event| event.series_slug.as_deref() == Some(series_slug))
            .cloned()
            .collect();
        linked.sort_by_key(|event| event.start_date);

        Ok(paginate(linked, pagination))
    }
}

fn paginate<T>(items: Vec<T>, pagination: Pagination) -> Page<T> {
    let total = items.len();
    let items = items
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.limit)
        .collect();
    Page { items, total }
}
