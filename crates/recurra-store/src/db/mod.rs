//! Storage contracts consumed by the materializer.
//!
//! Implementations own their consistency discipline. An event repository
//! must reject a second event for the same series on the same local day
//! (series timezone) with `StoreError::DuplicateOccurrence`; the
//! materializer's own existence check is only an optimization.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::event::{Event, EventUpdate, NewEvent};
use crate::model::series::EventSeries;

pub mod memory;

/// One-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

impl Pagination {
    #[must_use]
    pub const fn new(page: usize, limit: usize) -> Self {
        Self { page, limit }
    }

    #[must_use]
    pub const fn first(limit: usize) -> Self {
        Self { page: 1, limit }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            page: self.page + 1,
            limit: self.limit,
        }
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first(100)
    }
}

/// A page of results with the total number of matching records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> Page<T> {
    /// Whether records remain after this page.
    #[must_use]
    pub const fn has_more(&self, pagination: Pagination) -> bool {
        pagination.offset() + self.items.len() < self.total
    }
}

#[async_trait]
pub trait SeriesRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<EventSeries>>;

    /// Series owned by `user_id`, ordered by creation time.
    async fn find_by_user(
        &self,
        user_id: uuid::Uuid,
        pagination: Pagination,
    ) -> StoreResult<Page<EventSeries>>;

    async fn create(&self, series: EventSeries) -> StoreResult<EventSeries>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Persists a new event owned by `actor` and returns its stored state.
    async fn create(&self, event: NewEvent, actor: uuid::Uuid) -> StoreResult<Event>;

    /// Applies `update` to the event with `slug` and returns its latest state.
    async fn update(
        &self,
        slug: &str,
        update: EventUpdate,
        actor: uuid::Uuid,
    ) -> StoreResult<Event>;

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Event>>;

    /// Events linked to `series_slug`, ordered by start date.
    async fn find_by_series_slug(
        &self,
        series_slug: &str,
        pagination: Pagination,
    ) -> StoreResult<Page<Event>>;
}

/// ## Summary
/// Reads every event of a series by walking `find_by_series_slug` pages.
///
/// ## Errors
/// Returns the first storage error encountered.
pub async fn all_series_events(
    events: &dyn EventRepository,
    series_slug: &str,
) -> StoreResult<Vec<Event>> {
    let mut pagination = Pagination::default();
    let mut all = Vec::new();

    loop {
        let page = events.find_by_series_slug(series_slug, pagination).await?;
        let more = page.has_more(pagination) && !page.items.is_empty();
        all.extend(page.items);
        if !more {
            break;
        }
        pagination = pagination.next();
    }

    tracing::trace!(series_slug, count = all.len(), "Loaded series events");
    Ok(all)
}
