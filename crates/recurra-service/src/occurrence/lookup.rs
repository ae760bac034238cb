use chrono::{DateTime, Utc};
use recurra_store::db::all_series_events;
use recurra_store::error::StoreError;
use recurra_store::model::event::Event;

use super::Materialized;
use super::materialize::materialize_in_scope;
use super::template::SeriesScope;
use crate::context::MaterializerContext;
use crate::day::{find_event_for_day, local_day};
use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Finds the stored event of `series_slug` on the local day of
/// `occurrence_date`.
///
/// The series template counts even when it is not linked to the series.
///
/// ## Errors
/// Returns `NotFound` if the series does not exist.
#[tracing::instrument(skip(ctx))]
pub async fn find_occurrence(
    ctx: &MaterializerContext,
    series_slug: &str,
    occurrence_date: DateTime<Utc>,
) -> ServiceResult<Option<Event>> {
    let scope = SeriesScope::load(ctx, series_slug).await?;
    find_in_scope(ctx, &scope, occurrence_date).await
}

pub(crate) async fn find_in_scope(
    ctx: &MaterializerContext,
    scope: &SeriesScope,
    occurrence_date: DateTime<Utc>,
) -> ServiceResult<Option<Event>> {
    let day = local_day(occurrence_date, scope.tz);
    let events = all_series_events(ctx.events.as_ref(), scope.slug()).await?;
    if let Some(found) = find_event_for_day(&events, day, scope.tz) {
        return Ok(Some(found.clone()));
    }

    let Some(template_slug) = &scope.series.template_event_slug else {
        return Ok(None);
    };
    let template = ctx.events.find_by_slug(template_slug).await?;
    Ok(template.filter(|template| local_day(template.start_date, scope.tz) == day))
}

/// ## Summary
/// Returns the occurrence of `series_slug` on the local day of
/// `occurrence_date`, materializing it if no event exists yet.
///
/// Concurrent callers for the same day all receive the same event: when the
/// store reports the day as taken, the winner's event is read back.
///
/// ## Errors
/// Returns the errors of [`super::find_occurrence`] and
/// [`super::materialize_occurrence`], except a lost creation race.
#[tracing::instrument(skip(ctx))]
pub async fn get_or_create_occurrence(
    ctx: &MaterializerContext,
    series_slug: &str,
    occurrence_date: DateTime<Utc>,
    actor: uuid::Uuid,
) -> ServiceResult<Materialized> {
    let scope = SeriesScope::load(ctx, series_slug).await?;
    if let Some(existing) = find_in_scope(ctx, &scope, occurrence_date).await? {
        tracing::trace!(event_slug = %existing.slug, "Occurrence already materialized");
        return Ok(Materialized::existing(existing));
    }

    match materialize_in_scope(ctx, &scope, occurrence_date, actor).await {
        Err(ServiceError::StoreError(StoreError::DuplicateOccurrence { day, .. })) => {
            tracing::debug!(%day, "Lost materialization race, reading winner");
            find_in_scope(ctx, &scope, occurrence_date)
                .await?
                .map(Materialized::existing)
                .ok_or(ServiceError::InvariantViolation(
                    "storage reported a duplicate occurrence that cannot be found",
                ))
        }
        other => other,
    }
}
