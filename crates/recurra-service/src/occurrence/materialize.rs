use chrono::{DateTime, NaiveDate, Utc};
use recurra_core::util::slug::occurrence_slug;
use recurra_rrule::expand::{local_to_utc_lenient, to_local};
use recurra_store::model::event::NewEvent;

use super::template::{SeriesScope, Template, resolve_template};
use super::{IntegrityFault, Materialized};
use crate::context::MaterializerContext;
use crate::day::local_day;
use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Persists the occurrence of `series_slug` on the local day of
/// `occurrence_date`, cloned from the series template.
///
/// The occurrence keeps the template's local wall-clock start time and its
/// exact duration. A created event that comes back without its series link is
/// returned with an integrity warning rather than failing the call.
///
/// ## Errors
/// Returns `NotFound` for an unknown series, `BadRequest` when the day is not
/// an occurrence of the series, and `DuplicateOccurrence` from storage when
/// the day is already materialized.
#[tracing::instrument(skip(ctx))]
pub async fn materialize_occurrence(
    ctx: &MaterializerContext,
    series_slug: &str,
    occurrence_date: DateTime<Utc>,
    actor: uuid::Uuid,
) -> ServiceResult<Materialized> {
    let scope = SeriesScope::load(ctx, series_slug).await?;
    materialize_in_scope(ctx, &scope, occurrence_date, actor).await
}

pub(crate) async fn materialize_in_scope(
    ctx: &MaterializerContext,
    scope: &SeriesScope,
    occurrence_date: DateTime<Utc>,
    actor: uuid::Uuid,
) -> ServiceResult<Materialized> {
    let template = resolve_template(ctx, scope, occurrence_date).await?;
    let day = local_day(occurrence_date, scope.tz);

    if !template.is_template_day(day, scope.tz)
        && !scope.has_occurrence_on(template.anchor, day, &ctx.config)?
    {
        return Err(ServiceError::BadRequest(format!(
            "{day} is not an occurrence of series {}",
            scope.slug()
        )));
    }

    let new_event = derive_occurrence(scope, &template, day)?;
    tracing::debug!(
        event_slug = %new_event.slug,
        start = %new_event.start_date,
        template_source = ?template.source,
        "Materializing occurrence"
    );

    let event = ctx.events.create(new_event, actor).await?;
    let warnings = IntegrityFault::check_link(&event, scope.slug())
        .into_iter()
        .collect();

    Ok(Materialized {
        event,
        created: true,
        warnings,
    })
}

/// ## Summary
/// Builds the event for the local `day` from `template`: the template's local
/// start time on that day, resolved in the series timezone, plus the
/// template's duration.
///
/// ## Errors
/// Returns an error if the local start cannot be placed on the timeline.
pub(crate) fn derive_occurrence(
    scope: &SeriesScope,
    template: &Template,
    day: NaiveDate,
) -> ServiceResult<NewEvent> {
    let wall_clock = to_local(template.start_date, scope.tz).time();
    let start_date = local_to_utc_lenient(day.and_time(wall_clock), scope.tz)?;

    Ok(NewEvent {
        slug: occurrence_slug(scope.slug(), day),
        series_slug: Some(scope.slug().to_string()),
        name: template.name.clone(),
        description: template.description.clone(),
        start_date,
        end_date: start_date + template.duration(),
        time_zone: scope.series.time_zone.clone(),
        fields: template.fields.clone(),
        original_occurrence_date: Some(start_date),
    })
}
