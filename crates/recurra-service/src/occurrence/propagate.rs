use chrono::{DateTime, Utc};
use recurra_store::db::all_series_events;
use recurra_store::model::event::EventUpdate;
use serde::Serialize;

use super::IntegrityFault;
use super::template::SeriesScope;
use crate::context::MaterializerContext;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationOutcome {
    pub updated_count: usize,
    pub faults: Vec<IntegrityFault>,
}

/// ## Summary
/// Applies `field_updates` to the series template, re-reads it, then copies
/// the template's display and business fields onto every other occurrence
/// starting at or after `from_date`. Values absent on the template are
/// cleared on the occurrences.
///
/// Occurrences keep their own dates. Each updated occurrence is read back;
/// one that vanished or lost its series link is reported as a fault and does
/// not count as updated.
///
/// ## Errors
/// Returns `NotFound` when the series or its template does not exist or the
/// template cannot be read back, and storage errors from the updates.
#[tracing::instrument(skip(ctx, field_updates))]
pub async fn update_future_occurrences(
    ctx: &MaterializerContext,
    series_slug: &str,
    from_date: DateTime<Utc>,
    field_updates: EventUpdate,
    actor: uuid::Uuid,
) -> ServiceResult<PropagationOutcome> {
    let scope = SeriesScope::load(ctx, series_slug).await?;
    let template_slug = scope
        .series
        .template_event_slug
        .clone()
        .ok_or_else(|| ServiceError::NotFound(format!("template of series {series_slug}")))?;
    if ctx.events.find_by_slug(&template_slug).await?.is_none() {
        return Err(ServiceError::NotFound(format!("event {template_slug}")));
    }

    ctx.events
        .update(&template_slug, field_updates, actor)
        .await?;
    let template = ctx
        .events
        .find_by_slug(&template_slug)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("event {template_slug} after update")))?;
    let propagated = EventUpdate::propagated_from(&template, scope.slug());

    let mut outcome = PropagationOutcome::default();
    let events = all_series_events(ctx.events.as_ref(), scope.slug()).await?;
    for event in events
        .iter()
        .filter(|event| event.slug != template_slug && event.start_date >= from_date)
    {
        ctx.events
            .update(&event.slug, propagated.clone(), actor)
            .await?;

        let fault = match ctx.events.find_by_slug(&event.slug).await? {
            Some(updated) => IntegrityFault::check_link(&updated, scope.slug()),
            None => Some(IntegrityFault::missing(&event.slug, scope.slug())),
        };
        match fault {
            Some(fault) => outcome.faults.push(fault),
            None => outcome.updated_count += 1,
        }
    }

    tracing::info!(
        updated = outcome.updated_count,
        faults = outcome.faults.len(),
        "Propagated template changes"
    );
    Ok(outcome)
}
