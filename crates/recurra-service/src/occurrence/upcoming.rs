use std::collections::HashSet;

use chrono::{DateTime, Utc};
use recurra_rrule::expand::generate;
use recurra_store::db::all_series_events;
use recurra_store::model::event::Event;
use serde::Serialize;

use super::template::{SeriesScope, evaluation_anchor};
use crate::context::MaterializerContext;
use crate::day::local_day;
use crate::error::{ServiceError, ServiceResult};

/// One entry of the upcoming view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceResult {
    pub date: DateTime<Utc>,
    pub materialized: bool,
    pub event_slug: Option<String>,
    pub is_template: bool,
}

impl OccurrenceResult {
    fn template(event: &Event) -> Self {
        Self {
            date: event.start_date,
            materialized: true,
            event_slug: Some(event.slug.clone()),
            is_template: true,
        }
    }

    fn stored(event: &Event) -> Self {
        Self {
            date: event.start_date,
            materialized: true,
            event_slug: Some(event.slug.clone()),
            is_template: false,
        }
    }

    const fn pending(date: DateTime<Utc>) -> Self {
        Self {
            date,
            materialized: false,
            event_slug: None,
            is_template: false,
        }
    }
}

/// Merged view of stored and computed occurrences, ordered by date.
///
/// `error` is set when the view is partial because collection failed or ran
/// out of time; whatever was gathered before that is still returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpcomingOccurrences {
    pub occurrences: Vec<OccurrenceResult>,
    pub error: Option<String>,
}

impl UpcomingOccurrences {
    /// Dates that have no stored event yet.
    pub fn pending_dates(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.occurrences
            .iter()
            .filter(|occurrence| !occurrence.materialized)
            .map(|occurrence| occurrence.date)
    }
}

/// ## Summary
/// Lists the template, the stored occurrences and up to `count` dates of
/// `series_slug`, skipping days that already have an event.
///
/// Never fails: errors and timeouts are reported in
/// [`UpcomingOccurrences::error`] alongside the partial result.
pub async fn get_upcoming_occurrences(
    ctx: &MaterializerContext,
    series_slug: &str,
    count: usize,
    include_past: bool,
) -> UpcomingOccurrences {
    get_upcoming_occurrences_as_of(ctx, series_slug, count, include_past, Utc::now()).await
}

/// [`get_upcoming_occurrences`] with an explicit notion of "now".
#[tracing::instrument(skip(ctx))]
pub async fn get_upcoming_occurrences_as_of(
    ctx: &MaterializerContext,
    series_slug: &str,
    count: usize,
    include_past: bool,
    now: DateTime<Utc>,
) -> UpcomingOccurrences {
    let budget = ctx.config.upcoming_timeout();
    let mut collected = Vec::new();

    let outcome = tokio::time::timeout(
        budget,
        collect_upcoming(ctx, series_slug, count, include_past, now, &mut collected),
    )
    .await;

    let error = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Upcoming occurrences incomplete");
            Some(err.to_string())
        }
        Err(_elapsed) => {
            tracing::warn!(?budget, "Upcoming occurrences timed out");
            Some(ServiceError::Timeout(budget).to_string())
        }
    };

    UpcomingOccurrences {
        occurrences: select(collected, count, include_past, now),
        error,
    }
}

async fn collect_upcoming(
    ctx: &MaterializerContext,
    series_slug: &str,
    count: usize,
    include_past: bool,
    now: DateTime<Utc>,
    collected: &mut Vec<OccurrenceResult>,
) -> ServiceResult<()> {
    let scope = SeriesScope::load(ctx, series_slug).await?;
    let mut taken_days = HashSet::new();

    let template = match &scope.series.template_event_slug {
        Some(slug) => ctx.events.find_by_slug(slug).await?,
        None => None,
    };
    if let Some(template) = &template {
        taken_days.insert(local_day(template.start_date, scope.tz));
        collected.push(OccurrenceResult::template(template));
    }

    let existing = all_series_events(ctx.events.as_ref(), scope.slug()).await?;
    for event in &existing {
        if template.as_ref().is_some_and(|t| t.slug == event.slug) {
            continue;
        }
        taken_days.insert(local_day(event.start_date, scope.tz));
        collected.push(OccurrenceResult::stored(event));
    }

    let anchor = evaluation_anchor(&scope.series, template.as_ref(), &existing);
    let cap = count
        .saturating_add(taken_days.len())
        .min(ctx.config.max_occurrences);
    let mut opts = scope
        .evaluation_options(&ctx.config)
        .with_max_occurrences(cap);
    if !include_past {
        opts.window_start = Some(now);
    }

    // Expansion runs on the blocking pool; an elapsed timeout abandons it.
    let rule = scope.series.recurrence_rule.clone();
    let occurrences = tokio::task::spawn_blocking(move || generate(anchor, &rule, &opts))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "Occurrence evaluation task failed");
            ServiceError::InvariantViolation("occurrence evaluation task failed")
        })??;

    for occurrence in occurrences {
        if taken_days.insert(occurrence.local_date) {
            collected.push(OccurrenceResult::pending(occurrence.instant_utc));
        }
    }

    Ok(())
}

/// Orders by date and keeps the template plus the first `count` visible
/// entries.
fn select(
    mut collected: Vec<OccurrenceResult>,
    count: usize,
    include_past: bool,
    now: DateTime<Utc>,
) -> Vec<OccurrenceResult> {
    collected.sort_by_key(|occurrence| occurrence.date);

    let mut visible = 0;
    collected.retain(|occurrence| {
        if occurrence.is_template {
            return true;
        }
        if (!include_past && occurrence.date < now) || visible >= count {
            return false;
        }
        visible += 1;
        true
    });
    collected
}
