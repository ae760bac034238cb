use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use recurra_core::config::MaterializerConfig;
use recurra_rrule::expand::{
    EvaluationOptions, generate, local_to_utc_lenient, resolve_timezone, to_local,
};
use recurra_store::db::all_series_events;
use recurra_store::model::event::{Event, EventFields};
use recurra_store::model::series::EventSeries;
use serde::Serialize;

use crate::context::MaterializerContext;
use crate::day::{local_day, local_day_bounds};
use crate::error::{ServiceError, ServiceResult};

const SYNTHESIZED_DURATION: TimeDelta = TimeDelta::hours(1);

/// A loaded series with its resolved timezone.
#[derive(Debug, Clone)]
pub(crate) struct SeriesScope {
    pub series: EventSeries,
    pub tz: Tz,
}

impl SeriesScope {
    /// ## Errors
    /// Returns `NotFound` for an unknown slug and `BadRequest` when the series
    /// timezone cannot be resolved.
    pub async fn load(ctx: &MaterializerContext, series_slug: &str) -> ServiceResult<Self> {
        let series = ctx
            .series
            .find_by_slug(series_slug)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("series {series_slug}")))?;
        let tz = resolve_timezone(&series.time_zone)?;
        Ok(Self { series, tz })
    }

    pub fn slug(&self) -> &str {
        &self.series.slug
    }

    /// Evaluation options carrying the series timezone and exception dates.
    pub fn evaluation_options(&self, config: &MaterializerConfig) -> EvaluationOptions {
        EvaluationOptions::in_time_zone(self.series.time_zone.clone())
            .with_max_occurrences(config.max_occurrences)
            .with_excluded_dates(self.series.exception_dates.clone())
    }

    /// ## Summary
    /// Whether the rule, evaluated from `anchor`, yields an occurrence on the
    /// local `day`.
    ///
    /// ## Errors
    /// Returns an error if the rule cannot be evaluated.
    pub fn has_occurrence_on(
        &self,
        anchor: DateTime<Utc>,
        day: NaiveDate,
        config: &MaterializerConfig,
    ) -> ServiceResult<bool> {
        let (start, next_midnight) = local_day_bounds(day, self.tz)?;
        let opts = self
            .evaluation_options(config)
            .with_window(Some(start), Some(next_midnight - TimeDelta::seconds(1)));
        let occurrences = generate(anchor, &self.series.recurrence_rule, &opts)?;
        Ok(occurrences.iter().any(|occurrence| occurrence.local_date == day))
    }
}

/// Where a template's fields came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    /// The event named by the series.
    SeriesTemplate,
    /// The latest event already materialized for the series.
    LatestOccurrence,
    /// Built from the series itself with a one-hour duration.
    Synthesized,
}

/// Fields cloned onto a new occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub source: TemplateSource,
    pub event_slug: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub fields: EventFields,
    /// Instant the series rule is evaluated from.
    pub anchor: DateTime<Utc>,
}

impl Template {
    fn from_event(event: Event, source: TemplateSource, anchor: DateTime<Utc>) -> Self {
        Self {
            source,
            event_slug: Some(event.slug),
            name: event.name,
            description: event.description,
            start_date: event.start_date,
            end_date: event.end_date,
            fields: event.fields,
            anchor,
        }
    }

    fn synthesized(series: &EventSeries, start_date: DateTime<Utc>) -> Self {
        Self {
            source: TemplateSource::Synthesized,
            event_slug: None,
            name: series.name.clone(),
            description: series.description.clone(),
            start_date,
            end_date: start_date + SYNTHESIZED_DURATION,
            fields: EventFields::default(),
            anchor: series.created_at,
        }
    }

    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end_date.signed_duration_since(self.start_date)
    }

    /// Whether `day` is the local day of the series' own template event.
    pub(crate) fn is_template_day(&self, day: NaiveDate, tz: Tz) -> bool {
        self.source == TemplateSource::SeriesTemplate && local_day(self.start_date, tz) == day
    }
}

/// ## Summary
/// Instant the series rule is evaluated from: the template start if there is
/// one, else the earliest stored occurrence, else the series creation time.
pub(crate) fn evaluation_anchor(
    series: &EventSeries,
    template: Option<&Event>,
    existing: &[Event],
) -> DateTime<Utc> {
    template
        .map(|event| event.start_date)
        .or_else(|| existing.iter().map(|event| event.start_date).min())
        .unwrap_or(series.created_at)
}

/// ## Summary
/// Resolves the template for a new occurrence of `scope`.
///
/// Falls back from the series template to the latest stored occurrence, and
/// from there to a template synthesized from the series. A synthesized
/// template starts on the local day of `requested` at the local time the
/// series was created, the time its rule is evaluated at.
///
/// ## Errors
/// Returns storage errors from the lookups.
#[tracing::instrument(skip(ctx, scope), fields(series_slug = %scope.slug()))]
pub(crate) async fn resolve_template(
    ctx: &MaterializerContext,
    scope: &SeriesScope,
    requested: DateTime<Utc>,
) -> ServiceResult<Template> {
    if let Some(template_slug) = &scope.series.template_event_slug {
        if let Some(event) = ctx.events.find_by_slug(template_slug).await? {
            let anchor = event.start_date;
            return Ok(Template::from_event(
                event,
                TemplateSource::SeriesTemplate,
                anchor,
            ));
        }
        tracing::warn!(
            template_event_slug = %template_slug,
            "Series template event missing, falling back"
        );
    }

    let existing = all_series_events(ctx.events.as_ref(), scope.slug()).await?;
    let anchor = evaluation_anchor(&scope.series, None, &existing);
    if let Some(latest) = existing.into_iter().max_by_key(|event| event.start_date) {
        tracing::debug!(event_slug = %latest.slug, "Using latest occurrence as template");
        return Ok(Template::from_event(
            latest,
            TemplateSource::LatestOccurrence,
            anchor,
        ));
    }

    let wall_clock = to_local(scope.series.created_at, scope.tz).time();
    let start_date =
        local_to_utc_lenient(local_day(requested, scope.tz).and_time(wall_clock), scope.tz)?;
    tracing::debug!(%start_date, "Synthesizing template from series");
    Ok(Template::synthesized(&scope.series, start_date))
}
