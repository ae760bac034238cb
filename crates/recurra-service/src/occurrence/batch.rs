use chrono::{DateTime, Utc};
use recurra_core::config::MaterializerConfig;
use recurra_store::db::Pagination;
use recurra_store::model::event::Event;
use recurra_store::model::series::{EventSeries, SeriesSource};
use serde::Serialize;

use super::IntegrityFault;
use super::materialize::materialize_in_scope;
use super::template::SeriesScope;
use super::upcoming::get_upcoming_occurrences_as_of;
use crate::context::MaterializerContext;
use crate::error::{ServiceError, ServiceResult};

/// An occurrence date that could not be materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub date: DateTime<Utc>,
    pub error: String,
}

/// Result of a batch run. Failures do not stop the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub events: Vec<Event>,
    pub failures: Vec<BatchFailure>,
    pub warnings: Vec<IntegrityFault>,
}

impl BatchOutcome {
    /// `PartialBatchFailure` if any date failed.
    #[must_use]
    pub fn failure_summary(&self) -> Option<ServiceError> {
        (!self.failures.is_empty()).then(|| ServiceError::PartialBatchFailure {
            succeeded: self.events.len(),
            failed: self.failures.len(),
        })
    }
}

/// Number of occurrences to keep materialized ahead for `series`.
///
/// An explicit request wins. Otherwise the per-source default applies, raised
/// to the rule's own `count` when that is larger.
fn lookahead_for(
    series: &EventSeries,
    config: &MaterializerConfig,
    requested: Option<usize>,
) -> usize {
    let lookahead = requested.unwrap_or_else(|| {
        let default = match series.source_type {
            SeriesSource::Native => config.default_lookahead,
            SeriesSource::External => config.external_lookahead,
        };
        series
            .recurrence_rule
            .count
            .and_then(|count| usize::try_from(count).ok())
            .map_or(default, |count| count.max(default))
    });
    lookahead.min(config.max_occurrences)
}

/// ## Summary
/// Materializes the next `count` unmaterialized occurrences of
/// `series_slug`, in date order.
///
/// Each date is attempted independently; failures are collected in the
/// outcome. A partial upcoming view still drives the batch.
///
/// ## Errors
/// Returns `NotFound` if the series does not exist.
pub async fn materialize_next_n_occurrences(
    ctx: &MaterializerContext,
    series_slug: &str,
    actor: uuid::Uuid,
    count: Option<usize>,
) -> ServiceResult<BatchOutcome> {
    materialize_next_n_occurrences_as_of(ctx, series_slug, actor, count, Utc::now()).await
}

/// [`materialize_next_n_occurrences`] with an explicit notion of "now".
///
/// ## Errors
/// Returns `NotFound` if the series does not exist.
#[tracing::instrument(skip(ctx))]
pub async fn materialize_next_n_occurrences_as_of(
    ctx: &MaterializerContext,
    series_slug: &str,
    actor: uuid::Uuid,
    count: Option<usize>,
    now: DateTime<Utc>,
) -> ServiceResult<BatchOutcome> {
    let scope = SeriesScope::load(ctx, series_slug).await?;
    let lookahead = lookahead_for(&scope.series, &ctx.config, count);

    let upcoming = get_upcoming_occurrences_as_of(ctx, series_slug, lookahead, false, now).await;
    if let Some(error) = &upcoming.error {
        tracing::warn!(%error, "Materializing from a partial upcoming view");
    }

    let mut pending: Vec<_> = upcoming.pending_dates().collect();
    pending.sort();

    let mut outcome = BatchOutcome::default();
    for date in pending {
        match materialize_in_scope(ctx, &scope, date, actor).await {
            Ok(materialized) => {
                outcome.warnings.extend(materialized.warnings);
                outcome.events.push(materialized.event);
            }
            Err(err) => {
                tracing::warn!(%date, error = %err, "Failed to materialize occurrence");
                outcome.failures.push(BatchFailure {
                    date,
                    error: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        lookahead,
        created = outcome.events.len(),
        failed = outcome.failures.len(),
        "Materialized upcoming occurrences"
    );
    Ok(outcome)
}

/// Batch result for one series of a buffer run.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBuffer {
    pub series_slug: String,
    pub outcome: Result<BatchOutcome, String>,
}

/// ## Summary
/// Tops up the look-ahead buffer of every series owned by `user_id`.
///
/// A failing series is recorded and does not stop the others.
///
/// ## Errors
/// Returns storage errors from listing the user's series.
#[tracing::instrument(skip(ctx))]
pub async fn materialize_buffer_for_user(
    ctx: &MaterializerContext,
    user_id: uuid::Uuid,
) -> ServiceResult<Vec<SeriesBuffer>> {
    let mut pagination = Pagination::default();
    let mut buffers = Vec::new();

    loop {
        let page = ctx.series.find_by_user(user_id, pagination).await?;
        let more = page.has_more(pagination) && !page.items.is_empty();

        for series in page.items {
            let outcome = materialize_next_n_occurrences(ctx, &series.slug, user_id, None)
                .await
                .map_err(|err| {
                    tracing::warn!(series_slug = %series.slug, error = %err, "Buffer run failed");
                    err.to_string()
                });
            buffers.push(SeriesBuffer {
                series_slug: series.slug,
                outcome,
            });
        }

        if !more {
            break;
        }
        pagination = pagination.next();
    }

    Ok(buffers)
}
