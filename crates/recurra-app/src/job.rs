//! Look-ahead job: keeps the next occurrences of every series materialized.

use recurra_service::context::MaterializerContext;
use recurra_service::occurrence::materialize_buffer_for_user;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub series: usize,
    pub created: usize,
    pub failed_dates: usize,
    pub failed_series: usize,
    pub faults: usize,
}

/// ## Summary
/// Runs the buffer top-up for each of `owners` in turn.
///
/// ## Errors
/// Returns an error if listing an owner's series fails. Failures inside a
/// series are counted, not returned.
pub async fn run_lookahead<I>(ctx: &MaterializerContext, owners: I) -> AppResult<JobSummary>
where
    I: IntoIterator<Item = uuid::Uuid>,
{
    let mut summary = JobSummary::default();

    for owner in owners {
        for buffer in materialize_buffer_for_user(ctx, owner).await? {
            summary.series += 1;
            match buffer.outcome {
                Ok(batch) => {
                    if let Some(partial) = batch.failure_summary() {
                        tracing::warn!(series_slug = %buffer.series_slug, error = %partial, "Look-ahead incomplete");
                    }
                    summary.created += batch.events.len();
                    summary.failed_dates += batch.failures.len();
                    summary.faults += batch.warnings.len();
                }
                Err(error) => {
                    tracing::error!(series_slug = %buffer.series_slug, %error, "Look-ahead failed");
                    summary.failed_series += 1;
                }
            }
        }
    }

    tracing::info!(?summary, "Look-ahead run finished");
    Ok(summary)
}
