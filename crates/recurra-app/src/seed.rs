//! JSON seed data for the in-memory store.

use std::collections::BTreeSet;
use std::path::Path;

use recurra_core::error::CoreError;
use recurra_service::context::MaterializerContext;
use recurra_store::model::event::NewEvent;
use recurra_store::model::series::EventSeries;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFile {
    #[serde(default)]
    pub series: Vec<EventSeries>,
    #[serde(default)]
    pub events: Vec<SeedEvent>,
}

/// An event plus its owner. Without an explicit owner the owning series'
/// user is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedEvent {
    #[serde(default)]
    pub owner: Option<uuid::Uuid>,
    #[serde(flatten)]
    pub event: NewEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub series_slugs: Vec<String>,
    pub events: usize,
    pub owners: BTreeSet<uuid::Uuid>,
}

/// ## Summary
/// Reads and parses the seed file at `path`.
///
/// ## Errors
/// Returns an error if the file cannot be read or is not a valid seed.
pub async fn load_seed(path: &Path) -> AppResult<SeedFile> {
    let display = path.display().to_string();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AppError::SeedRead {
            path: display.clone(),
            source,
        })?;
    parse_seed(&text, &display)
}

/// ## Errors
/// Returns `SeedParse` if `text` is not a valid seed document.
pub fn parse_seed(text: &str, path: &str) -> AppResult<SeedFile> {
    serde_json::from_str(text).map_err(|source| AppError::SeedParse {
        path: path.to_string(),
        source,
    })
}

/// ## Summary
/// Stores every series, then every event, of `seed`.
///
/// ## Errors
/// Returns storage errors, or a validation error for an event whose owner
/// cannot be determined.
pub async fn apply_seed(ctx: &MaterializerContext, seed: SeedFile) -> AppResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    for series in &seed.series {
        ctx.series.create(series.clone()).await?;
        summary.series_slugs.push(series.slug.clone());
        summary.owners.insert(series.user_id);
    }

    for SeedEvent { owner, event } in seed.events {
        let owner = owner
            .or_else(|| owning_series(&seed.series, &event).map(|series| series.user_id))
            .ok_or_else(|| {
                CoreError::ValidationError(format!("seed event {} has no owner", event.slug))
            })?;
        ctx.events.create(event, owner).await?;
        summary.events += 1;
    }

    tracing::info!(
        series = summary.series_slugs.len(),
        events = summary.events,
        "Seed data loaded"
    );
    Ok(summary)
}

fn owning_series<'a>(series: &'a [EventSeries], event: &NewEvent) -> Option<&'a EventSeries> {
    let slug = event.series_slug.as_deref()?;
    series.iter().find(|series| series.slug == slug)
}
