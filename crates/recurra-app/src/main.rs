use std::path::Path;
use std::sync::Arc;

use recurra_app::job::run_lookahead;
use recurra_app::seed::{SeedFile, apply_seed, load_seed};
use recurra_core::config::load_config;
use recurra_service::context::MaterializerContext;
use recurra_service::occurrence::get_upcoming_occurrences;
use recurra_store::db::memory::MemoryStore;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Recurra occurrence engine");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let store = Arc::new(MemoryStore::new());
    let ctx = MaterializerContext::from_store(store, config.materializer.clone());

    let seed_path = Path::new(&config.seed.path);
    let seed = if seed_path.exists() {
        load_seed(seed_path).await?
    } else {
        tracing::warn!(path = %seed_path.display(), "Seed file not found, starting empty");
        SeedFile::default()
    };
    let seeded = apply_seed(&ctx, seed).await?;

    run_lookahead(&ctx, seeded.owners.iter().copied()).await?;

    for series_slug in &seeded.series_slugs {
        let upcoming = get_upcoming_occurrences(
            &ctx,
            series_slug,
            config.materializer.default_lookahead,
            false,
        )
        .await;
        let report = serde_json::json!({ "series": series_slug, "upcoming": upcoming });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
