use std::path::Path;

use recurra_test::component::app::job::run_lookahead;
use recurra_test::component::app::seed::{apply_seed, load_seed};
use recurra_test::component::occurrence::get_upcoming_occurrences;

use super::helpers::TestEnv;

const SEED_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../seed.json");

/// ## Summary
/// The bundled seed loads and the look-ahead job fills each series to its
/// per-source depth.
#[test_log::test(tokio::test)]
async fn bundled_seed_runs_lookahead() {
    let env = TestEnv::new();
    let seed = load_seed(Path::new(SEED_PATH))
        .await
        .expect("Failed to load seed");
    let seeded = apply_seed(&env.ctx, seed).await.expect("Failed to apply seed");
    assert_eq!(seeded.series_slugs.len(), 3);
    assert_eq!(seeded.owners.len(), 2);

    let summary = run_lookahead(&env.ctx, seeded.owners.iter().copied())
        .await
        .expect("Look-ahead failed");
    assert_eq!(summary.series, 3);
    assert_eq!(summary.failed_dates, 0);
    assert_eq!(summary.failed_series, 0);
    // Native series keep five ahead, the external feed two
    assert_eq!(summary.created, 12);

    let rerun = run_lookahead(&env.ctx, seeded.owners.iter().copied())
        .await
        .expect("Look-ahead failed");
    assert_eq!(rerun.created, 0);

    let upcoming = get_upcoming_occurrences(&env.ctx, "board-games", 5, false).await;
    assert!(upcoming.error.is_none());
    assert_eq!(upcoming.pending_dates().count(), 0);

    let json = serde_json::to_value(&upcoming).expect("serializable");
    let first = &json["occurrences"][0];
    assert_eq!(first["isTemplate"], true);
    assert_eq!(first["eventSlug"], "board-games-template");
    assert!(json["error"].is_null());
}
