use std::time::Duration;

use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub materializer: MaterializerConfig,
    pub logging: LoggingConfig,
    pub seed: SeedConfig,
}

/// Tuning for occurrence materialization and the read-only upcoming view.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterializerConfig {
    /// Occurrences kept materialized ahead for natively created series.
    pub default_lookahead: usize,
    /// Occurrences kept materialized ahead for externally sourced series.
    pub external_lookahead: usize,
    /// Wall-clock budget for building the upcoming-occurrences view.
    pub upcoming_timeout_ms: u64,
    /// Hard ceiling handed to the evaluator on every call.
    pub max_occurrences: usize,
}

impl MaterializerConfig {
    /// ## Summary
    /// Returns the upcoming-occurrences budget as a `Duration`.
    #[must_use]
    pub const fn upcoming_timeout(&self) -> Duration {
        Duration::from_millis(self.upcoming_timeout_ms)
    }

    /// ## Summary
    /// Checks that every limit is usable.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if a limit is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_occurrences == 0 {
            return Err(CoreError::ConfigError(
                "materializer.max_occurrences must be at least 1".to_string(),
            ));
        }
        if self.upcoming_timeout_ms == 0 {
            return Err(CoreError::ConfigError(
                "materializer.upcoming_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            default_lookahead: 5,
            external_lookahead: 2,
            upcoming_timeout_ms: 5000,
            max_occurrences: 730,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Location of the JSON file the job runner seeds its store from.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub path: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `config.toml` and environment variables into a `Settings`.
    /// Environment variables take precedence over file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails,
    /// or if the materializer limits are invalid.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("materializer.default_lookahead", 5)?
            .set_default("materializer.external_lookahead", 2)?
            .set_default("materializer.upcoming_timeout_ms", 5000)?
            .set_default("materializer.max_occurrences", 730)?
            .set_default("logging.level", "debug")?
            .set_default("seed.path", "seed.json")?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // RECURRA_MATERIALIZER__DEFAULT_LOOKAHEAD -> materializer.default_lookahead
            .add_source(
                config::Environment::with_prefix("RECURRA")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.materializer.validate()?;

        Ok(settings)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    if let Err(err) = dotenvy::dotenv() {
        tracing::debug!(error = %err, "No .env file loaded");
    }

    Settings::load()
}
