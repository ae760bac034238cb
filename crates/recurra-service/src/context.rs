use std::sync::Arc;

use recurra_core::config::MaterializerConfig;
use recurra_store::db::{EventRepository, SeriesRepository};

/// Storage handles and tuning shared by every materializer operation.
///
/// Built once per tenant or request scope and passed explicitly; operations
/// keep no state of their own between calls.
#[derive(Clone)]
pub struct MaterializerContext {
    pub series: Arc<dyn SeriesRepository>,
    pub events: Arc<dyn EventRepository>,
    pub config: MaterializerConfig,
}

impl MaterializerContext {
    #[must_use]
    pub fn new(
        series: Arc<dyn SeriesRepository>,
        events: Arc<dyn EventRepository>,
        config: MaterializerConfig,
    ) -> Self {
        Self {
            series,
            events,
            config,
        }
    }

    /// Uses one store for both contracts.
    #[must_use]
    pub fn from_store<S>(store: Arc<S>, config: MaterializerConfig) -> Self
    where
        S: SeriesRepository + EventRepository + 'static,
    {
        Self {
            series: store.clone(),
            events: store,
            config,
        }
    }
}

impl std::fmt::Debug for MaterializerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterializerContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
