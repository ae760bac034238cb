//! Recurra occurrence engine - integration test support.
//!
//! Re-exports the workspace crates under one `component` path for the
//! integration tests.

pub mod component {
    pub use recurra_core::{config, util};
    pub use recurra_rrule::{expand, rule};
    pub use recurra_service::{context, day, occurrence};

    pub mod db {
        pub use recurra_store::db::*;
    }

    pub mod model {
        pub use recurra_store::model::*;
    }

    pub mod error {
        pub use recurra_core::error::CoreError;
        pub use recurra_rrule::error::RuleError;
        pub use recurra_service::error::{ServiceError, ServiceResult};
        pub use recurra_store::error::StoreError;
    }

    pub mod app {
        pub use recurra_app::*;
    }
}
