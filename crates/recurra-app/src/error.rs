use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] recurra_service::error::ServiceError),

    #[error(transparent)]
    StoreError(#[from] recurra_store::error::StoreError),

    #[error(transparent)]
    CoreError(#[from] recurra_core::error::CoreError),

    #[error("Failed to read seed file {path}: {source}")]
    SeedRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid seed file {path}: {source}")]
    SeedParse {
        path: String,
        source: serde_json::Error,
    },
}

pub type AppResult<T> = std::result::Result<T, AppError>;
