use keepsake_db::Collection;
use thiserror::Error;

/// Errors surfaced by the managers. None of them are retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The store could not be opened, or a read/write against it failed.
    #[error("Store unavailable: {0:#}")]
    StoreUnavailable(anyhow::Error),

    /// Input rejected before touching the store.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No record {id} in {collection}")]
    NotFound { collection: Collection, id: i64 },

    /// Backup version tag missing or not the one this build understands.
    #[error("Unsupported backup format version: {0:?}")]
    UnsupportedFormat(Option<u64>),

    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    #[error("Invalid image: {0}")]
    InvalidImage(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::StoreUnavailable(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
