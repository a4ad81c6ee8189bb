//! Keepsake core: conversation, photos and backups for a two-person page.
//!
//! Everything sits on one [`Database`] handle opened at start and passed in
//! explicitly. Manager methods are async; store calls run on tokio's blocking
//! pool so the caller's runtime is never stalled.

pub mod backup;
pub mod config;
pub mod conversation;
pub mod error;
pub mod imaging;
pub mod letters;
pub mod photos;

pub use backup::{Backup, ImportSummary};
pub use config::Config;
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use imaging::ImageConfig;
pub use photos::Photos;

pub use keepsake_db::Database;
pub use keepsake_types as types;

use std::sync::Arc;

use tracing::{error, info};

/// The three managers sharing one opened store.
#[derive(Clone)]
pub struct Keepsake {
    pub conversation: Conversation,
    pub photos: Photos,
    pub backup: Backup,
}

impl Keepsake {
    /// Open the store at `config.db_path`. Fails with `StoreUnavailable`.
    pub fn open(config: &Config) -> Result<Self> {
        let db = Database::open(&config.db_path).map_err(Error::StoreUnavailable)?;
        Ok(Self::with_database(Arc::new(db), config.image))
    }

    pub fn with_database(db: Arc<Database>, image: ImageConfig) -> Self {
        info!(
            "Keepsake ready (max image dimension {}px, JPEG quality {})",
            image.max_dimension, image.jpeg_quality
        );
        Self {
            conversation: Conversation::new(db.clone()),
            photos: Photos::new(db.clone(), image),
            backup: Backup::new(db),
        }
    }
}

/// Used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "keepsake_core=debug,keepsake_db=info";

/// Install the fmt subscriber, honouring `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .try_init();
}

/// Run a store call off the async runtime.
pub(crate) async fn blocking<F, T>(db: &Arc<Database>, f: F) -> Result<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            Error::StoreUnavailable(e.into())
        })?
        .map_err(|e| {
            error!("Store error: {:#}", e);
            Error::StoreUnavailable(e)
        })
}

/// Current time truncated to the millisecond precision the store keeps.
pub(crate) fn now() -> chrono::DateTime<chrono::Utc> {
    from_millis(chrono::Utc::now().timestamp_millis())
}

pub(crate) fn from_millis(ms: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
