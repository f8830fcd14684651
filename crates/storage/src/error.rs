use thiserror::Error;

/// Persistence errors. Dedup correctness depends on the store, so callers
/// treat these as fatal at startup and abort the current cycle at runtime.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt row for listing {listing_id}: {reason}")]
    InvalidStatus { listing_id: String, reason: String },
}
