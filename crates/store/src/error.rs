use thiserror::Error;

/// Errors that can occur when interacting with the order and inventory store.
///
/// Lost races are not errors: conditional updates report them through their
/// affected-row counts.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted row could not be mapped back to a record.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
