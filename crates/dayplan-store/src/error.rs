//! Error types for the dayplan-store crate.
//!
//! All storage operations return [`StoreError`] via [`StoreResult`].
//! Engine-level failures are fatal for the current operation: callers log
//! and re-throw, nothing here is retried automatically.

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A task collection column could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A schema migration failed.
    #[error("migration v{version} failed: {message}")]
    Migration { version: u32, message: String },

    /// The requested record was not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An insert collided with an existing record at the same email key.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// A credential check ran against a record whose password differs.
    #[error("password does not match the stored record")]
    InvalidCredentials,

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}
