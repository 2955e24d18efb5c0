//! Error types for the memory engine.

use thiserror::Error;

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the memory engine and its storage backends.
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected before any storage or network call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The database could not be reached. Callers may retry.
    #[error("database unavailable: {0}")]
    TransientIo(String),

    /// Any other database error.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// The embedding provider failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Local backend file or serialization failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Check if the error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransientIo(_))
    }

    /// Check if the error is the caller's fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => Error::TransientIo(err.to_string()),
            other => Error::Database(other),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
