//! Store error types.

use thiserror::Error;

/// Errors produced by [`SqliteStore`](crate::store::SqliteStore) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// File-system failure (e.g. creating the database directory).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection mutex was poisoned by a panicked thread.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// A JSON payload column could not be encoded or decoded.
    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A row holds a value the code does not understand.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Type alias for Result with StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_error_displays_context() {
        let inner = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            Some("table not found".into()),
        );
        let err = StoreError::Sqlite(inner);
        assert!(err.to_string().contains("sqlite"), "got: {err}");
    }

    #[test]
    fn lock_poisoned_displays() {
        assert_eq!(StoreError::LockPoisoned.to_string(), "store lock poisoned");
    }
}
