//! Error types for backup operations.

use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("backup {0} not found")]
    NotFound(i64),

    /// The platform could not produce or restore the archive.
    #[error("backup backend failed: {0}")]
    Backend(#[from] anyhow::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Type alias for Result with BackupError.
pub type BackupResult<T> = Result<T, BackupError>;
