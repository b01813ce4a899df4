//! Error types for ledger operations.

use crate::store::StoreError;
use crate::subplugins::SubpluginError;
use cc_protocol::EntryStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("course {0} has no lifecycle entry")]
    NotFound(i64),

    #[error("entry for course {course_id} is {actual}, expected {expected}")]
    InvalidState {
        course_id: i64,
        expected: EntryStatus,
        actual: EntryStatus,
    },

    /// The entry changed since it was claimed; the result was not written.
    #[error("claim on course {0} was lost")]
    ClaimLost(i64),

    /// The current step refused the supplied input.
    #[error("input rejected: {0}")]
    InputRejected(#[from] SubpluginError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Type alias for Result with LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;
