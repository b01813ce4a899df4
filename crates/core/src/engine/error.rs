//! Error types for the lifecycle engine.

use crate::registry::RegistryError;
use crate::state::LedgerError;
use crate::store::StoreError;
use thiserror::Error;

/// Prefix of the failure reason recorded when an entry cannot run its step.
pub const CONFIGURATION_ERROR: &str = "configuration error";

#[derive(Error, Debug)]
pub enum EngineError {
    /// Courses can't be flagged while there is no step to send them to.
    #[error("no step subplugin is enabled")]
    EmptyStepChain,

    #[error("step '{step}' of course {course_id} is not installed")]
    StepUnavailable { course_id: i64, step: String },

    #[error("course source failed: {0}")]
    Courses(anyhow::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Type alias for Result with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
