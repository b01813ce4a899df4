//! Lifecycle state of flagged courses.
//!
//! This module provides:
//! - Entry state machine logic and event emission ([`entry`])
//! - The persisted [`Ledger`] binding each course to its pipeline position

pub mod entry;
pub mod error;
pub mod ledger;

pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
