//! Lifecycle ledger models.
//!
//! The ledger binds a course to its current position in the step pipeline.
//! These structures mirror the persisted rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Status of a course inside the step pipeline.
///
/// Normal progression:
/// Pending -> Running -> Pending (next step) -> ... -> Completed
///
/// Special states:
/// - AwaitingInput: the current step asked for external data
/// - Failed: a step failed or the entry references a step that is gone
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Waiting for the next scheduled advance.
    Pending,

    /// Claimed by an advance that is currently running the step.
    Running,

    /// Paused until external input is supplied.
    AwaitingInput,

    /// All steps ran.
    Completed,

    /// Stopped with a recorded reason.
    Failed,
}

impl EntryStatus {
    /// Name stored in the ledger table.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Running => "running",
            EntryStatus::AwaitingInput => "awaiting_input",
            EntryStatus::Completed => "completed",
            EntryStatus::Failed => "failed",
        }
    }

    /// Whether no further transition happens without an administrator.
    pub fn is_terminal(self) -> bool {
        matches!(self, EntryStatus::Completed | EntryStatus::Failed)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EntryStatus::Pending),
            "running" => Ok(EntryStatus::Running),
            "awaiting_input" => Ok(EntryStatus::AwaitingInput),
            "completed" => Ok(EntryStatus::Completed),
            "failed" => Ok(EntryStatus::Failed),
            other => Err(format!("unknown entry status: {other}")),
        }
    }
}

/// A course's live position in the step pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LifecycleEntry {
    /// Course this entry belongs to. At most one live entry per course.
    pub course_id: i64,

    /// Name of the trigger that flagged the course.
    pub trigger: String,

    /// Name of the step that runs next (or ran last, once terminal).
    pub current_step: String,

    /// Current status.
    pub status: EntryStatus,

    /// Opaque data produced and consumed by steps.
    pub data: Value,

    /// Why the entry failed, if it did.
    pub failure_reason: Option<String>,

    /// Incremented on every claim; guards the commit of a step result.
    pub version: i64,

    /// When the course was flagged.
    pub created_at: DateTime<Utc>,

    /// Last transition.
    pub updated_at: DateTime<Utc>,
}

/// Why an entry left the ledger.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    /// The pipeline ran to the end.
    Completed,

    /// An administrator dropped a failed entry.
    Dismissed,
}

impl HistoryStatus {
    /// Name stored in the history table.
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryStatus::Completed => "completed",
            HistoryStatus::Dismissed => "dismissed",
        }
    }
}

impl FromStr for HistoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(HistoryStatus::Completed),
            "dismissed" => Ok(HistoryStatus::Dismissed),
            other => Err(format!("unknown history status: {other}")),
        }
    }
}

/// An archived ledger entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub course_id: i64,
    pub trigger: String,
    pub final_step: String,
    pub status: HistoryStatus,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A course backup written by the backup step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub id: i64,
    pub course_id: i64,
    pub shortname: String,
    pub fullname: String,

    /// Archive location as reported by the course backend.
    pub backup_file: String,

    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_status_roundtrip_names() {
        for status in [
            EntryStatus::Pending,
            EntryStatus::Running,
            EntryStatus::AwaitingInput,
            EntryStatus::Completed,
            EntryStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<EntryStatus>(), Ok(status));
        }
        assert!("paused".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(EntryStatus::Completed.is_terminal());
        assert!(EntryStatus::Failed.is_terminal());
        assert!(!EntryStatus::AwaitingInput.is_terminal());
        assert!(!EntryStatus::Pending.is_terminal());
    }
}
