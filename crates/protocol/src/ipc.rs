//! Events emitted by the lifecycle engine.
//!
//! The engine reports every decision and transition on an unbounded channel.
//! Observers (the command line, an admin UI) consume them to show progress;
//! the ledger stays the source of truth.
//!
//! Uses tagged enum serialization:
//! ```json
//! {
//!   "type": "entryStatusUpdate",
//!   "payload": {
//!     "course_id": 42,
//!     "status": "awaiting_input",
//!     "step": "duplicate"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::ledger_models::EntryStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A trigger flagged the course and an entry was created.
    CourseTriggered {
        course_id: i64,
        trigger: String,
        first_step: String,
    },

    /// A trigger excluded the course from this run.
    CourseExcluded { course_id: i64, trigger: String },

    /// An entry changed status or step.
    EntryStatusUpdate {
        course_id: i64,
        status: EntryStatus,
        step: String,
    },

    /// A step reported a message worth showing to an administrator.
    EntryMessage { course_id: i64, message: String },

    /// The last step finished and the entry was archived.
    EntryCompleted { course_id: i64 },

    /// The entry failed.
    EntryFailed { course_id: i64, reason: String },
}

impl Event {
    /// Course the event refers to.
    pub fn course_id(&self) -> i64 {
        match self {
            Event::CourseTriggered { course_id, .. }
            | Event::CourseExcluded { course_id, .. }
            | Event::EntryStatusUpdate { course_id, .. }
            | Event::EntryMessage { course_id, .. }
            | Event::EntryCompleted { course_id }
            | Event::EntryFailed { course_id, .. } => *course_id,
        }
    }
}
