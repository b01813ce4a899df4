//! Values returned by trigger and step subplugins.
//!
//! Neither type is persisted. The engine turns them into ledger mutations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Answer of a trigger check for one course.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TriggerResponse {
    /// Stop the chain and flag the course for processing.
    Trigger,

    /// No opinion; ask the next trigger in the chain.
    Next,

    /// Stop the chain and skip the course for this run.
    Exclude,
}

/// Result of running one step for one course.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "outcome", content = "payload", rename_all = "lowercase")]
pub enum StepOutcome {
    /// Step finished; continue with the next one using this data.
    Advance(Value),

    /// Step needs external input; keep this data until it arrives.
    Await(Value),

    /// Step failed permanently with the given reason.
    Fail(String),
}

impl StepOutcome {
    /// Advance without carrying any data forward.
    pub fn advance_empty() -> Self {
        StepOutcome::Advance(Value::Object(Default::default()))
    }
}
