//! Entry state machine implementation.
//!
//! This module provides functions for moving a [`LifecycleEntry`] between
//! statuses and for emitting the matching events. Nothing here touches the
//! store; the [`Ledger`](crate::state::Ledger) persists the result.

use crate::state::error::{LedgerError, LedgerResult};
use cc_protocol::{EntryStatus, Event, LifecycleEntry, StepOutcome};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

/// Create a new entry with Pending status at `first_step`.
///
/// # Arguments
///
/// * `course_id` - The flagged course
/// * `trigger` - Name of the trigger that flagged it
/// * `first_step` - First enabled step of the chain
/// * `now` - Creation instant
pub fn new_entry(
    course_id: i64,
    trigger: &str,
    first_step: &str,
    now: DateTime<Utc>,
) -> LifecycleEntry {
    LifecycleEntry {
        course_id,
        trigger: trigger.to_string(),
        current_step: first_step.to_string(),
        status: EntryStatus::Pending,
        data: Value::Object(Default::default()),
        failure_reason: None,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Apply a step outcome to a claimed entry.
///
/// # Arguments
///
/// * `entry` - The entry whose current step produced `outcome`
/// * `outcome` - What the step returned
/// * `next_step` - The enabled step after the current one, if any
/// * `now` - Transition instant
pub fn apply_outcome(
    entry: &mut LifecycleEntry,
    outcome: StepOutcome,
    next_step: Option<&str>,
    now: DateTime<Utc>,
) {
    match outcome {
        StepOutcome::Advance(data) => match next_step {
            Some(next) => advance_to(entry, next, data, now),
            None => complete(entry, data, now),
        },
        StepOutcome::Await(data) => await_input(entry, data, now),
        StepOutcome::Fail(reason) => fail(entry, reason, now),
    }
}

/// Move to `next_step`, Pending, with `data`.
pub fn advance_to(entry: &mut LifecycleEntry, next_step: &str, data: Value, now: DateTime<Utc>) {
    entry.current_step = next_step.to_string();
    entry.status = EntryStatus::Pending;
    entry.data = data;
    entry.failure_reason = None;
    entry.updated_at = now;
}

/// Pause at the current step until input arrives.
pub fn await_input(entry: &mut LifecycleEntry, data: Value, now: DateTime<Utc>) {
    entry.status = EntryStatus::AwaitingInput;
    entry.data = data;
    entry.updated_at = now;
}

/// Mark the entry as completed after its last step.
pub fn complete(entry: &mut LifecycleEntry, data: Value, now: DateTime<Utc>) {
    entry.status = EntryStatus::Completed;
    entry.data = data;
    entry.updated_at = now;
}

/// Mark the entry as failed with `reason`. The data is kept for inspection.
pub fn fail(entry: &mut LifecycleEntry, reason: String, now: DateTime<Utc>) {
    entry.status = EntryStatus::Failed;
    entry.failure_reason = Some(reason);
    entry.updated_at = now;
}

/// Resume an entry that is awaiting input, with the step's folded data.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidState`] unless the entry is AwaitingInput.
pub fn resume(entry: &mut LifecycleEntry, data: Value, now: DateTime<Utc>) -> LedgerResult<()> {
    expect_status(entry, EntryStatus::AwaitingInput)?;
    entry.status = EntryStatus::Pending;
    entry.data = data;
    entry.updated_at = now;
    Ok(())
}

/// Put a failed entry back to Pending at the same step.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidState`] unless the entry is Failed.
pub fn retry(entry: &mut LifecycleEntry, now: DateTime<Utc>) -> LedgerResult<()> {
    expect_status(entry, EntryStatus::Failed)?;
    entry.status = EntryStatus::Pending;
    entry.failure_reason = None;
    entry.updated_at = now;
    Ok(())
}

pub(crate) fn expect_status(entry: &LifecycleEntry, expected: EntryStatus) -> LedgerResult<()> {
    if entry.status == expected {
        Ok(())
    } else {
        Err(LedgerError::InvalidState {
            course_id: entry.course_id,
            expected,
            actual: entry.status,
        })
    }
}

/// Emit the events describing the entry's current status.
///
/// Completed and Failed entries emit a second, terminal event. Sending
/// never blocks; a closed channel is ignored.
///
/// # Arguments
///
/// * `entry` - The entry after its transition
/// * `events_tx` - Channel to send events to
pub fn emit_transition(entry: &LifecycleEntry, events_tx: &UnboundedSender<Event>) {
    let _ = events_tx.send(Event::EntryStatusUpdate {
        course_id: entry.course_id,
        status: entry.status,
        step: entry.current_step.clone(),
    });
    match entry.status {
        EntryStatus::Completed => {
            let _ = events_tx.send(Event::EntryCompleted {
                course_id: entry.course_id,
            });
        }
        EntryStatus::Failed => {
            let _ = events_tx.send(Event::EntryFailed {
                course_id: entry.course_id,
                reason: entry.failure_reason.clone().unwrap_or_default(),
            });
        }
        _ => {}
    }
}

/// Forward a message a step left for the administrator.
pub fn emit_message(course_id: i64, message: String, events_tx: &UnboundedSender<Event>) {
    let _ = events_tx.send(Event::EntryMessage { course_id, message });
}
