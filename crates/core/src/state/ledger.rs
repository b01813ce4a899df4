//! Persisted lifecycle ledger.
//!
//! The `Ledger` is responsible for:
//! - Binding each flagged course to exactly one live entry
//! - Handing out exclusive claims on pending entries
//! - Writing step results back under the claim that produced them
//! - Archiving finished entries into the history table

use crate::state::entry::{self, expect_status};
use crate::state::error::{LedgerError, LedgerResult};
use crate::store::sqlite::{format_ts, parse_ts};
use crate::store::{SqliteStore, StoreError, StoreResult};
use crate::subplugins::SubpluginError;
use cc_protocol::{EntryStatus, HistoryRecord, HistoryStatus, LifecycleEntry};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

const ENTRY_COLUMNS: &str = "course_id, trigger_name, current_step, status, data, \
                             failure_reason, version, created_at, updated_at";

const HISTORY_COLUMNS: &str =
    "id, course_id, trigger_name, final_step, status, failure_reason, created_at, finished_at";

/// Failure reason recorded for entries whose claim outlived the stale limit.
pub const ABANDONED_REASON: &str = "claim abandoned";

/// Persistent course -> pipeline position binding.
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<SqliteStore>,
}

impl Ledger {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Create a Pending entry at `first_step` unless the course already has one.
    ///
    /// # Returns
    ///
    /// `true` if the entry was created, `false` if one existed already.
    pub fn insert_if_absent(
        &self,
        course_id: i64,
        trigger: &str,
        first_step: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<bool> {
        let entry = entry::new_entry(course_id, trigger, first_step, now);
        let data = serde_json::to_string(&entry.data).map_err(StoreError::from)?;
        let inserted = self.store.with_transaction(|tx| {
            tx.execute(
                "INSERT OR IGNORE INTO lifecycle_entries
                     (course_id, trigger_name, current_step, status, data, failure_reason,
                      version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, NULL, 0, ?6, ?6)",
                params![
                    entry.course_id,
                    entry.trigger,
                    entry.current_step,
                    entry.status.as_str(),
                    data,
                    format_ts(now)
                ],
            )
            .map_err(StoreError::from)
        })?;
        Ok(inserted == 1)
    }

    pub fn get(&self, course_id: i64) -> LedgerResult<Option<LifecycleEntry>> {
        self.store
            .with_connection(|conn| Ok(fetch_entry(conn, course_id)?))
    }

    /// Like [`get`](Self::get), but a missing entry is an error.
    pub fn require(&self, course_id: i64) -> LedgerResult<LifecycleEntry> {
        self.get(course_id)?.ok_or(LedgerError::NotFound(course_id))
    }

    /// All live entries, ordered by course id.
    pub fn list(&self) -> LedgerResult<Vec<LifecycleEntry>> {
        self.store.with_connection(|conn| {
            Ok(query_entries(
                conn,
                &format!("SELECT {ENTRY_COLUMNS} FROM lifecycle_entries ORDER BY course_id"),
                [],
            )?)
        })
    }

    /// Live entries with `status`, ordered by course id.
    pub fn list_by_status(&self, status: EntryStatus) -> LedgerResult<Vec<LifecycleEntry>> {
        self.store.with_connection(|conn| {
            Ok(query_entries(
                conn,
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM lifecycle_entries WHERE status = ?1 \
                     ORDER BY course_id"
                ),
                [status.as_str()],
            )?)
        })
    }

    /// Ids of all courses with a live entry.
    pub fn live_course_ids(&self) -> LedgerResult<BTreeSet<i64>> {
        self.store.with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT course_id FROM lifecycle_entries")
                .map_err(StoreError::from)?;
            let ids = stmt
                .query_map([], |row| row.get(0))
                .map_err(StoreError::from)?
                .collect::<Result<BTreeSet<i64>, _>>()
                .map_err(StoreError::from)?;
            Ok(ids)
        })
    }

    /// Claim a Pending entry for one advance.
    ///
    /// The claim only succeeds if the entry is still Pending at `version`.
    /// The returned entry is Running and carries the new version, which
    /// [`commit_outcome`](Self::commit_outcome) and [`release`](Self::release)
    /// check against.
    ///
    /// # Returns
    ///
    /// `None` if another invocation changed the entry first.
    pub fn claim(
        &self,
        course_id: i64,
        version: i64,
        now: DateTime<Utc>,
    ) -> LedgerResult<Option<LifecycleEntry>> {
        self.store.with_transaction(|tx| {
            let updated = tx
                .execute(
                    "UPDATE lifecycle_entries
                     SET status = 'running', version = version + 1, updated_at = ?1
                     WHERE course_id = ?2 AND status = 'pending' AND version = ?3",
                    params![format_ts(now), course_id, version],
                )
                .map_err(StoreError::from)?;
            if updated == 0 {
                return Ok(None);
            }
            Ok(fetch_entry(tx, course_id)?)
        })
    }

    /// Write the result of a claimed advance.
    ///
    /// `entry` must carry the version returned by [`claim`](Self::claim).
    /// Step pointer, status and data change in one statement. A Completed
    /// entry is moved to the history table in the same transaction.
    ///
    /// # Returns
    ///
    /// The history record if the entry was archived.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ClaimLost`] if the entry is no longer Running at
    /// that version; nothing is written in that case.
    pub fn commit_outcome(&self, entry: &LifecycleEntry) -> LedgerResult<Option<HistoryRecord>> {
        self.store.with_transaction(|tx| {
            if entry.status == EntryStatus::Completed {
                let deleted = tx
                    .execute(
                        "DELETE FROM lifecycle_entries
                         WHERE course_id = ?1 AND status = 'running' AND version = ?2",
                        params![entry.course_id, entry.version],
                    )
                    .map_err(StoreError::from)?;
                if deleted == 0 {
                    return Err(LedgerError::ClaimLost(entry.course_id));
                }
                let record = archive(tx, entry, HistoryStatus::Completed, entry.updated_at)?;
                return Ok(Some(record));
            }

            let data = serde_json::to_string(&entry.data).map_err(StoreError::from)?;
            let updated = tx
                .execute(
                    "UPDATE lifecycle_entries
                     SET current_step = ?1, status = ?2, data = ?3, failure_reason = ?4,
                         updated_at = ?5
                     WHERE course_id = ?6 AND status = 'running' AND version = ?7",
                    params![
                        entry.current_step,
                        entry.status.as_str(),
                        data,
                        entry.failure_reason,
                        format_ts(entry.updated_at),
                        entry.course_id,
                        entry.version
                    ],
                )
                .map_err(StoreError::from)?;
            if updated == 0 {
                return Err(LedgerError::ClaimLost(entry.course_id));
            }
            Ok(None)
        })
    }

    /// Hand a claimed entry back to Pending without recording a result.
    ///
    /// # Returns
    ///
    /// `false` if the claim was no longer held.
    pub fn release(
        &self,
        course_id: i64,
        claimed_version: i64,
        now: DateTime<Utc>,
    ) -> LedgerResult<bool> {
        let updated = self.store.with_transaction(|tx| {
            tx.execute(
                "UPDATE lifecycle_entries SET status = 'pending', updated_at = ?1
                 WHERE course_id = ?2 AND status = 'running' AND version = ?3",
                params![format_ts(now), course_id, claimed_version],
            )
            .map_err(StoreError::from)
        })?;
        Ok(updated == 1)
    }

    /// Resume an entry that is awaiting input.
    ///
    /// `fold` receives the entry's data and returns the data to continue
    /// with; it is the current step's `resume` capability.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidState`] if the entry is not AwaitingInput
    /// - [`LedgerError::InputRejected`] if `fold` refuses the input
    pub fn resume<F>(
        &self,
        course_id: i64,
        fold: F,
        now: DateTime<Utc>,
    ) -> LedgerResult<LifecycleEntry>
    where
        F: FnOnce(Value) -> Result<Value, SubpluginError>,
    {
        self.mutate(course_id, |entry| {
            expect_status(entry, EntryStatus::AwaitingInput)?;
            let data = fold(entry.data.clone())?;
            entry::resume(entry, data, now)
        })
    }

    /// Put a failed entry back to Pending at the same step.
    pub fn retry(&self, course_id: i64, now: DateTime<Utc>) -> LedgerResult<LifecycleEntry> {
        self.mutate(course_id, |entry| entry::retry(entry, now))
    }

    /// Archive a failed entry as dismissed, making the course eligible again.
    pub fn dismiss(&self, course_id: i64, now: DateTime<Utc>) -> LedgerResult<HistoryRecord> {
        self.store.with_transaction(|tx| {
            let entry = fetch_entry(tx, course_id)?.ok_or(LedgerError::NotFound(course_id))?;
            expect_status(&entry, EntryStatus::Failed)?;
            tx.execute(
                "DELETE FROM lifecycle_entries WHERE course_id = ?1",
                [course_id],
            )
            .map_err(StoreError::from)?;
            Ok(archive(tx, &entry, HistoryStatus::Dismissed, now)?)
        })
    }

    /// Fail entries left Running since before `cutoff`.
    ///
    /// # Returns
    ///
    /// The course ids that were failed.
    pub fn recover_stale(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> LedgerResult<Vec<i64>> {
        self.store.with_transaction(|tx| {
            let mut stmt = tx
                .prepare(
                    "SELECT course_id FROM lifecycle_entries
                     WHERE status = 'running' AND updated_at < ?1 ORDER BY course_id",
                )
                .map_err(StoreError::from)?;
            let ids = stmt
                .query_map([format_ts(cutoff)], |row| row.get(0))
                .map_err(StoreError::from)?
                .collect::<Result<Vec<i64>, _>>()
                .map_err(StoreError::from)?;
            drop(stmt);
            for course_id in &ids {
                tx.execute(
                    "UPDATE lifecycle_entries
                     SET status = 'failed', failure_reason = ?1, version = version + 1,
                         updated_at = ?2
                     WHERE course_id = ?3",
                    params![ABANDONED_REASON, format_ts(now), course_id],
                )
                .map_err(StoreError::from)?;
            }
            Ok(ids)
        })
    }

    /// Archived entries, newest first, optionally for one course.
    pub fn history(&self, course_id: Option<i64>) -> LedgerResult<Vec<HistoryRecord>> {
        self.store.with_connection(|conn| {
            let records = match course_id {
                Some(id) => query_history(
                    conn,
                    &format!(
                        "SELECT {HISTORY_COLUMNS} FROM lifecycle_history WHERE course_id = ?1 \
                         ORDER BY id DESC"
                    ),
                    [id],
                )?,
                None => query_history(
                    conn,
                    &format!("SELECT {HISTORY_COLUMNS} FROM lifecycle_history ORDER BY id DESC"),
                    [],
                )?,
            };
            Ok(records)
        })
    }

    /// Load, change and write back one entry in a single transaction.
    fn mutate<F>(&self, course_id: i64, f: F) -> LedgerResult<LifecycleEntry>
    where
        F: FnOnce(&mut LifecycleEntry) -> LedgerResult<()>,
    {
        self.store.with_transaction(|tx| {
            let mut entry = fetch_entry(tx, course_id)?.ok_or(LedgerError::NotFound(course_id))?;
            f(&mut entry)?;
            write_entry(tx, &entry)?;
            Ok(entry)
        })
    }
}

struct RawEntry {
    course_id: i64,
    trigger: String,
    current_step: String,
    status: String,
    data: String,
    failure_reason: Option<String>,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl RawEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            course_id: row.get(0)?,
            trigger: row.get(1)?,
            current_step: row.get(2)?,
            status: row.get(3)?,
            data: row.get(4)?,
            failure_reason: row.get(5)?,
            version: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_entry(self) -> StoreResult<LifecycleEntry> {
        Ok(LifecycleEntry {
            course_id: self.course_id,
            trigger: self.trigger,
            current_step: self.current_step,
            status: self.status.parse::<EntryStatus>().map_err(StoreError::Corrupt)?,
            data: serde_json::from_str(&self.data)?,
            failure_reason: self.failure_reason,
            version: self.version,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

struct RawHistory {
    id: i64,
    course_id: i64,
    trigger: String,
    final_step: String,
    status: String,
    failure_reason: Option<String>,
    created_at: String,
    finished_at: String,
}

impl RawHistory {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            course_id: row.get(1)?,
            trigger: row.get(2)?,
            final_step: row.get(3)?,
            status: row.get(4)?,
            failure_reason: row.get(5)?,
            created_at: row.get(6)?,
            finished_at: row.get(7)?,
        })
    }

    fn into_record(self) -> StoreResult<HistoryRecord> {
        Ok(HistoryRecord {
            id: self.id,
            course_id: self.course_id,
            trigger: self.trigger,
            final_step: self.final_step,
            status: self
                .status
                .parse::<HistoryStatus>()
                .map_err(StoreError::Corrupt)?,
            failure_reason: self.failure_reason,
            created_at: parse_ts(&self.created_at)?,
            finished_at: parse_ts(&self.finished_at)?,
        })
    }
}

fn fetch_entry(conn: &Connection, course_id: i64) -> StoreResult<Option<LifecycleEntry>> {
    let raw = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM lifecycle_entries WHERE course_id = ?1"),
            [course_id],
            RawEntry::from_row,
        )
        .optional()?;
    raw.map(RawEntry::into_entry).transpose()
}

fn query_entries<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> StoreResult<Vec<LifecycleEntry>> {
    let mut stmt = conn.prepare(sql)?;
    let raws = stmt
        .query_map(params, RawEntry::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(RawEntry::into_entry).collect()
}

fn query_history<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> StoreResult<Vec<HistoryRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let raws = stmt
        .query_map(params, RawHistory::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(RawHistory::into_record).collect()
}

fn write_entry(conn: &Connection, entry: &LifecycleEntry) -> StoreResult<()> {
    conn.execute(
        "UPDATE lifecycle_entries
         SET current_step = ?1, status = ?2, data = ?3, failure_reason = ?4, updated_at = ?5
         WHERE course_id = ?6",
        params![
            entry.current_step,
            entry.status.as_str(),
            serde_json::to_string(&entry.data)?,
            entry.failure_reason,
            format_ts(entry.updated_at),
            entry.course_id
        ],
    )?;
    Ok(())
}

fn archive(
    conn: &Connection,
    entry: &LifecycleEntry,
    status: HistoryStatus,
    finished_at: DateTime<Utc>,
) -> StoreResult<HistoryRecord> {
    conn.execute(
        "INSERT INTO lifecycle_history
             (course_id, trigger_name, final_step, status, failure_reason, created_at, finished_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.course_id,
            entry.trigger,
            entry.current_step,
            status.as_str(),
            entry.failure_reason,
            format_ts(entry.created_at),
            format_ts(finished_at)
        ],
    )?;
    Ok(HistoryRecord {
        id: conn.last_insert_rowid(),
        course_id: entry.course_id,
        trigger: entry.trigger.clone(),
        final_step: entry.current_step.clone(),
        status,
        failure_reason: entry.failure_reason.clone(),
        created_at: entry.created_at,
        finished_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_protocol::StepOutcome;
    use chrono::TimeZone;
    use serde_json::json;

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(SqliteStore::in_memory().unwrap()))
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn test_insert_if_absent_is_idempotent() {
        let ledger = ledger();
        assert!(ledger.insert_if_absent(5, "startdatedelay", "createbackup", at(0)).unwrap());
        assert!(!ledger.insert_if_absent(5, "categories", "email", at(1)).unwrap());

        let entry = ledger.require(5).unwrap();
        assert_eq!(entry.trigger, "startdatedelay");
        assert_eq!(entry.current_step, "createbackup");
        assert_eq!(entry.status, EntryStatus::Pending);
        assert_eq!(entry.created_at, at(0));
        assert_eq!(ledger.live_course_ids().unwrap(), BTreeSet::from([5]));
    }

    #[test]
    fn test_claim_is_exclusive() {
        let ledger = ledger();
        ledger.insert_if_absent(5, "t", "a", at(0)).unwrap();

        let claimed = ledger.claim(5, 0, at(1)).unwrap().unwrap();
        assert_eq!(claimed.status, EntryStatus::Running);
        assert_eq!(claimed.version, 1);

        assert!(ledger.claim(5, 0, at(1)).unwrap().is_none());
        assert!(ledger.claim(5, 1, at(1)).unwrap().is_none());
    }

    #[test]
    fn test_commit_advances_and_completes() {
        let ledger = ledger();
        ledger.insert_if_absent(5, "t", "a", at(0)).unwrap();

        let mut claimed = ledger.claim(5, 0, at(1)).unwrap().unwrap();
        entry::apply_outcome(&mut claimed, StepOutcome::Advance(json!({"n": 1})), Some("b"), at(2));
        assert!(ledger.commit_outcome(&claimed).unwrap().is_none());

        let stored = ledger.require(5).unwrap();
        assert_eq!(stored.current_step, "b");
        assert_eq!(stored.status, EntryStatus::Pending);
        assert_eq!(stored.data, json!({"n": 1}));

        let mut claimed = ledger.claim(5, stored.version, at(3)).unwrap().unwrap();
        entry::apply_outcome(&mut claimed, StepOutcome::advance_empty(), None, at(4));
        let record = ledger.commit_outcome(&claimed).unwrap().unwrap();
        assert_eq!(record.status, HistoryStatus::Completed);
        assert_eq!(record.final_step, "b");
        assert!(ledger.get(5).unwrap().is_none());
        assert_eq!(ledger.history(Some(5)).unwrap(), vec![record]);
    }

    #[test]
    fn test_commit_with_stale_version_is_rejected() {
        let ledger = ledger();
        ledger.insert_if_absent(5, "t", "a", at(0)).unwrap();
        let mut claimed = ledger.claim(5, 0, at(1)).unwrap().unwrap();
        ledger.recover_stale(at(30), at(30)).unwrap();

        entry::apply_outcome(&mut claimed, StepOutcome::advance_empty(), Some("b"), at(31));
        let result = ledger.commit_outcome(&claimed);
        assert!(matches!(result, Err(LedgerError::ClaimLost(5))));
        assert_eq!(ledger.require(5).unwrap().current_step, "a");
    }

    #[test]
    fn test_release_returns_to_pending() {
        let ledger = ledger();
        ledger.insert_if_absent(5, "t", "a", at(0)).unwrap();
        let claimed = ledger.claim(5, 0, at(1)).unwrap().unwrap();
        assert!(ledger.release(5, claimed.version, at(2)).unwrap());
        assert!(!ledger.release(5, claimed.version, at(2)).unwrap());
        let entry = ledger.require(5).unwrap();
        assert_eq!(entry.status, EntryStatus::Pending);
        assert!(ledger.claim(5, entry.version, at(3)).unwrap().is_some());
    }

    #[test]
    fn test_resume_folds_input() {
        let ledger = ledger();
        ledger.insert_if_absent(5, "t", "duplicate", at(0)).unwrap();
        let mut claimed = ledger.claim(5, 0, at(1)).unwrap().unwrap();
        entry::apply_outcome(&mut claimed, StepOutcome::Await(json!({"k": 1})), Some("b"), at(2));
        ledger.commit_outcome(&claimed).unwrap();

        let rejected = ledger.resume(5, |_| Err(SubpluginError::Failed("no".into())), at(3));
        assert!(matches!(rejected, Err(LedgerError::InputRejected(_))));
        assert_eq!(ledger.require(5).unwrap().status, EntryStatus::AwaitingInput);

        let resumed = ledger
            .resume(5, |data| Ok(crate::subplugins::merge_input(data, json!("x"))), at(4))
            .unwrap();
        assert_eq!(resumed.status, EntryStatus::Pending);
        assert_eq!(resumed.current_step, "duplicate");
        assert_eq!(ledger.require(5).unwrap().data, json!({"k": 1, "input": "x"}));

        let again = ledger.resume(5, Ok, at(5));
        assert!(matches!(again, Err(LedgerError::InvalidState { .. })));
    }

    #[test]
    fn test_retry_and_dismiss_failed_entries() {
        let ledger = ledger();
        ledger.insert_if_absent(5, "t", "a", at(0)).unwrap();
        assert!(matches!(ledger.dismiss(5, at(1)), Err(LedgerError::InvalidState { .. })));

        let mut claimed = ledger.claim(5, 0, at(1)).unwrap().unwrap();
        entry::apply_outcome(&mut claimed, StepOutcome::Fail("boom".into()), Some("b"), at(2));
        ledger.commit_outcome(&claimed).unwrap();

        let retried = ledger.retry(5, at(3)).unwrap();
        assert_eq!(retried.status, EntryStatus::Pending);
        assert_eq!(retried.failure_reason, None);

        let mut claimed = ledger.claim(5, retried.version, at(4)).unwrap().unwrap();
        entry::apply_outcome(&mut claimed, StepOutcome::Fail("again".into()), Some("b"), at(5));
        ledger.commit_outcome(&claimed).unwrap();

        let record = ledger.dismiss(5, at(6)).unwrap();
        assert_eq!(record.status, HistoryStatus::Dismissed);
        assert_eq!(record.failure_reason.as_deref(), Some("again"));
        assert!(ledger.get(5).unwrap().is_none());
        assert!(ledger.insert_if_absent(5, "t", "a", at(7)).unwrap());
    }

    #[test]
    fn test_recover_stale_only_touches_old_claims() {
        let ledger = ledger();
        ledger.insert_if_absent(5, "t", "a", at(0)).unwrap();
        ledger.insert_if_absent(6, "t", "a", at(0)).unwrap();
        ledger.insert_if_absent(7, "t", "a", at(0)).unwrap();
        ledger.claim(5, 0, at(1)).unwrap();
        ledger.claim(6, 0, at(20)).unwrap();

        let recovered = ledger.recover_stale(at(10), at(25)).unwrap();
        assert_eq!(recovered, vec![5]);

        let entry = ledger.require(5).unwrap();
        assert_eq!(entry.status, EntryStatus::Failed);
        assert_eq!(entry.failure_reason.as_deref(), Some(ABANDONED_REASON));
        assert_eq!(ledger.require(6).unwrap().status, EntryStatus::Running);
        assert_eq!(ledger.require(7).unwrap().status, EntryStatus::Pending);
        assert_eq!(ledger.list_by_status(EntryStatus::Pending).unwrap().len(), 1);
        assert_eq!(ledger.list().unwrap().len(), 3);
    }
}
