//! Backup bookkeeping.

use crate::backup::error::{BackupError, BackupResult};
use crate::courses::CourseBackend;
use crate::store::sqlite::{format_ts, parse_ts};
use crate::store::{SqliteStore, StoreError, StoreResult};
use cc_protocol::{BackupRecord, Course};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use std::sync::Arc;

const COLUMNS: &str = "id, course_id, shortname, fullname, backup_file, created_at";

/// Creates, lists and restores course backups.
#[derive(Clone)]
pub struct BackupManager {
    store: Arc<SqliteStore>,
    backend: Arc<dyn CourseBackend>,
}

impl BackupManager {
    pub fn new(store: Arc<SqliteStore>, backend: Arc<dyn CourseBackend>) -> Self {
        Self { store, backend }
    }

    /// The platform backend archives are produced by.
    pub fn backend(&self) -> Arc<dyn CourseBackend> {
        Arc::clone(&self.backend)
    }

    /// Archive `course` and record the archive.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Backend`] if the platform fails to produce the
    /// archive; nothing is recorded in that case.
    pub async fn create_course_backup(&self, course: &Course) -> BackupResult<BackupRecord> {
        let backup_file = self.backend.backup(course).await?;
        let created_at = Utc::now();
        let id = self.store.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO course_backups (course_id, shortname, fullname, backup_file, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    course.id,
                    course.shortname,
                    course.fullname,
                    backup_file,
                    format_ts(created_at)
                ],
            )
            .map_err(StoreError::from)?;
            Ok::<_, BackupError>(tx.last_insert_rowid())
        })?;
        tracing::info!(course_id = course.id, backup_id = id, file = %backup_file, "created course backup");
        Ok(BackupRecord {
            id,
            course_id: course.id,
            shortname: course.shortname.clone(),
            fullname: course.fullname.clone(),
            backup_file,
            created_at,
        })
    }

    /// Restore a recorded backup as a new course and return its id.
    pub async fn restore_course_backup(&self, backup_id: i64) -> BackupResult<i64> {
        let record = self.get_backup(backup_id)?;
        let course_id = self.backend.restore(&record).await?;
        tracing::info!(backup_id, course_id, "restored course backup");
        Ok(course_id)
    }

    /// Recorded backups, newest first, optionally for one course.
    pub fn list_backups(&self, course_id: Option<i64>) -> BackupResult<Vec<BackupRecord>> {
        self.store.with_connection(|conn| {
            let records = match course_id {
                Some(id) => query(
                    conn,
                    &format!(
                        "SELECT {COLUMNS} FROM course_backups WHERE course_id = ?1 ORDER BY id DESC"
                    ),
                    [id],
                )?,
                None => query(
                    conn,
                    &format!("SELECT {COLUMNS} FROM course_backups ORDER BY id DESC"),
                    [],
                )?,
            };
            Ok(records)
        })
    }

    /// Look up a recorded backup.
    pub fn get_backup(&self, backup_id: i64) -> BackupResult<BackupRecord> {
        let row = self.store.with_connection(|conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM course_backups WHERE id = ?1"),
                [backup_id],
                raw_row,
            )
            .optional()
            .map_err(StoreError::from)
        })?;
        match row {
            Some(raw) => Ok(raw.into_record()?),
            None => Err(BackupError::NotFound(backup_id)),
        }
    }
}

struct RawBackup {
    id: i64,
    course_id: i64,
    shortname: String,
    fullname: String,
    backup_file: String,
    created_at: String,
}

impl RawBackup {
    fn into_record(self) -> StoreResult<BackupRecord> {
        Ok(BackupRecord {
            id: self.id,
            course_id: self.course_id,
            shortname: self.shortname,
            fullname: self.fullname,
            backup_file: self.backup_file,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawBackup> {
    Ok(RawBackup {
        id: row.get(0)?,
        course_id: row.get(1)?,
        shortname: row.get(2)?,
        fullname: row.get(3)?,
        backup_file: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn query<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> StoreResult<Vec<BackupRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let raws = stmt
        .query_map(params, raw_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(RawBackup::into_record).collect()
}
