//! Table layout.

use cc_protocol::SubpluginKind;

/// Idempotent DDL for all tables.
///
/// Sortindex uniqueness among enabled rows is maintained by the registry,
/// not by a constraint: compaction and swaps pass through states a
/// per-row UNIQUE check would reject.
pub const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS trigger_subplugins (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    sortindex INTEGER,
    enabled INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS step_subplugins (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    sortindex INTEGER,
    enabled INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS lifecycle_entries (
    course_id INTEGER PRIMARY KEY,
    trigger_name TEXT NOT NULL,
    current_step TEXT NOT NULL,
    status TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT '{}',
    failure_reason TEXT,
    version INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_lifecycle_entries_status ON lifecycle_entries (status);

CREATE TABLE IF NOT EXISTS lifecycle_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id INTEGER NOT NULL,
    trigger_name TEXT NOT NULL,
    final_step TEXT NOT NULL,
    status TEXT NOT NULL,
    failure_reason TEXT,
    created_at TEXT NOT NULL,
    finished_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS course_backups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_id INTEGER NOT NULL,
    shortname TEXT NOT NULL,
    fullname TEXT NOT NULL,
    backup_file TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

/// Table holding the records of one subplugin kind.
pub fn subplugin_table(kind: SubpluginKind) -> &'static str {
    match kind {
        SubpluginKind::Trigger => "trigger_subplugins",
        SubpluginKind::Step => "step_subplugins",
    }
}
