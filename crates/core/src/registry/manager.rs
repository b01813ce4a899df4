//! Persisted, ordered registry of installed subplugins.
//!
//! The `SubpluginRegistry` is responsible for:
//! - Registering and deregistering subplugins by name
//! - Enabling and disabling them, which appends to or removes from the chain
//! - Moving enabled subplugins up and down the chain
//!
//! Enabled records always carry the sortindices `1..=k` with no gaps or
//! duplicates; disabled records carry none. Every operation reads, checks
//! and writes inside one transaction, so a failed operation changes nothing
//! and a reader never sees a half-renumbered chain.

use crate::registry::error::{Edge, RegistryError, RegistryResult};
use crate::store::schema::subplugin_table;
use crate::store::{SqliteStore, StoreError, StoreResult};
use cc_protocol::{AdminAction, SubpluginKind, SubpluginRecord};
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::sync::Arc;

const COLUMNS: &str = "id, name, sortindex, enabled";

/// What [`SubpluginRegistry::sync_installed`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Installed subplugins that were missing from the registry.
    pub registered: Vec<String>,

    /// Registry rows whose subplugin is no longer installed.
    pub removed: Vec<String>,
}

/// Ordered list of the subplugins of one kind.
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct SubpluginRegistry {
    store: Arc<SqliteStore>,
    kind: SubpluginKind,
    table: &'static str,
}

impl SubpluginRegistry {
    /// Create a registry for `kind` on top of `store`.
    pub fn new(store: Arc<SqliteStore>, kind: SubpluginKind) -> Self {
        Self {
            store,
            kind,
            table: subplugin_table(kind),
        }
    }

    /// Registry of trigger subplugins.
    pub fn triggers(store: Arc<SqliteStore>) -> Self {
        Self::new(store, SubpluginKind::Trigger)
    }

    /// Registry of step subplugins.
    pub fn steps(store: Arc<SqliteStore>) -> Self {
        Self::new(store, SubpluginKind::Step)
    }

    pub fn kind(&self) -> SubpluginKind {
        self.kind
    }

    /// Register a newly installed subplugin, disabled and unordered.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if `name` is already registered.
    pub fn register(&self, name: &str) -> RegistryResult<SubpluginRecord> {
        let record = self.store.with_transaction(|tx| {
            if fetch_by_name(tx, self.table, name)?.is_some() {
                return Err(RegistryError::DuplicateName {
                    kind: self.kind,
                    name: name.to_string(),
                });
            }
            Ok(insert_record(tx, self.table, name)?)
        })?;
        tracing::info!(kind = %self.kind, name, id = record.id, "registered subplugin");
        Ok(record)
    }

    /// Remove a subplugin, closing the gap it leaves in the chain.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if `name` is not registered.
    pub fn deregister(&self, name: &str) -> RegistryResult<()> {
        self.store.with_transaction(|tx| {
            let record =
                fetch_by_name(tx, self.table, name)?.ok_or_else(|| self.not_found(name))?;
            Ok::<_, RegistryError>(delete_record(tx, self.table, &record)?)
        })?;
        tracing::info!(kind = %self.kind, name, "deregistered subplugin");
        Ok(())
    }

    /// Enable a subplugin, appending it at the tail of the chain.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyEnabled`] if it is enabled already;
    /// nothing is changed in that case.
    pub fn enable(&self, id: i64) -> RegistryResult<SubpluginRecord> {
        let record = self.store.with_transaction(|tx| {
            let mut record = self.require(tx, id)?;
            if record.enabled {
                return Err(RegistryError::AlreadyEnabled {
                    kind: self.kind,
                    name: record.name,
                });
            }
            let tail = max_sortindex(tx, self.table)?.unwrap_or(0) + 1;
            set_position(tx, self.table, id, true, Some(tail))?;
            record.enabled = true;
            record.sortindex = Some(tail);
            Ok(record)
        })?;
        tracing::info!(kind = %self.kind, name = %record.name, sortindex = ?record.sortindex, "enabled subplugin");
        Ok(record)
    }

    /// Disable a subplugin, removing it from the chain.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyDisabled`] if it is disabled already.
    pub fn disable(&self, id: i64) -> RegistryResult<SubpluginRecord> {
        let record = self.store.with_transaction(|tx| {
            let mut record = self.require(tx, id)?;
            if !record.enabled {
                return Err(RegistryError::AlreadyDisabled {
                    kind: self.kind,
                    name: record.name,
                });
            }
            set_position(tx, self.table, id, false, None)?;
            if let Some(sortindex) = record.sortindex {
                compact_after(tx, self.table, sortindex)?;
            }
            record.enabled = false;
            record.sortindex = None;
            Ok(record)
        })?;
        tracing::info!(kind = %self.kind, name = %record.name, "disabled subplugin");
        Ok(record)
    }

    /// Swap an enabled subplugin with its predecessor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Boundary`] if it is first already, or
    /// [`RegistryError::NotEnabled`] if it is disabled.
    pub fn move_up(&self, id: i64) -> RegistryResult<SubpluginRecord> {
        self.shift(id, Edge::Top)
    }

    /// Swap an enabled subplugin with its successor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Boundary`] if it is last already, or
    /// [`RegistryError::NotEnabled`] if it is disabled.
    pub fn move_down(&self, id: i64) -> RegistryResult<SubpluginRecord> {
        self.shift(id, Edge::Bottom)
    }

    /// Apply an administrative action to the subplugin with `id`.
    pub fn handle_action(&self, action: AdminAction, id: i64) -> RegistryResult<SubpluginRecord> {
        match action {
            AdminAction::Enable => self.enable(id),
            AdminAction::Disable => self.disable(id),
            AdminAction::MoveUp => self.move_up(id),
            AdminAction::MoveDown => self.move_down(id),
        }
    }

    /// Bring the registry in line with the installed subplugins.
    ///
    /// Installed names without a row are registered (disabled); rows whose
    /// name is not installed are removed and the chain is compacted. Runs as
    /// a single transaction.
    pub fn sync_installed<S: AsRef<str>>(&self, installed: &[S]) -> RegistryResult<SyncReport> {
        let installed: BTreeSet<&str> = installed.iter().map(AsRef::as_ref).collect();
        let report = self.store.with_transaction(|tx| {
            let mut report = SyncReport::default();
            let existing = list_records(tx, self.table)?;
            for record in &existing {
                if !installed.contains(record.name.as_str()) {
                    delete_record(tx, self.table, record)?;
                    report.removed.push(record.name.clone());
                }
            }
            for name in &installed {
                if !existing.iter().any(|r| r.name == *name) {
                    insert_record(tx, self.table, name)?;
                    report.registered.push((*name).to_string());
                }
            }
            Ok::<_, RegistryError>(report)
        })?;
        if !report.registered.is_empty() || !report.removed.is_empty() {
            tracing::info!(
                kind = %self.kind,
                registered = ?report.registered,
                removed = ?report.removed,
                "synchronised installed subplugins"
            );
        }
        Ok(report)
    }

    /// Look up a record by id.
    pub fn get(&self, id: i64) -> RegistryResult<SubpluginRecord> {
        self.store.with_connection(|conn| self.require(conn, id))
    }

    /// Look up a record by name.
    pub fn get_by_name(&self, name: &str) -> RegistryResult<Option<SubpluginRecord>> {
        self.store
            .with_connection(|conn| Ok(fetch_by_name(conn, self.table, name)?))
    }

    /// All records: enabled ones in chain order, then disabled ones by name.
    pub fn list(&self) -> RegistryResult<Vec<SubpluginRecord>> {
        self.store
            .with_connection(|conn| Ok(list_records(conn, self.table)?))
    }

    /// The enabled chain in sortindex order.
    pub fn enabled(&self) -> RegistryResult<Vec<SubpluginRecord>> {
        self.store.with_connection(|conn| {
            let sql = format!(
                "SELECT {COLUMNS} FROM {} WHERE enabled = 1 ORDER BY sortindex",
                self.table
            );
            let mut stmt = conn.prepare(&sql).map_err(StoreError::from)?;
            let rows = stmt
                .query_map([], row_to_record)
                .map_err(StoreError::from)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)?;
            Ok(rows)
        })
    }

    fn shift(&self, id: i64, edge: Edge) -> RegistryResult<SubpluginRecord> {
        let record = self.store.with_transaction(|tx| {
            let mut record = self.require(tx, id)?;
            let current = match (record.enabled, record.sortindex) {
                (true, Some(sortindex)) => sortindex,
                (true, None) => {
                    return Err(StoreError::Corrupt(format!(
                        "enabled {} subplugin '{}' has no sortindex",
                        self.kind, record.name
                    ))
                    .into())
                }
                (false, _) => {
                    return Err(RegistryError::NotEnabled {
                        kind: self.kind,
                        name: record.name,
                    })
                }
            };
            let boundary = || RegistryError::Boundary {
                kind: self.kind,
                name: record.name.clone(),
                edge,
            };
            let target = match edge {
                Edge::Top if current == 1 => return Err(boundary()),
                Edge::Top => current - 1,
                Edge::Bottom => current + 1,
            };
            let neighbour = match fetch_by_sortindex(tx, self.table, target)? {
                Some(neighbour) => neighbour,
                None if edge == Edge::Bottom => return Err(boundary()),
                None => {
                    return Err(StoreError::Corrupt(format!(
                        "{} chain has a gap at sortindex {target}",
                        self.kind
                    ))
                    .into())
                }
            };
            set_position(tx, self.table, neighbour.id, true, Some(current))?;
            set_position(tx, self.table, record.id, true, Some(target))?;
            record.sortindex = Some(target);
            Ok(record)
        })?;
        tracing::info!(kind = %self.kind, name = %record.name, sortindex = ?record.sortindex, "moved subplugin");
        Ok(record)
    }

    fn require(&self, conn: &Connection, id: i64) -> RegistryResult<SubpluginRecord> {
        fetch_by_id(conn, self.table, id)?.ok_or_else(|| self.not_found(&format!("#{id}")))
    }

    fn not_found(&self, key: &str) -> RegistryError {
        RegistryError::NotFound {
            kind: self.kind,
            key: key.to_string(),
        }
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SubpluginRecord> {
    Ok(SubpluginRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        sortindex: row.get(2)?,
        enabled: row.get(3)?,
    })
}

fn fetch_by_id(conn: &Connection, table: &str, id: i64) -> StoreResult<Option<SubpluginRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM {table} WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], row_to_record).optional()?)
}

fn fetch_by_name(
    conn: &Connection,
    table: &str,
    name: &str,
) -> StoreResult<Option<SubpluginRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM {table} WHERE name = ?1");
    Ok(conn.query_row(&sql, [name], row_to_record).optional()?)
}

fn fetch_by_sortindex(
    conn: &Connection,
    table: &str,
    sortindex: u32,
) -> StoreResult<Option<SubpluginRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM {table} WHERE enabled = 1 AND sortindex = ?1");
    Ok(conn.query_row(&sql, [sortindex], row_to_record).optional()?)
}

fn list_records(conn: &Connection, table: &str) -> StoreResult<Vec<SubpluginRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM {table} ORDER BY enabled DESC, sortindex, name");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn max_sortindex(conn: &Connection, table: &str) -> StoreResult<Option<u32>> {
    let sql = format!("SELECT MAX(sortindex) FROM {table} WHERE enabled = 1");
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

fn insert_record(conn: &Connection, table: &str, name: &str) -> StoreResult<SubpluginRecord> {
    let sql = format!("INSERT INTO {table} (name, sortindex, enabled) VALUES (?1, NULL, 0)");
    conn.execute(&sql, [name])?;
    Ok(SubpluginRecord {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        sortindex: None,
        enabled: false,
    })
}

fn delete_record(conn: &Connection, table: &str, record: &SubpluginRecord) -> StoreResult<()> {
    let sql = format!("DELETE FROM {table} WHERE id = ?1");
    conn.execute(&sql, [record.id])?;
    if let (true, Some(sortindex)) = (record.enabled, record.sortindex) {
        compact_after(conn, table, sortindex)?;
    }
    Ok(())
}

fn set_position(
    conn: &Connection,
    table: &str,
    id: i64,
    enabled: bool,
    sortindex: Option<u32>,
) -> StoreResult<()> {
    let sql = format!("UPDATE {table} SET enabled = ?1, sortindex = ?2 WHERE id = ?3");
    conn.execute(&sql, rusqlite::params![enabled, sortindex, id])?;
    Ok(())
}

/// Close the gap left at `sortindex`.
fn compact_after(conn: &Connection, table: &str, sortindex: u32) -> StoreResult<()> {
    let sql = format!(
        "UPDATE {table} SET sortindex = sortindex - 1 WHERE enabled = 1 AND sortindex > ?1"
    );
    conn.execute(&sql, [sortindex])?;
    Ok(())
}
