//! SQLite persistence for the registry, the lifecycle ledger and backups.
//!
//! Every mutation runs inside [`SqliteStore::with_transaction`], so readers
//! never observe a half-renumbered chain or a half-written entry.

pub mod error;
pub mod schema;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteStore;
