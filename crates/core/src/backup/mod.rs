//! Course backups taken before destructive steps.
//!
//! The platform produces the archive through
//! [`CourseBackend`](crate::courses::CourseBackend); this module records
//! where it went so an administrator can list and restore it later.

pub mod error;
pub mod manager;

pub use error::{BackupError, BackupResult};
pub use manager::BackupManager;
