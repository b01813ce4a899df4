//! # cc-protocol
//!
//! Shared data models for cleanup-courses.
//!
//! This crate defines the plain data structures exchanged between the core
//! engine, its persistent store and the command line:
//! - Subplugin registry records and administrative actions
//! - Courses as seen by triggers and steps
//! - Trigger responses and step outcomes
//! - Lifecycle ledger entries, history and backup records
//! - Global configuration from `config.toml`
//! - Events emitted while courses move through the pipeline
//!
//! ## Modules
//!
//! - [`subplugin_models`]: Subplugin kinds, records and admin actions
//! - [`course_models`]: Course snapshot consumed by subplugins
//! - [`response_models`]: Trigger responses and step outcomes
//! - [`ledger_models`]: Lifecycle entries, history and backups
//! - [`config_models`]: Global configuration
//! - [`ipc`]: Events sent from the engine to its observers
//!
//! ## Design Principles
//!
//! - Minimal dependencies: only serde, serde_json and chrono
//! - Independent compilation: no dependencies on other cleanup-courses crates

pub mod config_models;
pub mod course_models;
pub mod ipc;
pub mod ledger_models;
pub mod response_models;
pub mod subplugin_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use course_models::*;
pub use ipc::*;
pub use ledger_models::*;
pub use response_models::*;
pub use subplugin_models::*;
