//! # cc-core
//!
//! Course lifecycle engine for cleanup-courses.
//!
//! This crate provides:
//! - An ordered registry of trigger and step subplugins
//! - Trigger chain evaluation deciding which courses are flagged
//! - A step pipeline driving flagged courses to completion
//! - The persisted lifecycle ledger and its history
//! - Configuration loading from the `.cleanup-courses/` directory
//!
//! ## Modules
//!
//! - [`store`]: SQLite persistence
//! - [`registry`]: Subplugin registry and capability catalog
//! - [`subplugins`]: Trigger and Step traits and built-in implementations
//! - [`engine`]: Evaluation and advance entry points
//! - [`state`]: Entry state machine and the lifecycle ledger
//! - [`backup`]: Backup bookkeeping
//! - [`courses`]: Boundary to the learning platform
//! - [`config`]: Configuration loading
//! - [`init`]: Configuration directory scaffolding

pub mod backup;
pub mod config;
pub mod courses;
pub mod engine;
pub mod init;
pub mod registry;
pub mod state;
pub mod store;
pub mod subplugins;
