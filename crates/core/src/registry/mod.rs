//! Subplugin registration and lookup.
//!
//! This module provides:
//! - [`SubpluginRegistry`]: the persisted, ordered list of installed
//!   subplugins of one kind, with enable/disable and reordering
//! - [`SubpluginCatalog`]: the capability handles (`Trigger`/`Step`
//!   implementations) the engine dispatches to by name

pub mod catalog;
pub mod error;
pub mod manager;

pub use catalog::SubpluginCatalog;
pub use error::{Edge, RegistryError, RegistryResult};
pub use manager::{SubpluginRegistry, SyncReport};
