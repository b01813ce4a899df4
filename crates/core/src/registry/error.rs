//! Error types for registry operations.
//!
//! Every variant is raised before anything is written, or causes the
//! surrounding transaction to roll back.

use crate::store::StoreError;
use cc_protocol::SubpluginKind;
use std::fmt;
use thiserror::Error;

/// End of the enabled chain a move ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Top => f.write_str("top"),
            Edge::Bottom => f.write_str("bottom"),
        }
    }
}

/// Errors that can occur while changing the registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{kind} subplugin '{name}' is already registered")]
    DuplicateName { kind: SubpluginKind, name: String },

    #[error("{kind} subplugin {key} not found")]
    NotFound { kind: SubpluginKind, key: String },

    #[error("{kind} subplugin '{name}' is already enabled")]
    AlreadyEnabled { kind: SubpluginKind, name: String },

    #[error("{kind} subplugin '{name}' is already disabled")]
    AlreadyDisabled { kind: SubpluginKind, name: String },

    /// Reordering requires an enabled record.
    #[error("{kind} subplugin '{name}' is not enabled")]
    NotEnabled { kind: SubpluginKind, name: String },

    #[error("{kind} subplugin '{name}' is already at the {edge} of the chain")]
    Boundary {
        kind: SubpluginKind,
        name: String,
        edge: Edge,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Type alias for Result with RegistryError.
pub type RegistryResult<T> = Result<T, RegistryError>;
