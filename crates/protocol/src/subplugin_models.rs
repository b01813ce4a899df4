//! Subplugin registry models.
//!
//! Triggers and steps are both installed as subplugins. Each kind keeps its
//! own ordered list of records; the order of the enabled records decides the
//! order in which triggers are checked and steps are run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two families of subplugins managed by the registry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubpluginKind {
    /// Checks deciding whether a course enters the pipeline.
    Trigger,

    /// Units of work a flagged course is driven through.
    Step,
}

impl SubpluginKind {
    /// Lowercase name used in logs and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            SubpluginKind::Trigger => "trigger",
            SubpluginKind::Step => "step",
        }
    }
}

impl fmt::Display for SubpluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered subplugin and its position in the chain.
///
/// Enabled records carry a dense, 1-based `sortindex`; disabled records
/// never carry one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubpluginRecord {
    /// Store-assigned identifier used by administrative actions.
    pub id: i64,

    /// Unique subplugin name within its kind (e.g. `startdatedelay`).
    pub name: String,

    /// Rank among the enabled records of the same kind.
    pub sortindex: Option<u32>,

    /// Whether the subplugin takes part in evaluation.
    pub enabled: bool,
}

/// Administrative actions that address a subplugin by id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    /// Append the subplugin at the tail of the enabled chain.
    Enable,

    /// Remove the subplugin from the enabled chain.
    Disable,

    /// Swap with the enabled neighbour one position earlier.
    MoveUp,

    /// Swap with the enabled neighbour one position later.
    MoveDown,
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdminAction::Enable => "enable",
            AdminAction::Disable => "disable",
            AdminAction::MoveUp => "up",
            AdminAction::MoveDown => "down",
        };
        f.write_str(name)
    }
}

impl FromStr for AdminAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enable" => Ok(AdminAction::Enable),
            "disable" => Ok(AdminAction::Disable),
            "up" | "move_up" => Ok(AdminAction::MoveUp),
            "down" | "move_down" => Ok(AdminAction::MoveDown),
            other => Err(format!("unknown admin action: {other}")),
        }
    }
}
