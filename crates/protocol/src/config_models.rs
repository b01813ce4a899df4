//! Global configuration models for `.cleanup-courses/config.toml`.
//!
//! This module defines the structure of the configuration file that controls
//! where state is kept and how each subplugin behaves.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Represents global settings from `.cleanup-courses/config.toml`.
///
/// Relative paths are resolved against the `.cleanup-courses/` directory.
///
/// # Example
///
/// ```toml
/// # .cleanup-courses/config.toml
/// database = "cleanupcourses.db"
/// courses = "courses.yaml"
///
/// [triggers.startdatedelay]
/// delay = 15552000
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GlobalConfig {
    /// SQLite database holding the registry, ledger and backups.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// YAML file listing the courses to evaluate.
    #[serde(default = "default_courses")]
    pub courses: PathBuf,

    /// Directory backups are written to.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Entries left `running` for longer than this are failed on startup.
    #[serde(default = "default_stale_claim_secs")]
    pub stale_claim_secs: u64,

    /// Settings per trigger, keyed by trigger name.
    #[serde(default)]
    pub triggers: BTreeMap<String, Value>,

    /// Settings per step, keyed by step name.
    #[serde(default)]
    pub steps: BTreeMap<String, Value>,
}

fn default_database() -> PathBuf {
    PathBuf::from("cleanupcourses.db")
}

fn default_courses() -> PathBuf {
    PathBuf::from("courses.yaml")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_stale_claim_secs() -> u64 {
    3600
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            courses: default_courses(),
            backup_dir: default_backup_dir(),
            stale_claim_secs: default_stale_claim_secs(),
            triggers: BTreeMap::new(),
            steps: BTreeMap::new(),
        }
    }
}

impl GlobalConfig {
    /// Settings for a trigger, or `null` when none are configured.
    pub fn trigger_settings(&self, name: &str) -> Value {
        self.triggers.get(name).cloned().unwrap_or(Value::Null)
    }

    /// Settings for a step, or `null` when none are configured.
    pub fn step_settings(&self, name: &str) -> Value {
        self.steps.get(name).cloned().unwrap_or(Value::Null)
    }
}
