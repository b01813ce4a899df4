//! Configuration models that aggregate all settings.
//!
//! This module provides the `AppConfig` structure that pairs the parsed
//! `config.toml` with the directory it was loaded from, so relative paths
//! can be resolved.

use cc_protocol::{Course, GlobalConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration directory under the project root.
pub const CONFIG_DIR: &str = ".cleanup-courses";

/// Name of the settings file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Application configuration loaded from the `.cleanup-courses/` directory.
///
/// # Example
///
/// ```rust,no_run
/// use cc_core::config::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Database at {}", config.database_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// The `.cleanup-courses/` directory.
    pub dir: PathBuf,

    /// Settings from `config.toml`.
    pub global: GlobalConfig,
}

impl AppConfig {
    /// Default configuration for a project rooted at `root`.
    pub fn defaults_for(root: &Path) -> Self {
        Self {
            dir: root.join(CONFIG_DIR),
            global: GlobalConfig::default(),
        }
    }

    /// Path of `config.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.global.database)
    }

    pub fn courses_path(&self) -> PathBuf {
        self.resolve(&self.global.courses)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.resolve(&self.global.backup_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }
}

/// Contents of the course list file.
///
/// A bare YAML sequence of courses is accepted too; it is read as a list
/// without `next_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseList {
    /// Id the next created course takes. Ids of deleted courses are never
    /// handed out again, so this survives their removal from `courses`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<i64>,

    #[serde(default)]
    pub courses: Vec<Course>,
}

impl CourseList {
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            next_id: None,
            courses,
        }
    }
}
