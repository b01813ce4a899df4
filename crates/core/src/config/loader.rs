//! Configuration file loader for the `.cleanup-courses/` directory.
//!
//! This module provides functionality to load and validate:
//! - `config.toml`: global settings and per-subplugin settings
//! - the YAML course list (`courses.yaml` by default)

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{AppConfig, CourseList, CONFIG_DIR, CONFIG_FILE};
use cc_protocol::{Course, GlobalConfig};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Loads the configuration from the `.cleanup-courses/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.cleanup-courses/` folder
///
/// # Returns
///
/// An `AppConfig` for `root`. If the directory or `config.toml` is missing,
/// returns the default configuration rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - `config.toml` exists but cannot be read
/// - it has invalid TOML syntax
/// - a value is out of range (see [`validate`])
///
/// # Example
///
/// ```rust,no_run
/// use cc_core::config::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Stale claims expire after {}s", config.global.stale_claim_secs);
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let dir = root.join(CONFIG_DIR);
    let config_path = dir.join(CONFIG_FILE);

    // If config.toml doesn't exist, return default
    if !config_path.exists() {
        return Ok(AppConfig::defaults_for(root));
    }

    let content = tokio::fs::read_to_string(&config_path)
        .await
        .map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let global: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    validate(&config_path, &global)?;
    Ok(AppConfig { dir, global })
}

/// Checks values serde can't: non-zero limits and table-shaped settings.
fn validate(path: &Path, global: &GlobalConfig) -> ConfigResult<()> {
    let invalid = |reason: String| ConfigError::InvalidConfig {
        path: path.to_path_buf(),
        reason,
    };

    if global.stale_claim_secs == 0 {
        return Err(invalid("stale_claim_secs must be greater than 0".to_string()));
    }
    for (section, settings) in [("triggers", &global.triggers), ("steps", &global.steps)] {
        for (name, value) in settings {
            if !value.is_object() {
                return Err(invalid(format!("[{section}.{name}] must be a table")));
            }
        }
    }
    Ok(())
}

/// The two accepted shapes of the course list file.
#[derive(Deserialize)]
#[serde(untagged)]
enum CourseFile {
    Plain(Vec<Course>),
    Tracked(CourseList),
}

/// Loads the course list from a YAML file.
///
/// A missing file is an empty course list.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, if two
/// courses share an id, or if `next_id` is not above every course id.
pub async fn load_courses(path: &Path) -> ConfigResult<CourseList> {
    if !path.exists() {
        return Ok(CourseList::default());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    let file: Option<CourseFile> =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
            path: path.to_path_buf(),
            source,
        })?;
    let list = match file {
        None => CourseList::default(),
        Some(CourseFile::Plain(courses)) => CourseList::new(courses),
        Some(CourseFile::Tracked(list)) => list,
    };

    let invalid = |reason: String| ConfigError::InvalidConfig {
        path: path.to_path_buf(),
        reason,
    };
    let mut seen = BTreeSet::new();
    for course in &list.courses {
        if !seen.insert(course.id) {
            return Err(invalid(format!(
                "course id {} appears more than once",
                course.id
            )));
        }
    }
    if let (Some(next_id), Some(max)) = (list.next_id, seen.last()) {
        if next_id <= *max {
            return Err(invalid(format!(
                "next_id {next_id} must be greater than the highest course id {max}"
            )));
        }
    }
    Ok(list)
}

/// Writes the course list back, e.g. after steps deleted or duplicated courses.
pub async fn save_courses(path: &Path, list: &CourseList) -> ConfigResult<()> {
    let content = serde_yaml::to_string(list).map_err(|source| ConfigError::YamlWrite {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, content)
        .await
        .map_err(|source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
}
