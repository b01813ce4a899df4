//! Configuration loading and management.
//!
//! This module provides functionality to load the `.cleanup-courses/`
//! directory: `config.toml` for settings and the YAML course list the
//! command line evaluates.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_courses, save_courses};
pub use models::{AppConfig, CourseList, CONFIG_DIR, CONFIG_FILE};
