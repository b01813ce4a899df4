//! Initialization module for creating `.cleanup-courses` directories.
//!
//! This module provides functionality to initialize a new project by
//! generating a `.cleanup-courses/` directory with:
//! - Global configuration (`config.toml`) listing every built-in setting
//! - A course list (`courses.yaml`) to fill in
//!
//! # Example
//!
//! ```no_run
//! use cc_core::init::{generate_config_structure, InitOptions};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//!     minimal: false,
//! };
//!
//! generate_config_structure(options).await?;
//! println!("Cleanup courses initialized successfully!");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_config_structure, InitOptions};
pub use templates::{get_template, list_templates};
