//! Directory structure and file generation for `.cleanup-courses` initialization.

use super::error::{InitError, InitResult};
use super::templates::get_template;
use crate::config::CONFIG_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for initializing a `.cleanup-courses` directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Target directory where `.cleanup-courses` will be created.
    pub target_dir: PathBuf,

    /// Overwrite existing files if the directory exists.
    pub force: bool,

    /// Only write `config.toml`, no course list.
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generate a `.cleanup-courses` directory.
///
/// This function creates the following structure:
/// ```text
/// .cleanup-courses/
/// ├── config.toml
/// ├── courses.yaml (unless minimal)
/// └── backups/
/// ```
///
/// # Arguments
/// * `options` - Configuration for the initialization process
///
/// # Returns
/// The created directory, or an `InitError` if:
/// - The directory already exists (without force flag)
/// - File system operations fail
pub async fn generate_config_structure(options: InitOptions) -> InitResult<PathBuf> {
    let cc_dir = options.target_dir.join(CONFIG_DIR);

    if cc_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(cc_dir));
    }

    let backups = cc_dir.join("backups");
    fs::create_dir_all(&backups).map_err(|source| InitError::DirectoryCreate {
        path: backups,
        source,
    })?;

    write_template_file(&cc_dir, "config.toml")?;
    if !options.minimal {
        write_template_file(&cc_dir, "courses.yaml")?;
    }

    tracing::info!(dir = %cc_dir.display(), "initialized configuration directory");
    Ok(cc_dir)
}

fn write_template_file(cc_dir: &Path, template_path: &str) -> InitResult<()> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = cc_dir.join(template_path);
    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_generate_full_structure() {
        let temp = tempdir().unwrap();
        let options = InitOptions {
            target_dir: temp.path().to_path_buf(),
            force: false,
            minimal: false,
        };

        let dir = generate_config_structure(options).await.unwrap();

        assert!(dir.join("config.toml").exists());
        assert!(dir.join("courses.yaml").exists());
        assert!(dir.join("backups").is_dir());

        let config = load_config(temp.path()).await.unwrap();
        assert_eq!(config.global.stale_claim_secs, 3600);
    }

    #[tokio::test]
    async fn test_generate_minimal_structure() {
        let temp = tempdir().unwrap();
        let options = InitOptions {
            target_dir: temp.path().to_path_buf(),
            force: false,
            minimal: true,
        };

        let dir = generate_config_structure(options).await.unwrap();
        assert!(dir.join("config.toml").exists());
        assert!(!dir.join("courses.yaml").exists());
    }

    #[tokio::test]
    async fn test_existing_directory_requires_force() {
        let temp = tempdir().unwrap();
        let options = InitOptions {
            target_dir: temp.path().to_path_buf(),
            force: false,
            minimal: true,
        };
        generate_config_structure(options.clone()).await.unwrap();

        let again = generate_config_structure(options.clone()).await;
        assert!(matches!(again, Err(InitError::DirectoryExists(_))));

        let forced = InitOptions {
            force: true,
            ..options
        };
        assert!(generate_config_structure(forced).await.is_ok());
    }
}
