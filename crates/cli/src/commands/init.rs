use std::path::Path;

use cc_core::init::{generate_config_structure, InitOptions};
use colored::Colorize;
use color_eyre::Result;

/// Execute the `init` command: scaffold `.cleanup-courses/` under `root`.
pub async fn execute(root: &Path, force: bool, minimal: bool) -> Result<()> {
    let dir = generate_config_structure(InitOptions {
        target_dir: root.to_path_buf(),
        force,
        minimal,
    })
    .await?;

    println!("{} {}", "Created".green(), dir.display());
    if minimal {
        println!("Add courses.yaml before running `cleanupcourses evaluate`.");
    } else {
        println!("Edit courses.yaml and config.toml, then enable triggers and steps.");
    }
    Ok(())
}
