//! Removal of packaging outputs.

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::PackConfig;
use crate::package::{checksum_path, report_path};
use crate::pipenv::EnvironmentManager;

/// Remove the archive and its sidecars (checksum, report, incomplete
/// marker).
pub fn clean_archive(project_dir: &Path, config: &PackConfig) -> Result<()> {
    let archive = project_dir.join(&config.archive_name);
    let targets = [
        archive.clone(),
        project_dir.join(config.incomplete_name()),
        checksum_path(&archive),
        report_path(&archive),
    ];

    let mut cleaned = false;
    for path in targets {
        if path.exists() {
            println!("Removing {}...", path.display());
            fs::remove_file(&path)?;
            cleaned = true;
        }
    }

    if cleaned {
        println!("Archive outputs cleaned.");
    } else {
        println!("No archive outputs to clean.");
    }
    Ok(())
}

/// Remove the project's virtualenv.
pub fn clean_environment(project_dir: &Path, env: &dyn EnvironmentManager) -> Result<()> {
    println!("Removing virtualenv...");
    env.remove_environment(project_dir)?;
    Ok(())
}

/// Remove everything (archive outputs + virtualenv).
pub fn clean_all(
    project_dir: &Path,
    config: &PackConfig,
    env: &dyn EnvironmentManager,
) -> Result<()> {
    clean_archive(project_dir, config)?;
    clean_environment(project_dir, env)?;
    println!("\nFull clean complete.");
    Ok(())
}
