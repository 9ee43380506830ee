//! Clean command - removes packaging outputs.

use anyhow::Result;
use std::path::Path;

use crate::clean;
use crate::config::PackConfig;
use crate::pipenv::Pipenv;

/// Clean target for the clean command.
pub enum CleanTarget {
    /// Remove the archive and its sidecars (default)
    Archive,
    /// Remove the virtualenv
    Environment,
    /// Remove everything
    All,
}

/// Execute the clean command.
pub fn cmd_clean(project_dir: &Path, config: &PackConfig, target: CleanTarget) -> Result<()> {
    match target {
        CleanTarget::Archive => clean::clean_archive(project_dir, config)?,
        CleanTarget::Environment => clean::clean_environment(project_dir, &Pipenv)?,
        CleanTarget::All => clean::clean_all(project_dir, config, &Pipenv)?,
    }
    Ok(())
}
