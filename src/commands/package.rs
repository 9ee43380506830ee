//! Package command - builds the deployment archive.

use anyhow::Result;
use std::path::Path;

use crate::archive::{self, ZipCli};
use crate::config::PackConfig;
use crate::package;
use crate::pipenv::Pipenv;

/// Execute the package command.
pub fn cmd_package(project_dir: &Path, config: &PackConfig, verify: bool) -> Result<()> {
    archive::check_host_tools()?;

    package::package(project_dir, config, &Pipenv, &ZipCli, verify)?;
    Ok(())
}
