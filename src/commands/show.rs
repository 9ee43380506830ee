//! Show command - displays information.

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::PackConfig;
use crate::process::Cmd;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show effective configuration
    Config,
    /// List the built archive's contents
    Archive,
}

/// Execute the show command.
pub fn cmd_show(project_dir: &Path, config: &PackConfig, target: ShowTarget) -> Result<()> {
    match target {
        ShowTarget::Config => {
            config.print();
        }
        ShowTarget::Archive => {
            let archive = project_dir.join(&config.archive_name);
            if !archive.exists() {
                bail!(
                    "Archive not found at {}. Run 'lambda-pack package' first.",
                    archive.display()
                );
            }
            Cmd::new("unzip")
                .arg("-l")
                .arg_path(&archive)
                .error_msg("unzip failed. Install: sudo apt install unzip")
                .run_streaming()?;
        }
    }
    Ok(())
}
