//! Preflight command - checks everything a packaging run needs.

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::PackConfig;
use crate::preflight;

/// Execute the preflight command.
pub fn cmd_preflight(project_dir: &Path, config: &PackConfig, strict: bool) -> Result<()> {
    let report = preflight::run_checks(project_dir, config);
    report.print();

    if !report.all_passed() {
        if strict {
            bail!("{} preflight check(s) failed", report.fail_count());
        }
        println!("Some checks failed; packaging would abort.");
    }
    Ok(())
}
