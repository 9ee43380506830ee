//! Archive assembly through the zip/unzip CLIs.

use anyhow::{bail, Result};
use std::path::Path;

use crate::process::Cmd;

/// zip's "nothing to do" exit code; deleting entries that are not present
/// is an acceptable end state, not a failure.
const ZIP_NOTHING_TO_DO: i32 = 12;

/// Maximum compression, matching the deployment size constraints of the
/// hosting platform.
const COMPRESSION_LEVEL: &str = "-9";

/// Narrow interface over the archive tool so the pipeline can be driven
/// against a fake that records calls.
pub trait ArchiveBuilder {
    /// Recursively add the contents of `dir` to the archive, skipping
    /// entries matching any of `exclude` (zip-style patterns).
    fn add_tree(&self, archive: &Path, dir: &Path, exclude: &[String]) -> Result<()>;

    /// Recursively add the named entries (files or directories relative to
    /// `dir`). An empty list is a no-op.
    fn add_entries(&self, archive: &Path, dir: &Path, entries: &[String]) -> Result<()>;

    /// Delete all entries matching the patterns from the archive. Patterns
    /// matching nothing are a no-op.
    fn delete(&self, archive: &Path, patterns: &[String]) -> Result<()>;

    /// Add individual files from `dir` at the archive root.
    fn add_files(&self, archive: &Path, dir: &Path, files: &[String]) -> Result<()>;

    /// List the archive's entry names.
    fn list(&self, archive: &Path) -> Result<Vec<String>>;
}

/// Production implementation shelling out to `zip` and `unzip`.
pub struct ZipCli;

impl ArchiveBuilder for ZipCli {
    fn add_tree(&self, archive: &Path, dir: &Path, exclude: &[String]) -> Result<()> {
        let mut cmd = Cmd::new("zip")
            .args([COMPRESSION_LEVEL, "-r", "-q"])
            .arg_path(archive)
            .arg(".")
            .dir(dir)
            .error_msg("zip failed while adding site-packages");

        if !exclude.is_empty() {
            // zip wants each exclusion introduced by its own -x.
            for pattern in exclude {
                cmd = cmd.arg("-x").arg(pattern);
            }
        }

        cmd.run()?;
        Ok(())
    }

    fn add_entries(&self, archive: &Path, dir: &Path, entries: &[String]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        Cmd::new("zip")
            .args([COMPRESSION_LEVEL, "-r", "-q"])
            .arg_path(archive)
            .args(entries)
            .dir(dir)
            .error_msg("zip failed while adding annotation companions")
            .run()?;
        Ok(())
    }

    fn delete(&self, archive: &Path, patterns: &[String]) -> Result<()> {
        if patterns.is_empty() {
            return Ok(());
        }

        let result = Cmd::new("zip")
            .args(["-q", "-d"])
            .arg_path(archive)
            .args(patterns)
            .allow_fail()
            .run()?;

        if !result.success() && result.code() != ZIP_NOTHING_TO_DO {
            bail!(
                "zip -d failed (exit code {}):\n{}",
                result.code(),
                result.stderr_trimmed()
            );
        }
        Ok(())
    }

    fn add_files(&self, archive: &Path, dir: &Path, files: &[String]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        for file in files {
            if !dir.join(file).is_file() {
                bail!(
                    "First-party file '{}' not found in {}",
                    file,
                    dir.display()
                );
            }
        }

        Cmd::new("zip")
            .args([COMPRESSION_LEVEL, "-q"])
            .arg_path(archive)
            .args(files)
            .dir(dir)
            .error_msg("zip failed while adding first-party files")
            .run()?;
        Ok(())
    }

    fn list(&self, archive: &Path) -> Result<Vec<String>> {
        if !archive.is_file() {
            bail!("Archive not found at {}", archive.display());
        }

        let result = Cmd::new("unzip")
            .args(["-Z1"])
            .arg_path(archive)
            .error_msg("unzip failed while listing the archive")
            .run()?;

        Ok(result
            .stdout
            .lines()
            .map(|l| l.trim_end().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }
}

/// Check that the archive tools are available before starting a build.
pub fn check_host_tools() -> Result<()> {
    let tools = [
        ("zip", "zip"),
        ("unzip", "unzip"),
        ("pipenv", "pipenv (pip install pipenv)"),
    ];

    for (tool, package) in tools {
        if !crate::process::exists(tool) {
            bail!(
                "{} not found. Install {} and retry.\n\
                 On Fedora: sudo dnf install {}\n\
                 On Ubuntu: sudo apt install {}",
                tool,
                package,
                tool,
                tool
            );
        }
    }

    Ok(())
}
