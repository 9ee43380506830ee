//! Virtualenv lifecycle through the pipenv CLI.
//!
//! The packager never resolves dependencies itself; pipenv owns the
//! manifest (`Pipfile`), the lock (`Pipfile.lock`), and the virtualenv.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::process::Cmd;

/// Manifest filename pipenv reads.
pub const MANIFEST_FILE: &str = "Pipfile";
/// Lock filename pipenv reads in deploy mode.
pub const LOCK_FILE: &str = "Pipfile.lock";

/// Narrow interface over the dependency-environment manager so the pipeline
/// can be driven against a fake in tests.
pub trait EnvironmentManager {
    /// Destroy the project's virtualenv. Absence of a virtualenv is not an
    /// error; removal is idempotent.
    fn remove_environment(&self, project_dir: &Path) -> Result<()>;

    /// Install all declared dependencies into a fresh virtualenv in deploy
    /// mode: fails if the lock file is missing or out of sync with the
    /// manifest instead of re-resolving.
    fn install_deploy(&self, project_dir: &Path) -> Result<()>;

    /// Path to the virtualenv's root directory.
    fn environment_root(&self, project_dir: &Path) -> Result<PathBuf>;
}

/// Production implementation shelling out to `pipenv`.
pub struct Pipenv;

impl Pipenv {
    fn base_cmd(&self, project_dir: &Path) -> Cmd {
        // An active virtualenv would make pipenv operate on that env
        // instead of the project's own.
        Cmd::new("pipenv")
            .dir(project_dir)
            .env_remove("VIRTUAL_ENV")
            .env("PIPENV_IGNORE_VIRTUALENVS", "1")
    }
}

impl EnvironmentManager for Pipenv {
    fn remove_environment(&self, project_dir: &Path) -> Result<()> {
        let result = self.base_cmd(project_dir).arg("--rm").allow_fail().run()?;

        // pipenv --rm exits non-zero when there is nothing to remove.
        if !result.success() {
            let stderr = result.stderr_trimmed();
            let stdout = result.stdout_trimmed();
            if stderr.contains("No virtualenv") || stdout.contains("No virtualenv") {
                println!("  No existing virtualenv to remove.");
                return Ok(());
            }
            bail!(
                "pipenv --rm failed (exit code {}):\n{}",
                result.code(),
                if stderr.is_empty() { stdout } else { stderr }
            );
        }

        println!("  Removed existing virtualenv.");
        Ok(())
    }

    fn install_deploy(&self, project_dir: &Path) -> Result<()> {
        if !project_dir.join(LOCK_FILE).exists() {
            bail!(
                "{} not found in {}.\n\
                 Deploy installs require a lock file; run 'pipenv lock' first.",
                LOCK_FILE,
                project_dir.display()
            );
        }

        // Streams pipenv's own progress output; a lock/manifest mismatch
        // aborts here before the archive is touched.
        self.base_cmd(project_dir)
            .args(["install", "--deploy"])
            .error_msg(
                "pipenv install --deploy failed. \
                 If the lock file is out of date, run 'pipenv lock' and retry",
            )
            .run_streaming()?;

        Ok(())
    }

    fn environment_root(&self, project_dir: &Path) -> Result<PathBuf> {
        let result = self
            .base_cmd(project_dir)
            .arg("--venv")
            .error_msg("pipenv --venv failed; was the install step skipped?")
            .run()?;

        let path = PathBuf::from(result.stdout_trimmed());
        if !path.is_dir() {
            bail!(
                "pipenv reported virtualenv at {} but it does not exist",
                path.display()
            );
        }
        Ok(path)
    }
}

/// Resolve the installed-package directory inside a virtualenv.
///
/// With a configured interpreter version the subpath is fixed
/// (`lib/python<version>/site-packages`); otherwise `lib/` is scanned for
/// `python3.*` directories that contain one, newest version winning. The
/// scan keeps the packager working across interpreter upgrades without
/// editing configuration.
pub fn resolve_site_packages(venv_root: &Path, python_version: Option<&str>) -> Result<PathBuf> {
    if let Some(version) = python_version {
        let path = venv_root
            .join("lib")
            .join(format!("python{version}"))
            .join("site-packages");
        if !path.is_dir() {
            bail!(
                "site-packages not found at {} (PACK_PYTHON_VERSION={})",
                path.display(),
                version
            );
        }
        return Ok(path);
    }

    let lib_dir = venv_root.join("lib");
    let entries = std::fs::read_dir(&lib_dir)
        .with_context(|| format!("Failed to read {}", lib_dir.display()))?;

    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("python3") && entry.path().join("site-packages").is_dir() {
            candidates.push(entry.path());
        }
    }

    // Lexicographic order is wrong for "python3.9" vs "python3.10"; compare
    // the numeric minor version.
    candidates.sort_by_key(|p| minor_version(p));

    match candidates.pop() {
        Some(dir) => Ok(dir.join("site-packages")),
        None => bail!(
            "No python3.* site-packages directory under {}.\n\
             Was the virtualenv created with a Python 3 interpreter?",
            lib_dir.display()
        ),
    }
}

fn minor_version(path: &Path) -> u32 {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix("python3."))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
