//! Preflight checks for the packaging run.
//!
//! Validates host tools and project files before the (slow) dependency
//! install starts. Run with `lambda-pack preflight`.

use std::path::Path;

use crate::config::PackConfig;
use crate::pipenv::{LOCK_FILE, MANIFEST_FILE};

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed.
    Pass,
    /// Check failed - packaging will fail.
    Fail,
    /// Check passed but with a warning.
    Warn,
}

impl CheckResult {
    fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: None,
        }
    }

    fn pass_with(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details.to_string()),
        }
    }

    fn fail(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details.to_string()),
        }
    }

    fn warn(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: Some(details.to_string()),
        }
    }
}

/// Results of all preflight checks.
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    /// Returns true if all checks passed (no failures).
    pub fn all_passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    /// Count of failed checks.
    pub fn fail_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
            .count()
    }

    /// Count of warnings.
    pub fn warn_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Warn)
            .count()
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("=== Preflight Check Results ===\n");

        for check in &self.checks {
            let (icon, status_str) = match check.status {
                CheckStatus::Pass => ("✓", "PASS"),
                CheckStatus::Fail => ("✗", "FAIL"),
                CheckStatus::Warn => ("⚠", "WARN"),
            };

            print!("  {} [{}] {}", icon, status_str, check.name);
            if let Some(details) = &check.details {
                println!(": {}", details);
            } else {
                println!();
            }
        }

        println!();
        println!(
            "{} checks, {} failed, {} warnings",
            self.checks.len(),
            self.fail_count(),
            self.warn_count()
        );
    }
}

/// Run all preflight checks for a packaging run in `project_dir`.
pub fn run_checks(project_dir: &Path, config: &PackConfig) -> PreflightReport {
    let mut checks = Vec::new();

    for tool in ["pipenv", "zip", "unzip", "python3"] {
        checks.push(check_tool(tool));
    }

    checks.push(check_file(project_dir, MANIFEST_FILE, "pipenv manifest"));
    checks.push(check_file(project_dir, LOCK_FILE, "pipenv lock file"));
    checks.push(check_lock_freshness(project_dir));

    for file in &config.first_party_files {
        checks.push(check_file(project_dir, file, "first-party file"));
    }

    PreflightReport { checks }
}

fn check_tool(tool: &str) -> CheckResult {
    match which::which(tool) {
        Ok(path) => CheckResult::pass_with(tool, &path.display().to_string()),
        Err(_) => CheckResult::fail(tool, "not found in PATH"),
    }
}

fn check_file(project_dir: &Path, file: &str, kind: &str) -> CheckResult {
    if project_dir.join(file).is_file() {
        CheckResult::pass(file)
    } else {
        CheckResult::fail(
            file,
            &format!("{} not found in {}", kind, project_dir.display()),
        )
    }
}

/// Warn when the lock file predates the manifest; a deploy-mode install
/// would then likely abort.
fn check_lock_freshness(project_dir: &Path) -> CheckResult {
    let manifest = project_dir.join(MANIFEST_FILE);
    let lock = project_dir.join(LOCK_FILE);

    let (Ok(manifest_meta), Ok(lock_meta)) = (manifest.metadata(), lock.metadata()) else {
        // Presence is reported by the file checks.
        return CheckResult::pass("lock freshness");
    };

    match (manifest_meta.modified(), lock_meta.modified()) {
        (Ok(m), Ok(l)) if l < m => CheckResult::warn(
            "lock freshness",
            "Pipfile.lock is older than Pipfile; run 'pipenv lock' if dependencies changed",
        ),
        _ => CheckResult::pass("lock freshness"),
    }
}
