//! The packaging pipeline.
//!
//! Seven steps, strictly ordered, fail-fast: reset the virtualenv, reinstall
//! from the lock file, resolve site-packages, bulk-add libraries (minus the
//! runtime-provided ones), add their annotation companions, prune packaging
//! metadata, and finally add the first-party files. A failure in the last
//! step renames the archive to `<name>.incomplete` so a library-only zip is
//! never mistaken for a finished artifact.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::archive::ArchiveBuilder;
use crate::config::PackConfig;
use crate::patterns::{companion_pattern, PatternSet};
use crate::pipenv::{resolve_site_packages, EnvironmentManager};
use crate::timing::Timer;
use crate::verify;

/// Summary of a completed packaging run, written next to the archive as
/// `<archive>.report.json` for downstream deploy tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReport {
    /// Archive filename.
    pub archive: String,
    /// Number of entries in the final archive.
    pub entries: usize,
    /// Uncompressed size of the site-packages payload in bytes.
    pub payload_bytes: u64,
    /// SHA-256 of the archive file, hex encoded.
    pub sha256: String,
    /// Wall-clock duration of the whole run in seconds.
    pub duration_secs: f64,
}

/// Run the packaging pipeline in `project_dir`.
///
/// When `verify` is set the finished archive's listing is checked against
/// the packaging invariants before the report is written.
pub fn package(
    project_dir: &Path,
    config: &PackConfig,
    env: &dyn EnvironmentManager,
    builder: &dyn ArchiveBuilder,
    verify: bool,
) -> Result<PackageReport> {
    println!("=== Packaging {} ===\n", config.archive_name);
    let total = Timer::start("total");

    // 1. Reset the virtualenv so stale or removed dependencies cannot leak
    //    into the artifact.
    println!("Resetting virtualenv...");
    env.remove_environment(project_dir)?;

    // 2. Reinstall from the lock file. Deploy mode fails instead of
    //    re-resolving when the lock disagrees with the manifest.
    println!("Installing dependencies (deploy mode)...");
    let timer = Timer::start("pipenv install --deploy");
    env.install_deploy(project_dir)?;
    timer.finish();

    // 3. Resolve where the installed libraries live.
    let venv_root = env.environment_root(project_dir)?;
    let site_packages = resolve_site_packages(&venv_root, config.python_version.as_deref())?;
    println!("Site-packages: {}", site_packages.display());
    let payload_bytes = tree_size(&site_packages);

    let archive = project_dir.join(&config.archive_name);
    remove_stale_outputs(project_dir, config)?;

    // 4. Bulk-add everything except the excluded libraries' full trees.
    println!("\nAdding site-packages to archive...");
    let timer = Timer::start("bulk add");
    builder.add_tree(&archive, &site_packages, &config.exclusion_patterns())?;
    timer.finish();

    // 5. Add the excluded libraries' type-annotation companions. Discovery
    //    happens here so that an absent companion is a no-op rather than a
    //    zip error.
    let companions = discover_companions(&site_packages, config)?;
    if companions.is_empty() {
        println!("No annotation companions found; skipping.");
    } else {
        println!("Adding annotation companions: {}", companions.join(", "));
        builder.add_entries(&archive, &site_packages, &companions)?;
    }

    // 6. Prune packaging metadata.
    let metadata: Vec<String> = config.metadata_patterns.iter().cloned().collect();
    println!("Pruning packaging metadata...");
    builder.delete(&archive, &metadata)?;

    // 7. First-party files last. On failure the archive is marked unusable
    //    before the error propagates.
    let first_party: Vec<String> = config.first_party_files.iter().cloned().collect();
    println!("Adding first-party files: {}", first_party.join(", "));
    if let Err(err) = builder.add_files(&archive, project_dir, &first_party) {
        let marker = mark_incomplete(project_dir, config);
        println!(
            "ERROR: first-party files missing from archive; marked as {}",
            marker.display()
        );
        return Err(err).context("Archive is incomplete and must not be deployed");
    }

    let entries = builder.list(&archive)?;
    if verify {
        verify::verify_entries(&entries, config)?;
        println!("Archive verified OK.");
    }

    let sha256 = file_sha256(&archive)?;
    write_checksum_sidecar(&archive, &sha256)?;

    let report = PackageReport {
        archive: config.archive_name.clone(),
        entries: entries.len(),
        payload_bytes,
        sha256,
        duration_secs: total.finish(),
    };
    write_report_sidecar(&archive, &report)?;

    println!("\n=== Packaging Complete ===");
    println!("  Output: {}", archive.display());
    println!("  Entries: {}", report.entries);
    println!("  Payload: {} MB", report.payload_bytes / 1024 / 1024);
    println!("  SHA-256: {}", report.sha256);

    Ok(report)
}

/// Remove a previous run's outputs so repeated runs produce equivalent
/// archives (zip would otherwise append into the stale file).
fn remove_stale_outputs(project_dir: &Path, config: &PackConfig) -> Result<()> {
    let stale = [
        project_dir.join(&config.archive_name),
        project_dir.join(config.incomplete_name()),
        checksum_path(&project_dir.join(&config.archive_name)),
        report_path(&project_dir.join(&config.archive_name)),
    ];

    for path in stale {
        if path.exists() {
            println!("Removing stale {}...", path.display());
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }
    Ok(())
}

/// Top-level site-packages entries matching the excluded libraries'
/// annotation-companion patterns.
fn discover_companions(site_packages: &Path, config: &PackConfig) -> Result<Vec<String>> {
    let patterns: Vec<String> = config
        .excluded_libraries
        .iter()
        .map(|lib| companion_pattern(lib))
        .collect();
    let set = PatternSet::new(&patterns)?;

    let mut matches: Vec<String> = Vec::new();
    let entries = fs::read_dir(site_packages)
        .with_context(|| format!("Failed to read {}", site_packages.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if set.is_match(&name) {
            matches.push(name);
        }
    }

    matches.sort();
    Ok(matches)
}

/// Rename the archive to its `.incomplete` marker name. Best effort: if the
/// archive never materialized there is nothing to mark.
fn mark_incomplete(project_dir: &Path, config: &PackConfig) -> PathBuf {
    let archive = project_dir.join(&config.archive_name);
    let marker = project_dir.join(config.incomplete_name());
    if archive.exists() {
        let _ = fs::rename(&archive, &marker);
    }
    marker
}

/// Uncompressed size of a directory tree in bytes. Unreadable entries are
/// skipped; the figure is informational.
fn tree_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

/// SHA-256 of a file, hex encoded.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to hash {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Sidecar path for the archive checksum.
pub fn checksum_path(archive: &Path) -> PathBuf {
    sidecar(archive, "sha256")
}

/// Sidecar path for the packaging report.
pub fn report_path(archive: &Path) -> PathBuf {
    sidecar(archive, "report.json")
}

fn sidecar(archive: &Path, suffix: &str) -> PathBuf {
    let mut name = archive.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{suffix}"));
    archive.with_file_name(name)
}

/// Write the checksum in `sha256sum` format so the deploy pipeline can
/// verify with `sha256sum -c`.
fn write_checksum_sidecar(archive: &Path, sha256: &str) -> Result<()> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = checksum_path(archive);
    fs::write(&path, format!("{sha256}  {name}\n"))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn write_report_sidecar(archive: &Path, report: &PackageReport) -> Result<()> {
    let path = report_path(archive);
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
