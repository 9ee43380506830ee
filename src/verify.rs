//! Post-build archive verification.
//!
//! Checks the finished archive's listing against the packaging invariants:
//! first-party files present at the root, no packaging metadata left behind,
//! excluded library trees absent while their annotation companions are
//! allowed to remain.

use anyhow::{bail, Result};

use crate::config::PackConfig;
use crate::patterns::PatternSet;

/// Verify an archive listing against the packaging invariants.
pub fn verify_entries(entries: &[String], config: &PackConfig) -> Result<()> {
    for file in &config.first_party_files {
        if !entries.iter().any(|e| e == file) {
            bail!(
                "Verification failed: first-party file '{}' missing from the archive root",
                file
            );
        }
    }

    let metadata = PatternSet::new(config.metadata_patterns.iter())?;
    if let Some(entry) = entries.iter().find(|e| metadata.is_match(e)) {
        bail!(
            "Verification failed: packaging metadata '{}' survived pruning",
            entry
        );
    }

    for lib in &config.excluded_libraries {
        let prefix = format!("{lib}/");
        if let Some(entry) = entries
            .iter()
            .find(|e| *e == lib || e.starts_with(&prefix))
        {
            bail!(
                "Verification failed: excluded library entry '{}' present in the archive",
                entry
            );
        }
    }

    Ok(())
}
