//! Configuration for the packager.
//!
//! All knobs have hard defaults matching the notify lambda layout; each can
//! be overridden through environment variables (a `.env` file in the project
//! directory is loaded by main before this runs).

use std::collections::BTreeSet;

/// Default output archive name.
pub const DEFAULT_ARCHIVE_NAME: &str = "lambda.zip";

/// Suffix appended to the archive name when the final step fails and the
/// artifact must not be mistaken for a finished deployment.
pub const INCOMPLETE_SUFFIX: &str = ".incomplete";

/// Libraries excluded from the bulk add; the Lambda runtime already ships
/// them, only their type-annotation companions are packaged.
const DEFAULT_EXCLUDED_LIBRARIES: &[&str] = &["boto3", "botocore"];

/// Packaging-tool entries pruned from the archive after the bulk add.
const DEFAULT_METADATA_PATTERNS: &[&str] = &[
    "pip*",
    "setuptools*",
    "wheel*",
    "pkg_resources*",
    "easy_install*",
    "*.dist-info*",
];

/// First-party files added at the archive root, always last.
const DEFAULT_FIRST_PARTY_FILES: &[&str] = &["router.py", "config.ini"];

/// Packager configuration.
#[derive(Debug, Clone)]
pub struct PackConfig {
    /// Output archive filename, created in the project directory.
    pub archive_name: String,
    /// Libraries whose full trees are excluded from the bulk add.
    pub excluded_libraries: BTreeSet<String>,
    /// Patterns for packaging metadata pruned from the archive.
    pub metadata_patterns: BTreeSet<String>,
    /// First-party files added at the archive root.
    pub first_party_files: BTreeSet<String>,
    /// Interpreter version ("3.12") for the site-packages subpath.
    /// When unset the virtualenv's lib/ directory is scanned instead.
    pub python_version: Option<String>,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            excluded_libraries: DEFAULT_EXCLUDED_LIBRARIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            metadata_patterns: DEFAULT_METADATA_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            first_party_files: DEFAULT_FIRST_PARTY_FILES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            python_version: None,
        }
    }
}

impl PackConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `PACK_ARCHIVE_NAME`
    /// - `PACK_EXCLUDED_LIBRARIES` (comma-separated)
    /// - `PACK_METADATA_PATTERNS` (comma-separated)
    /// - `PACK_FIRST_PARTY_FILES` (comma-separated)
    /// - `PACK_PYTHON_VERSION`
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(name) = env_nonempty("PACK_ARCHIVE_NAME") {
            config.archive_name = name;
        }
        if let Some(libs) = env_list("PACK_EXCLUDED_LIBRARIES") {
            config.excluded_libraries = libs;
        }
        if let Some(patterns) = env_list("PACK_METADATA_PATTERNS") {
            config.metadata_patterns = patterns;
        }
        if let Some(files) = env_list("PACK_FIRST_PARTY_FILES") {
            config.first_party_files = files;
        }
        config.python_version = env_nonempty("PACK_PYTHON_VERSION");

        config
    }

    /// Zip exclusion patterns covering the excluded libraries' full trees.
    pub fn exclusion_patterns(&self) -> Vec<String> {
        self.excluded_libraries
            .iter()
            .map(|lib| format!("{lib}*"))
            .collect()
    }

    /// The archive's on-disk marker name for an unusable artifact.
    pub fn incomplete_name(&self) -> String {
        format!("{}{}", self.archive_name, INCOMPLETE_SUFFIX)
    }

    /// Print configuration for `show config`.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  PACK_ARCHIVE_NAME: {}", self.archive_name);
        println!(
            "  PACK_EXCLUDED_LIBRARIES: {}",
            join(&self.excluded_libraries)
        );
        println!(
            "  PACK_METADATA_PATTERNS: {}",
            join(&self.metadata_patterns)
        );
        println!(
            "  PACK_FIRST_PARTY_FILES: {}",
            join(&self.first_party_files)
        );
        println!(
            "  PACK_PYTHON_VERSION: {}",
            self.python_version.as_deref().unwrap_or("(auto-detect)")
        );
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(", ")
}

fn env_nonempty(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn env_list(key: &str) -> Option<BTreeSet<String>> {
    let value = env_nonempty(key)?;
    let set: BTreeSet<String> = value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}
