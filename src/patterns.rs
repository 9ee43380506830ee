//! Glob pattern sets for archive entry selection.
//!
//! Patterns follow zip's conventions: `*` matches any run of characters,
//! including `/`, because zip applies patterns to full stored entry names
//! (`pip*` must match `pip/__init__.py`).

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// A compiled set of zip-style name patterns.
pub struct PatternSet {
    set: GlobSet,
    patterns: Vec<String>,
}

impl PatternSet {
    /// Compile a set from pattern strings.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> =
            patterns.into_iter().map(|p| p.as_ref().to_string()).collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(false)
                .build()
                .with_context(|| format!("Invalid pattern '{pattern}'"))?;
            builder.add(glob);
        }

        Ok(Self {
            set: builder.build()?,
            patterns,
        })
    }

    /// Returns true if the entry name matches any pattern.
    pub fn is_match(&self, name: &str) -> bool {
        self.set.is_match(name)
    }

    /// The source patterns, in insertion order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the set contains no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Pattern matching a library's type-annotation companion package.
///
/// Annotation companions are published as `<library>_type_annotations`; the
/// trailing wildcard also picks up their metadata directories before pruning.
pub fn companion_pattern(library: &str) -> String {
    format!("{library}_type_annotations*")
}
