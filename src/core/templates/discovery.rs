//! Discovery of the files that take part in substitution.
//!
//! Include patterns are globs matched against a file's name (so `*.py` finds
//! Python files at any depth). Exclude patterns are plain substrings matched
//! against the path relative to the walk root; a path that contains any of
//! them is skipped even when it also matches an include pattern.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::error::Result;

/// Include globs plus exclude substrings.
#[derive(Debug, Clone)]
pub struct FilePatternSet {
    include: Vec<Pattern>,
    exclude: Vec<String>,
}

impl FilePatternSet {
    /// Compile a pattern set. Fails only on a malformed include glob.
    pub fn new<I, E>(include: &[I], exclude: &[E]) -> Result<Self>
    where
        I: AsRef<str>,
        E: AsRef<str>,
    {
        let include = include
            .iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let exclude = exclude
            .iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Ok(Self { include, exclude })
    }

    /// True when any exclude substring occurs in `relative`.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let text = relative.to_string_lossy();
        self.exclude.iter().any(|p| text.contains(p.as_str()))
    }

    /// True when the file name matches any include glob.
    pub fn is_included(&self, file_name: &str) -> bool {
        self.include.iter().any(|p| p.matches(file_name))
    }

    pub fn matches(&self, relative: &Path) -> bool {
        let Some(name) = relative.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        self.is_included(&name) && !self.is_excluded(relative)
    }
}

/// Find every regular file under `base_path` selected by `patterns`.
///
/// A missing `base_path` yields an empty list. The result is sorted and free
/// of duplicates. Symlinks count when they resolve to a regular file.
pub fn discover_files(base_path: &Path, patterns: &FilePatternSet) -> Vec<PathBuf> {
    if !base_path.is_dir() {
        debug!(base = %base_path.display(), "discovery root missing, nothing to do");
        return Vec::new();
    }

    let mut found = BTreeSet::new();
    for entry in WalkDir::new(base_path).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry during discovery: {e}");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(base_path) else {
            continue;
        };
        if patterns.matches(relative) && entry.path().is_file() {
            found.insert(entry.path().to_path_buf());
        }
    }

    debug!(base = %base_path.display(), count = found.len(), "discovered files");
    found.into_iter().collect()
}
