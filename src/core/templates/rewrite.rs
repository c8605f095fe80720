//! Plain-text rewrite of references to the template's package identifier.
//!
//! This is a literal substring replacement across imports, strings and
//! comments alike; it does not parse the source.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::discovery::{FilePatternSet, discover_files};
use super::files::rewrite_text;
use crate::core::error::Error;

/// Files touched by a rewrite pass and the ones that could not be processed.
#[derive(Debug, Default)]
pub struct RewriteOutcome {
    pub modified: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, Error)>,
}

/// Replace every occurrence of `old` with `new` in each file under
/// `base_path` selected by `patterns`. Only files whose content changed are
/// reported as modified.
pub fn rewrite_references(
    base_path: &Path,
    patterns: &FilePatternSet,
    old: &str,
    new: &str,
) -> RewriteOutcome {
    let mut outcome = RewriteOutcome::default();
    if old.is_empty() || old == new {
        return outcome;
    }

    for path in discover_files(base_path, patterns) {
        match rewrite_text(&path, |text| text.replace(old, new)) {
            Ok(true) => {
                debug!(path = %path.display(), "updated references");
                outcome.modified.push(path);
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Error updating references in {}: {e}", path.display());
                outcome.failures.push((path, e));
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_rewrite_replaces_in_every_textual_context() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let source = "from service_name_mcp.core import x\n# service_name_mcp docs\nNAME = \"service_name_mcp\"\n";
        fs::write(root.join("server.py"), source).unwrap();
        fs::write(root.join("untouched.py"), "import os\n").unwrap();

        let patterns = FilePatternSet::new(&["*.py"], &[] as &[&str]).unwrap();
        let outcome = rewrite_references(root, &patterns, "service_name_mcp", "billing_mcp");

        assert_eq!(outcome.modified, vec![root.join("server.py")]);
        assert!(outcome.failures.is_empty());
        assert_eq!(
            fs::read_to_string(root.join("server.py")).unwrap(),
            "from billing_mcp.core import x\n# billing_mcp docs\nNAME = \"billing_mcp\"\n"
        );
    }

    #[test]
    fn test_rewrite_respects_source_filter() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("README.md"), "service_name_mcp").unwrap();

        let patterns = FilePatternSet::new(&["*.py"], &[] as &[&str]).unwrap();
        let outcome = rewrite_references(root, &patterns, "service_name_mcp", "billing_mcp");

        assert!(outcome.modified.is_empty());
        assert_eq!(fs::read_to_string(root.join("README.md")).unwrap(), "service_name_mcp");
    }

    #[test]
    fn test_rewrite_collects_undecodable_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("broken.py"), [0xff, 0xff]).unwrap();
        fs::write(root.join("ok.py"), "import service_name_mcp").unwrap();

        let patterns = FilePatternSet::new(&["*.py"], &[] as &[&str]).unwrap();
        let outcome = rewrite_references(root, &patterns, "service_name_mcp", "billing_mcp");

        assert_eq!(outcome.modified, vec![root.join("ok.py")]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, root.join("broken.py"));
    }
}
