//! Deepest-first renaming of directories whose name holds an identifier.
//!
//! The plan is computed up front and ordered by path depth, most nested
//! first, so every queued path is still valid when its turn comes: renaming a
//! child never moves its parent, while renaming a parent first would.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::error::Error;

/// Ordered `(old, new)` directory moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    moves: Vec<(PathBuf, PathBuf)>,
}

/// What a plan did when applied. Renames are not rolled back on failure.
#[derive(Debug, Default)]
pub struct RenameOutcome {
    pub applied: Vec<(PathBuf, PathBuf)>,
    pub failures: Vec<(PathBuf, Error)>,
}

impl RenamePlan {
    /// Plan renames for every directory under `base_path` (excluding the root
    /// itself) whose name contains `old`. Only the name changes; the parent
    /// path is kept.
    pub fn build(base_path: &Path, old: &str, new: &str) -> Self {
        if old.is_empty() || old == new {
            return Self::default();
        }

        let mut moves: Vec<(PathBuf, PathBuf)> = WalkDir::new(base_path)
            .min_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry while planning renames: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?;
                if !name.contains(old) {
                    return None;
                }
                let from = entry.path().to_path_buf();
                let to = from.with_file_name(name.replace(old, new));
                Some((from, to))
            })
            .collect();

        moves.sort_by(|(a, _), (b, _)| depth(b).cmp(&depth(a)).then_with(|| a.cmp(b)));

        Self { moves }
    }

    pub fn moves(&self) -> &[(PathBuf, PathBuf)] {
        &self.moves
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Execute the moves in order. A collision or I/O error is recorded for
    /// that move only; the remaining moves still run.
    pub fn apply(&self) -> RenameOutcome {
        let mut outcome = RenameOutcome::default();
        for (from, to) in &self.moves {
            match rename_one(from, to) {
                Ok(()) => {
                    debug!(from = %from.display(), to = %to.display(), "renamed directory");
                    outcome.applied.push((from.clone(), to.clone()));
                }
                Err(e) => {
                    warn!("{e}");
                    outcome.failures.push((from.clone(), e));
                }
            }
        }
        outcome
    }
}

fn rename_one(from: &Path, to: &Path) -> Result<(), Error> {
    if to.exists() {
        return Err(Error::RenameCollision {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
    }
    fs::rename(from, to).map_err(|e| Error::file_io(from, e))
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

/// Rename every directory under `base_path` whose name contains `old`,
/// replacing that substring with `new`.
pub fn rename_directories(base_path: &Path, old: &str, new: &str) -> RenameOutcome {
    RenamePlan::build(base_path, old, new).apply()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rename_nested_matches_deepest_first() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let inner = root.join("service_name_mcp/sub/service_name_mcp_inner");
        fs::create_dir_all(&inner).unwrap();
        fs::write(inner.join("tools.py"), "x = 1").unwrap();
        fs::write(root.join("service_name_mcp/__init__.py"), "").unwrap();

        let outcome = rename_directories(root, "service_name", "billing");

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.applied.len(), 2);
        assert!(root.join("billing_mcp/sub/billing_mcp_inner").is_dir());
        assert!(!root.join("service_name_mcp").exists());
        assert_eq!(
            fs::read_to_string(root.join("billing_mcp/sub/billing_mcp_inner/tools.py")).unwrap(),
            "x = 1"
        );
        assert!(root.join("billing_mcp/__init__.py").is_file());
    }

    #[test]
    fn test_plan_orders_by_depth_descending() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a_old/b/c_old")).unwrap();
        fs::create_dir_all(root.join("z_old")).unwrap();

        let plan = RenamePlan::build(root, "old", "new");
        let depths: Vec<usize> = plan.moves().iter().map(|(from, _)| depth(from)).collect();

        assert_eq!(plan.moves().len(), 3);
        assert!(depths.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(plan.moves()[0].1, root.join("a_old/b/c_new"));
    }

    #[test]
    fn test_rename_only_touches_directory_names() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("pkg/service_name_mcp.txt"), "file").unwrap();

        let outcome = rename_directories(root, "service_name", "billing");

        assert!(outcome.applied.is_empty());
        assert!(root.join("pkg/service_name_mcp.txt").is_file());
    }

    #[test]
    fn test_rename_collision_is_reported_and_others_proceed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src/service_name_mcp")).unwrap();
        fs::create_dir_all(root.join("src/billing_mcp")).unwrap();
        fs::create_dir_all(root.join("tests/service_name_mcp_fixtures")).unwrap();

        let outcome = rename_directories(root, "service_name", "billing");

        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0].1, Error::RenameCollision { .. }));
        assert!(root.join("src/service_name_mcp").is_dir());
        assert!(root.join("tests/billing_mcp_fixtures").is_dir());
    }

    #[test]
    fn test_identical_names_produce_empty_plan() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("service_name_mcp")).unwrap();
        assert!(RenamePlan::build(temp_dir.path(), "service_name", "service_name").is_empty());
        assert!(RenamePlan::build(temp_dir.path(), "", "x").is_empty());
    }
}
