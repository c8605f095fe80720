//! Clean copy of a template tree into a disposable target directory.
//!
//! The whole copy is planned into a [`CopyManifest`] before anything is
//! written. Everything after materialization happens inside the target, so
//! the source template is never modified and a failed run can be retried by
//! deleting the target.

use std::fs::{self, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::error::{Error, Result};

/// Predicate deciding which template entries stay behind.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    exact_names: Vec<String>,
    substrings: Vec<String>,
}

impl ExclusionRules {
    pub fn new<N, S>(exact_names: &[N], substrings: &[S]) -> Self
    where
        N: AsRef<str>,
        S: AsRef<str>,
    {
        Self {
            exact_names: exact_names.iter().map(|n| n.as_ref().to_string()).collect(),
            substrings: substrings
                .iter()
                .map(|s| s.as_ref().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Excluded when the name is a maintainer-only file, or when any pattern
    /// occurs in the relative path or the name.
    pub fn should_exclude(&self, relative: &Path) -> bool {
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.exact_names.iter().any(|n| *n == name) {
            return true;
        }
        self.excluded_by_pattern(relative, &name)
    }

    fn excluded_by_pattern(&self, relative: &Path, name: &str) -> bool {
        let path = relative.to_string_lossy();
        self.substrings
            .iter()
            .any(|p| path.contains(p.as_str()) || name.contains(p.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyKind {
    Directory,
    File,
}

/// One planned copy operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyEntry {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub relative: PathBuf,
    pub kind: CopyKind,
}

/// Result of applying a manifest.
#[derive(Debug, Default)]
pub struct CopyOutcome {
    /// Relative paths of copied files
    pub copied: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, Error)>,
}

/// The full set of `(source, dest)` pairs for one clean copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyManifest {
    source_root: PathBuf,
    target_root: PathBuf,
    entries: Vec<CopyEntry>,
}

impl CopyManifest {
    /// Plan the copy of `source` into `target`, skipping excluded entries.
    ///
    /// Excluded directories are not descended into. If `target` lies inside
    /// `source`, it is skipped as well.
    pub fn plan(source: &Path, target: &Path, rules: &ExclusionRules) -> Result<Self> {
        let source_root = source.canonicalize().map_err(|e| {
            Error::precondition(format!(
                "Template directory {} is not accessible: {e}",
                source.display()
            ))
        })?;
        if !source_root.is_dir() {
            return Err(Error::precondition(format!(
                "Template path {} is not a directory",
                source.display()
            )));
        }
        let target_root = absolute_target(target)?;

        let walker = WalkDir::new(&source_root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.path() == target_root {
                    return false;
                }
                if !entry.file_type().is_dir() {
                    return true;
                }
                let Ok(relative) = entry.path().strip_prefix(&source_root) else {
                    return true;
                };
                let name = entry.file_name().to_string_lossy();
                !rules.excluded_by_pattern(relative, &name)
            });

        let mut entries = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable template entry: {e}");
                    continue;
                }
            };
            let Ok(relative) = entry.path().strip_prefix(&source_root) else {
                continue;
            };
            if rules.should_exclude(relative) {
                debug!(path = %relative.display(), "excluded from copy");
                continue;
            }
            let kind = if entry.file_type().is_dir() {
                CopyKind::Directory
            } else {
                CopyKind::File
            };
            entries.push(CopyEntry {
                source: entry.path().to_path_buf(),
                dest: target_root.join(relative),
                relative: relative.to_path_buf(),
                kind,
            });
        }

        Ok(Self {
            source_root,
            target_root,
            entries,
        })
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    pub fn entries(&self) -> &[CopyEntry] {
        &self.entries
    }

    pub fn file_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == CopyKind::File)
            .count()
    }

    /// Execute the plan. Creating the target root is the only fatal step;
    /// individual entries that fail are recorded and skipped. Existing files
    /// in the target are overwritten, so the call can be repeated.
    pub fn apply<F>(&self, mut on_copied: F) -> Result<CopyOutcome>
    where
        F: FnMut(&CopyEntry),
    {
        fs::create_dir_all(&self.target_root)
            .map_err(|e| Error::file_io(&self.target_root, e))?;

        let mut outcome = CopyOutcome::default();
        for entry in &self.entries {
            let result = match entry.kind {
                CopyKind::Directory => fs::create_dir_all(&entry.dest),
                CopyKind::File => copy_file(&entry.source, &entry.dest),
            };
            match result {
                Ok(()) => {
                    if entry.kind == CopyKind::File {
                        outcome.copied.push(entry.relative.clone());
                        on_copied(entry);
                    }
                }
                Err(e) => {
                    warn!("Failed to copy {}: {e}", entry.relative.display());
                    outcome
                        .failures
                        .push((entry.relative.clone(), Error::file_io(&entry.source, e)));
                }
            }
        }
        Ok(outcome)
    }
}

/// Plan and apply a clean copy of `source` into `target`.
pub fn materialize(
    source: &Path,
    target: &Path,
    rules: &ExclusionRules,
) -> Result<(CopyManifest, CopyOutcome)> {
    let manifest = CopyManifest::plan(source, target, rules)?;
    let outcome = manifest.apply(|_| {})?;
    Ok((manifest, outcome))
}

fn absolute_target(target: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = target.canonicalize() {
        return Ok(canonical);
    }
    std::path::absolute(target).map_err(|e| Error::file_io(target, e))
}

/// Copy content and permissions, then carry over timestamps where allowed.
fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    if let Err(e) = copy_times(from, to) {
        warn!(path = %to.display(), "could not preserve timestamps: {e}");
    }
    Ok(())
}

fn copy_times(from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::metadata(from)?;
    let times = FileTimes::new()
        .set_accessed(metadata.accessed()?)
        .set_modified(metadata.modified()?);
    // Read-only copies cannot be opened for writing, but the owner may still
    // set times through a read handle.
    let file = match fs::File::options().write(true).open(to) {
        Ok(file) => file,
        Err(_) => fs::File::open(to)?,
    };
    file.set_times(times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                (
                    e.path().strip_prefix(root).unwrap().to_path_buf(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect()
    }

    fn rules() -> ExclusionRules {
        ExclusionRules::new(
            &["pyproject.toml", ".pre-commit-config.yaml"],
            &[".git", "__pycache__", ".venv", "uv.lock", ".DS_Store"],
        )
    }

    fn template(root: &Path) {
        write(root, "README.md", "# {{Service Name}}");
        write(root, "pyproject.toml", "contributor config");
        write(root, "pyproject.toml.template", "name = \"{{service_name}}\"");
        write(root, ".git/HEAD", "ref: refs/heads/main");
        write(root, "src/service_name_mcp/__init__.py", "");
        write(root, "src/service_name_mcp/__pycache__/server.cpython-312.pyc", "bytes");
        write(root, ".venv/bin/python", "");
        write(root, "uv.lock", "lock");
        write(root, "docs/.DS_Store", "");
    }

    #[test]
    fn test_should_exclude_exact_and_substring() {
        let rules = rules();
        assert!(rules.should_exclude(Path::new("pyproject.toml")));
        assert!(!rules.should_exclude(Path::new("pyproject.toml.template")));
        assert!(rules.should_exclude(Path::new(".git/objects/ab")));
        assert!(rules.should_exclude(Path::new("pkg/__pycache__")));
        assert!(!rules.should_exclude(Path::new("src/service_name_mcp/server.py")));
    }

    #[test]
    fn test_materialize_copies_only_template_content() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        template(source.path());
        let dest = target.path().join("project");

        let (manifest, outcome) = materialize(source.path(), &dest, &rules()).unwrap();

        assert!(outcome.failures.is_empty());
        assert_eq!(manifest.file_count(), outcome.copied.len());
        let copied: Vec<PathBuf> = snapshot(&dest).into_keys().collect();
        assert_eq!(
            copied,
            vec![
                PathBuf::from("README.md"),
                PathBuf::from("pyproject.toml.template"),
                PathBuf::from("src/service_name_mcp/__init__.py"),
            ]
        );
        assert!(dest.join("docs").is_dir());
    }

    #[test]
    fn test_materialize_never_touches_source() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        template(source.path());
        let before = snapshot(source.path());

        materialize(source.path(), &target.path().join("out"), &rules()).unwrap();

        assert_eq!(snapshot(source.path()), before);
    }

    #[test]
    fn test_materialize_into_existing_target_overwrites() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        template(source.path());
        write(target.path(), "README.md", "stale");
        write(target.path(), "extra.txt", "left alone");

        materialize(source.path(), target.path(), &rules()).unwrap();
        materialize(source.path(), target.path(), &rules()).unwrap();

        assert_eq!(
            fs::read_to_string(target.path().join("README.md")).unwrap(),
            "# {{Service Name}}"
        );
        assert!(target.path().join("extra.txt").exists());
    }

    #[test]
    fn test_plan_skips_target_nested_in_source() {
        let source = TempDir::new().unwrap();
        write(source.path(), "README.md", "readme");
        let nested = source.path().join("out");
        fs::create_dir_all(&nested).unwrap();
        write(&nested, "old.txt", "previous run");

        let manifest = CopyManifest::plan(source.path(), &nested, &rules()).unwrap();

        assert!(manifest.entries().iter().all(|e| !e.relative.starts_with("out")));
        assert_eq!(manifest.file_count(), 1);
    }

    #[test]
    fn test_plan_missing_source_is_precondition_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = CopyManifest::plan(
            &temp_dir.path().join("missing"),
            &temp_dir.path().join("out"),
            &rules(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_copy_preserves_modification_time() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        write(source.path(), "notes.txt", "n");
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        fs::File::options()
            .write(true)
            .open(source.path().join("notes.txt"))
            .unwrap()
            .set_modified(old)
            .unwrap();

        materialize(source.path(), target.path(), &rules()).unwrap();

        let copied = fs::metadata(target.path().join("notes.txt"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(copied, old);
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_preserves_modification_time_of_read_only_file() {
        use std::os::unix::fs::PermissionsExt;

        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        write(source.path(), "LICENSE.txt", "all rights reserved");
        let path = source.path().join("LICENSE.txt");
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(2_000_000);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(old)
            .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();

        materialize(source.path(), target.path(), &rules()).unwrap();

        let copied = fs::metadata(target.path().join("LICENSE.txt")).unwrap();
        assert!(copied.permissions().readonly());
        assert_eq!(copied.modified().unwrap(), old);
    }
}
