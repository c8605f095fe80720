//! Manifest describing how a template tree is instantiated.
//!
//! A template may ship a `scaffold.yml` (or `scaffold.yaml` / `scaffold.toml`)
//! at its root. Every field is optional; the defaults describe the stock
//! Python MCP service template.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::discovery::FilePatternSet;
use super::materialize::ExclusionRules;
use crate::core::error::{Error, Result};

/// Manifest file names looked up in the template root, in order.
pub const MANIFEST_FILE_NAMES: &[&str] = &["scaffold.yml", "scaffold.yaml", "scaffold.toml"];

const PRE_COMMIT_CONFIG: &str = r#"repos:
  - repo: https://github.com/astral-sh/ruff-pre-commit
    rev: v0.1.0
    hooks:
      - id: ruff
        args: [--fix]
      - id: ruff-format
  - repo: https://github.com/pre-commit/mypy-pre-commit
    rev: v1.0.0
    hooks:
      - id: mypy
        additional_dependencies: [types-all]
  - repo: https://github.com/pre-commit/pre-commit-hooks
    rev: v4.4.0
    hooks:
      - id: trailing-whitespace
      - id: end-of-file-fixer
      - id: check-yaml
      - id: check-added-large-files
"#;

/// A file written verbatim into the generated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Destination relative to the project root
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateManifest {
    /// File whose presence marks the template root and whose `{{service_name}}`
    /// token marks it as not yet instantiated
    pub marker_file: PathBuf,

    /// Name the substituted marker is copied to in the project
    pub marker_output: String,

    /// Identifier used in package directory names and imports
    pub package_token: String,

    /// Suffix that follows the identifier in the package name
    pub package_suffix: String,

    /// Globs for files eligible for placeholder substitution
    pub include: Vec<String>,

    /// Path substrings never substituted
    pub exclude: Vec<String>,

    /// Globs for source files whose package references are rewritten
    pub source_files: Vec<String>,

    /// Path substrings excluded from the reference rewrite, none by default
    pub source_exclude: Vec<String>,

    /// Exact file names left out of the project copy
    pub maintainer_files: Vec<String>,

    /// Path substrings left out of the project copy
    pub copy_exclude: Vec<String>,

    /// Root-relative files removed from the project after substitution
    pub artifacts: Vec<PathBuf>,

    /// Tooling configuration written into the project root
    pub quality_config: Option<GeneratedFile>,

    /// Paths that must exist in a pristine template
    pub required_paths: Vec<PathBuf>,

    /// Files that must carry the service placeholders in a pristine template
    pub placeholder_files: Vec<PathBuf>,
}

impl Default for TemplateManifest {
    fn default() -> Self {
        let strings =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        let paths = |items: &[&str]| -> Vec<PathBuf> { items.iter().map(PathBuf::from).collect() };

        Self {
            marker_file: PathBuf::from("pyproject.toml.template"),
            marker_output: String::from("pyproject.toml"),
            package_token: String::from("service_name"),
            package_suffix: String::from("_mcp"),
            include: strings(&[
                "*.py", "*.md", "*.toml", "*.template", "*.txt", "*.yml", "*.yaml", "*.json",
            ]),
            exclude: strings(&[
                "__pycache__",
                ".git",
                ".pytest_cache",
                ".pyc",
                "build",
                "dist",
                ".egg-info",
            ]),
            source_files: strings(&["*.py"]),
            source_exclude: Vec::new(),
            maintainer_files: strings(&["pyproject.toml", ".pre-commit-config.yaml"]),
            copy_exclude: strings(&[
                ".git",
                ".venv",
                "__pycache__",
                ".pytest_cache",
                ".mypy_cache",
                ".ruff_cache",
                ".pyc",
                ".DS_Store",
                "Thumbs.db",
                ".egg-info",
                ".vscode",
                ".idea",
                "uv.lock",
            ]),
            artifacts: paths(&[
                "setup_template.py",
                "test_uv_compatibility.py",
                "validate_template.py",
                "pyproject.toml.template",
            ]),
            quality_config: Some(GeneratedFile {
                path: PathBuf::from(".pre-commit-config.yaml"),
                content: PRE_COMMIT_CONFIG.to_string(),
            }),
            required_paths: paths(&[
                "README.md",
                "src/service_name_mcp",
                "src/service_name_mcp/__init__.py",
                "src/service_name_mcp/server.py",
                "src/service_name_mcp/mcp_instance.py",
                "tests",
            ]),
            placeholder_files: paths(&[
                "src/service_name_mcp/__init__.py",
                "src/service_name_mcp/mcp_instance.py",
                "README.md",
            ]),
        }
    }
}

impl TemplateManifest {
    /// Load the manifest from the template root, falling back to defaults
    /// when no manifest file is present.
    pub fn load_from_dir(template_dir: &Path) -> Result<Self> {
        for name in MANIFEST_FILE_NAMES {
            let path = template_dir.join(name);
            if path.is_file() {
                return Self::load_from_file(&path);
            }
        }
        debug!(dir = %template_dir.display(), "no template manifest found, using defaults");
        Ok(Self::default())
    }

    /// Load a manifest file; `.toml` files are parsed as TOML, anything else as YAML.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!(manifest_path = %path.display(), "reading template manifest");
        let content = fs::read_to_string(path).map_err(|e| {
            Error::manifest(format!(
                "Failed to read template manifest at {}: {e}",
                path.display()
            ))
        })?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let manifest: Self = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        manifest.check()?;
        Ok(manifest)
    }

    fn check(&self) -> Result<()> {
        if self.marker_file.as_os_str().is_empty() {
            return Err(Error::manifest("marker_file must not be empty"));
        }
        if self.package_token.is_empty() {
            return Err(Error::manifest("package_token must not be empty"));
        }
        if self.include.is_empty() {
            return Err(Error::manifest("include must list at least one pattern"));
        }
        Ok(())
    }

    /// Package directory name before instantiation, e.g. `service_name_mcp`.
    pub fn package_name(&self) -> String {
        format!("{}{}", self.package_token, self.package_suffix)
    }

    /// Package directory name for a chosen service identifier.
    pub fn package_name_for(&self, service_name: &str) -> String {
        format!("{service_name}{}", self.package_suffix)
    }

    pub fn substitution_patterns(&self) -> Result<FilePatternSet> {
        FilePatternSet::new(&self.include, &self.exclude)
    }

    pub fn source_patterns(&self) -> Result<FilePatternSet> {
        FilePatternSet::new(&self.source_files, &self.source_exclude)
    }

    /// Copy exclusions; manifest files themselves never reach the project.
    pub fn exclusion_rules(&self) -> ExclusionRules {
        let mut names = self.maintainer_files.clone();
        names.extend(MANIFEST_FILE_NAMES.iter().map(|n| n.to_string()));
        ExclusionRules::new(&names, &self.copy_exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_template_manifest_default() {
        let manifest = TemplateManifest::default();
        assert_eq!(manifest.marker_file, PathBuf::from("pyproject.toml.template"));
        assert_eq!(manifest.marker_output, "pyproject.toml");
        assert_eq!(manifest.package_name(), "service_name_mcp");
        assert_eq!(manifest.package_name_for("billing"), "billing_mcp");
        assert_eq!(manifest.include.len(), 8);
        assert_eq!(manifest.artifacts.len(), 4);
        let quality = manifest.quality_config.unwrap();
        assert_eq!(quality.path, PathBuf::from(".pre-commit-config.yaml"));
        assert!(quality.content.contains("ruff-pre-commit"));
    }

    #[test]
    fn test_load_manifest_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let manifest = TemplateManifest::load_from_dir(temp_dir.path()).unwrap();
        assert_eq!(manifest, TemplateManifest::default());
    }

    #[test]
    fn test_load_manifest_from_partial_yaml() {
        let temp_dir = tempdir().unwrap();
        let yaml = r#"
marker_file: "Cargo.toml.template"
marker_output: "Cargo.toml"
include:
  - "*.rs"
  - "*.toml"
quality_config: null
"#;
        fs::write(temp_dir.path().join("scaffold.yml"), yaml).unwrap();

        let manifest = TemplateManifest::load_from_dir(temp_dir.path()).unwrap();

        assert_eq!(manifest.marker_file, PathBuf::from("Cargo.toml.template"));
        assert_eq!(manifest.marker_output, "Cargo.toml");
        assert_eq!(manifest.include, vec!["*.rs", "*.toml"]);
        assert!(manifest.quality_config.is_none());
        assert_eq!(manifest.package_token, "service_name");
    }

    #[test]
    fn test_load_manifest_from_toml() {
        let temp_dir = tempdir().unwrap();
        let toml = r#"
package_suffix = "_server"
artifacts = ["bootstrap.py"]

[quality_config]
path = ".editorconfig"
content = "root = true\n"
"#;
        fs::write(temp_dir.path().join("scaffold.toml"), toml).unwrap();

        let manifest = TemplateManifest::load_from_dir(temp_dir.path()).unwrap();

        assert_eq!(manifest.package_name(), "service_name_server");
        assert_eq!(manifest.artifacts, vec![PathBuf::from("bootstrap.py")]);
        assert_eq!(
            manifest.quality_config.unwrap().path,
            PathBuf::from(".editorconfig")
        );
    }

    #[test]
    fn test_load_manifest_prefers_yaml_over_toml() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("scaffold.yml"), "package_suffix: _yaml\n").unwrap();
        fs::write(temp_dir.path().join("scaffold.toml"), "package_suffix = \"_toml\"\n").unwrap();

        let manifest = TemplateManifest::load_from_dir(temp_dir.path()).unwrap();
        assert_eq!(manifest.package_suffix, "_yaml");
    }

    #[test]
    fn test_load_manifest_invalid_yaml() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("scaffold.yml"), "include: [\n").unwrap();

        let err = TemplateManifest::load_from_dir(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_load_manifest_rejects_empty_include() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("scaffold.yml"), "include: []\n").unwrap();

        let err = TemplateManifest::load_from_dir(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("include"));
    }

    #[test]
    fn test_source_patterns_ignore_discovery_excludes() {
        let manifest = TemplateManifest::default();
        let sources = manifest.source_patterns().unwrap();
        let substitution = manifest.substitution_patterns().unwrap();

        let path = Path::new("tests/test_distribution.py");
        assert!(sources.matches(path));
        assert!(!substitution.matches(path));
        assert!(sources.matches(Path::new("tools/build_report.py")));
    }

    #[test]
    fn test_exclusion_rules_cover_manifest_files() {
        let rules = TemplateManifest::default().exclusion_rules();
        assert!(rules.should_exclude(Path::new("scaffold.yml")));
        assert!(rules.should_exclude(Path::new("pyproject.toml")));
        assert!(!rules.should_exclude(Path::new("README.md")));
    }
}
