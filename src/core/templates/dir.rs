//! Resolution of the template root and the project target directory.

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, error, info};

use super::files::read_text;
use super::manifest::TemplateManifest;
use super::placeholders::{SERVICE_NAME_KEY, token};
use crate::core::error::{Error, Result};

/// Environment variable naming the template root.
pub const TEMPLATE_DIR_ENV: &str = "MCP_TEMPLATE_DIR";

/// Target used when the user accepts the default.
pub const DEFAULT_TARGET_DIR: &str = "../my-mcp-service";

/// Trait for reading template configuration, allowing dependency injection for testing
pub trait TemplateConfigReader {
    fn get_template_dir(&self) -> Option<String>;
}

/// Production implementation that reads from environment variables
pub struct EnvTemplateConfigReader;

impl TemplateConfigReader for EnvTemplateConfigReader {
    fn get_template_dir(&self) -> Option<String> {
        std::env::var(TEMPLATE_DIR_ENV).ok()
    }
}

/// Mock implementation for testing with controlled values
#[cfg(test)]
pub struct MockTemplateConfigReader(Option<String>);

#[cfg(test)]
impl MockTemplateConfigReader {
    pub fn new(template_dir: Option<String>) -> Self {
        Self(template_dir)
    }
}

#[cfg(test)]
impl TemplateConfigReader for MockTemplateConfigReader {
    fn get_template_dir(&self) -> Option<String> {
        self.0.clone()
    }
}

/// A template root together with its manifest.
#[derive(Debug, Clone)]
pub struct TemplateDir {
    template_path: PathBuf,
    manifest: TemplateManifest,
}

impl TemplateDir {
    /// Locate the template from `--template-dir`, `MCP_TEMPLATE_DIR`, or the
    /// current directory, in that order, and load its manifest.
    pub fn discover(custom_dir: Option<&Path>, manifest_path: Option<&Path>) -> Result<Self> {
        Self::discover_with_config(custom_dir, manifest_path, &EnvTemplateConfigReader)
    }

    pub fn discover_with_config(
        custom_dir: Option<&Path>,
        manifest_path: Option<&Path>,
        config_reader: &dyn TemplateConfigReader,
    ) -> Result<Self> {
        let template_path = Self::resolve_template_path(custom_dir, config_reader)?;
        debug!("Resolved template path: {}", template_path.display());

        if !template_path.is_dir() {
            error!(
                "Template directory not found at resolved path: {}",
                template_path.display()
            );
            return Err(Error::precondition(format!(
                "Template directory not found: {}",
                template_path.display()
            )));
        }

        let manifest = match manifest_path {
            Some(path) => TemplateManifest::load_from_file(path)?,
            None => TemplateManifest::load_from_dir(&template_path)?,
        };

        info!("Using template at {}", template_path.display());
        Ok(Self {
            template_path,
            manifest,
        })
    }

    /// Build from already-known parts.
    pub fn new(template_path: PathBuf, manifest: TemplateManifest) -> Self {
        Self {
            template_path,
            manifest,
        }
    }

    fn resolve_template_path(
        custom_dir: Option<&Path>,
        config_reader: &dyn TemplateConfigReader,
    ) -> Result<PathBuf> {
        let chosen = if let Some(dir) = custom_dir {
            debug!("Using custom template directory: {}", dir.display());
            dir.to_path_buf()
        } else if let Some(dir) = config_reader.get_template_dir() {
            debug!("Using {TEMPLATE_DIR_ENV}: {dir}");
            PathBuf::from(dir)
        } else {
            std::env::current_dir()
                .map_err(|e| io::Error::other(format!("Failed to get current directory: {e}")))?
        };
        absolute(&chosen)
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn manifest(&self) -> &TemplateManifest {
        &self.manifest
    }

    pub fn marker_path(&self) -> PathBuf {
        self.template_path.join(&self.manifest.marker_file)
    }

    /// Fail unless the marker file is present at the template root.
    pub fn require_marker(&self) -> Result<()> {
        if self.marker_path().is_file() {
            return Ok(());
        }
        Err(Error::precondition(format!(
            "{} not found. Make sure you're running this from the template root.",
            self.manifest.marker_file.display()
        )))
    }

    /// True when the marker no longer carries the service name token, i.e.
    /// the tree has already been instantiated.
    pub fn is_customized(&self) -> Result<bool> {
        let content = read_text(&self.marker_path())?;
        Ok(!content.contains(&token(SERVICE_NAME_KEY)))
    }
}

/// Resolve a user-entered target against `base`, producing an absolute,
/// lexically normalised path. Empty input selects [`DEFAULT_TARGET_DIR`].
pub fn resolve_target_dir(input: &str, base: &Path) -> PathBuf {
    let input = input.trim();
    let raw = if input.is_empty() {
        DEFAULT_TARGET_DIR
    } else {
        input
    };
    normalize(&base.join(raw))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let current = std::env::current_dir()
        .map_err(|e| io::Error::other(format!("Failed to get current directory: {e}")))?;
    Ok(normalize(&current.join(path)))
}

/// Remove `.` and fold `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            other => result.push(other),
        }
    }
    result
}
