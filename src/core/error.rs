//! Error handling for the template setup engine.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Per-file failures (encoding,
//! permissions, rename collisions) are ordinary variants so callers can record
//! them and keep going; `Aborted` wraps the filesystem-fatal ones together with
//! the stage the run had reached.
//!
//! # Examples
//!
//! ```
//! use mcp_template_setup::core::error::{Error, Result};
//!
//! fn must_exist(found: bool) -> Result<()> {
//!     if !found {
//!         return Err(Error::precondition("pyproject.toml.template not found"));
//!     }
//!     Ok(())
//! }
//! # assert!(must_exist(true).is_ok());
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::templates::SetupStage;

/// Result type for template setup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for template setup operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error without a more specific path attached
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// I/O error on a specific file or directory
    #[error("I/O error on {}: {source}", .path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File content is not valid UTF-8
    #[error("File is not valid UTF-8: {}", .path.display())]
    Encoding { path: PathBuf },

    /// Directory rename target already exists
    #[error("Cannot rename {} to {}: target already exists", .from.display(), .to.display())]
    RenameCollision { from: PathBuf, to: PathBuf },

    /// A required condition was not met before any mutation
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// User supplied value was rejected
    #[error("Invalid value: {0}")]
    Validation(String),

    /// Template manifest could not be used
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid glob pattern in an include list
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Directory traversal failure
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Filesystem-fatal error that stopped the run
    #[error("Setup aborted during {stage}: {source}")]
    Aborted {
        stage: SetupStage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a new precondition error
    pub fn precondition<S: Into<String>>(msg: S) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new manifest error
    pub fn manifest<S: Into<String>>(msg: S) -> Self {
        Self::Manifest(msg.into())
    }

    /// Attach a path to an I/O error
    pub fn file_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Wrap an error as fatal for the given stage
    pub fn aborted(stage: SetupStage, source: Error) -> Self {
        Self::Aborted {
            stage,
            source: Box::new(source),
        }
    }
}
