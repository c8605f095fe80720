//! Stages, events and the report produced by a setup run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::error::Error;

/// Progress of a setup run.
///
/// Runs move forward through the stages in declaration order. A run stopped
/// by `Error::Aborted` ends in `Failed`; see [`SetupReport::from_aborted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStage {
    Pristine,
    Copied,
    Substituted,
    Renamed,
    Rewritten,
    Cleaned,
    Done,
    Failed,
}

impl SetupStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupStage::Pristine => "pristine",
            SetupStage::Copied => "copied",
            SetupStage::Substituted => "substituted",
            SetupStage::Renamed => "renamed",
            SetupStage::Rewritten => "rewritten",
            SetupStage::Cleaned => "cleaned",
            SetupStage::Done => "done",
            SetupStage::Failed => "failed",
        }
    }

    /// The stage that normally follows this one.
    pub fn next(self) -> Option<SetupStage> {
        match self {
            SetupStage::Pristine => Some(SetupStage::Copied),
            SetupStage::Copied => Some(SetupStage::Substituted),
            SetupStage::Substituted => Some(SetupStage::Renamed),
            SetupStage::Renamed => Some(SetupStage::Rewritten),
            SetupStage::Rewritten => Some(SetupStage::Cleaned),
            SetupStage::Cleaned => Some(SetupStage::Done),
            SetupStage::Done | SetupStage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SetupStage::Done | SetupStage::Failed)
    }
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal, per-path failure recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Stage the run was working towards when the failure happened
    pub stage: SetupStage,
    pub path: PathBuf,
    pub message: String,
}

impl FileFailure {
    pub fn new(stage: SetupStage, path: impl Into<PathBuf>, error: &Error) -> Self {
        Self {
            stage,
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// Progress notifications emitted while a run executes. Paths are relative
/// to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupEvent {
    StageStarted(SetupStage),
    FileCopied(PathBuf),
    MarkerRendered { from: PathBuf, to: PathBuf },
    FilesFound(usize),
    FileUpdated(PathBuf),
    DirectoryRenamed { from: PathBuf, to: PathBuf },
    ReferencesUpdated(PathBuf),
    ArtifactRemoved(PathBuf),
    FileGenerated(PathBuf),
    Failure(FileFailure),
}

/// Receives [`SetupEvent`]s as they happen.
pub trait SetupObserver {
    fn on_event(&mut self, event: &SetupEvent);
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl SetupObserver for NoopObserver {
    fn on_event(&mut self, _event: &SetupEvent) {}
}

/// Observer that records every event, mostly useful in tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: Vec<SetupEvent>,
}

impl SetupObserver for RecordingObserver {
    fn on_event(&mut self, event: &SetupEvent) {
        self.events.push(event.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedDirectory {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupReport {
    pub target: PathBuf,
    pub stage: SetupStage,
    pub files_copied: usize,
    pub files_found: usize,
    pub files_changed: Vec<PathBuf>,
    pub directories_renamed: Vec<RenamedDirectory>,
    pub references_updated: Vec<PathBuf>,
    pub artifacts_removed: Vec<PathBuf>,
    pub files_generated: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl SetupReport {
    pub fn new(target: &Path) -> Self {
        Self {
            target: target.to_path_buf(),
            stage: SetupStage::Pristine,
            files_copied: 0,
            files_found: 0,
            files_changed: Vec::new(),
            directories_renamed: Vec::new(),
            references_updated: Vec::new(),
            artifacts_removed: Vec::new(),
            files_generated: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Report for a run that `error` stopped, or `None` if the error is not
    /// an abort. The fatal error is recorded against the stage that was
    /// being entered.
    pub fn from_aborted(target: &Path, error: &Error) -> Option<Self> {
        let Error::Aborted { stage, source } = error else {
            return None;
        };
        let mut report = Self::new(target);
        report.stage = SetupStage::Failed;
        let attempted = stage.next().unwrap_or(*stage);
        report.failures.push(FileFailure::new(attempted, target, source));
        Some(report)
    }
}
