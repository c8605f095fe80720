//! Orchestration of a complete setup run.
//!
//! # Pipeline
//!
//! A run walks the stages of [`SetupStage`] in a fixed order:
//! 1. **Copy**: materialize a clean copy of the template into the target
//! 2. **Substitute**: render the marker file, then every discovered file
//! 3. **Rename**: rename package directories, deepest first
//! 4. **Rewrite**: replace package references in source files
//! 5. **Clean**: remove template artifacts and write tooling config
//!
//! Only the copy can abort the run. Every later step works file by file and
//! records what it could not do in the [`SetupReport`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::discovery::discover_files;
use super::files::write_text_atomic;
use super::materialize::CopyManifest;
use super::placeholders::ServiceValues;
use super::rename::RenamePlan;
use super::rewrite::rewrite_references;
use super::substitute::substitute;
use super::types::{
    FileFailure, RenamedDirectory, SetupEvent, SetupObserver, SetupReport, SetupStage,
};
use super::TemplateDir;
use crate::core::error::{Error, Result};

/// Runs the setup pipeline for one template.
#[derive(Debug, Clone)]
pub struct TemplateManager {
    template_dir: TemplateDir,
}

struct Run<'a> {
    root: PathBuf,
    report: SetupReport,
    observer: &'a mut dyn SetupObserver,
}

impl Run<'_> {
    fn emit(&mut self, event: SetupEvent) {
        self.observer.on_event(&event);
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    fn fail(&mut self, stage: SetupStage, path: &Path, error: &Error) {
        let failure = FileFailure::new(stage, self.relative(path), error);
        self.emit(SetupEvent::Failure(failure.clone()));
        self.report.failures.push(failure);
    }

    fn enter(&mut self, stage: SetupStage) {
        debug!(%stage, "entering stage");
        self.emit(SetupEvent::StageStarted(stage));
    }

    fn complete(&mut self, stage: SetupStage) {
        self.report.stage = stage;
    }
}

impl TemplateManager {
    pub fn new(template_dir: TemplateDir) -> Self {
        Self { template_dir }
    }

    pub fn template_dir(&self) -> &TemplateDir {
        &self.template_dir
    }

    /// Instantiate the template into `values.target_directory`.
    ///
    /// Fails before touching the filesystem when the marker is missing or the
    /// manifest patterns are invalid. A failure to create the target returns
    /// `Error::Aborted`; anything later is recorded in the report.
    pub fn run(
        &self,
        values: &ServiceValues,
        observer: &mut dyn SetupObserver,
    ) -> Result<SetupReport> {
        self.template_dir.require_marker()?;
        let manifest = self.template_dir.manifest();
        let substitution_patterns = manifest.substitution_patterns()?;
        let source_patterns = manifest.source_patterns()?;
        let placeholders = values.placeholders();

        let plan = CopyManifest::plan(
            self.template_dir.template_path(),
            &values.target_directory,
            &manifest.exclusion_rules(),
        )?;
        let root = plan.target_root().to_path_buf();
        info!(
            source = %plan.source_root().display(),
            target = %root.display(),
            files = plan.file_count(),
            "creating project"
        );

        let mut run = Run {
            report: SetupReport::new(&root),
            root,
            observer,
        };

        run.enter(SetupStage::Copied);
        let copied = plan
            .apply(|entry| {
                run.observer
                    .on_event(&SetupEvent::FileCopied(entry.relative.clone()))
            })
            .map_err(|e| Error::aborted(SetupStage::Pristine, e))?;
        run.report.files_copied = copied.copied.len();
        for (relative, error) in copied.failures {
            run.fail(SetupStage::Copied, &relative, &error);
        }
        run.complete(SetupStage::Copied);

        run.enter(SetupStage::Substituted);
        let marker = run.root.join(&manifest.marker_file);
        let marker_output = run.root.join(&manifest.marker_output);
        match substitute(&marker, &placeholders) {
            Ok(changed) => {
                if changed {
                    run.report.files_changed.push(manifest.marker_file.clone());
                }
                match fs::copy(&marker, &marker_output) {
                    Ok(_) => {
                        let (from, to) = (run.relative(&marker), run.relative(&marker_output));
                        run.emit(SetupEvent::MarkerRendered { from, to });
                    }
                    Err(e) => {
                        let error = Error::file_io(&marker_output, e);
                        run.fail(SetupStage::Substituted, &marker, &error);
                    }
                }
            }
            Err(e) => run.fail(SetupStage::Substituted, &marker, &e),
        }

        let files: Vec<PathBuf> = discover_files(&run.root, &substitution_patterns)
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .is_none_or(|name| name.to_string_lossy() != manifest.marker_output)
            })
            .filter(|path| *path != marker)
            .collect();
        run.report.files_found = files.len();
        run.emit(SetupEvent::FilesFound(files.len()));

        for path in &files {
            match substitute(path, &placeholders) {
                Ok(true) => {
                    let relative = run.relative(path);
                    run.report.files_changed.push(relative.clone());
                    run.emit(SetupEvent::FileUpdated(relative));
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("Error processing {}: {e}", path.display());
                    run.fail(SetupStage::Substituted, path, &e);
                }
            }
        }
        run.complete(SetupStage::Substituted);

        let old_package = manifest.package_name();
        let new_package = manifest.package_name_for(&values.service_name);

        run.enter(SetupStage::Renamed);
        let renamed = RenamePlan::build(&run.root, &old_package, &new_package).apply();
        for (from, to) in renamed.applied {
            let (from, to) = (run.relative(&from), run.relative(&to));
            run.emit(SetupEvent::DirectoryRenamed {
                from: from.clone(),
                to: to.clone(),
            });
            run.report.directories_renamed.push(RenamedDirectory { from, to });
        }
        for (path, error) in renamed.failures {
            run.fail(SetupStage::Renamed, &path, &error);
        }
        run.complete(SetupStage::Renamed);

        run.enter(SetupStage::Rewritten);
        let rewritten = rewrite_references(&run.root, &source_patterns, &old_package, &new_package);
        for path in rewritten.modified {
            let relative = run.relative(&path);
            run.report.references_updated.push(relative.clone());
            run.emit(SetupEvent::ReferencesUpdated(relative));
        }
        for (path, error) in rewritten.failures {
            run.fail(SetupStage::Rewritten, &path, &error);
        }
        run.complete(SetupStage::Rewritten);

        run.enter(SetupStage::Cleaned);
        for artifact in &manifest.artifacts {
            let path = run.root.join(artifact);
            if !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    run.report.artifacts_removed.push(artifact.clone());
                    run.emit(SetupEvent::ArtifactRemoved(artifact.clone()));
                }
                Err(e) => run.fail(SetupStage::Cleaned, &path, &Error::file_io(&path, e)),
            }
        }
        if let Some(generated) = &manifest.quality_config {
            let path = run.root.join(&generated.path);
            match write_generated(&path, &generated.content) {
                Ok(()) => {
                    run.report.files_generated.push(generated.path.clone());
                    run.emit(SetupEvent::FileGenerated(generated.path.clone()));
                }
                Err(e) => run.fail(SetupStage::Cleaned, &path, &e),
            }
        }
        run.complete(SetupStage::Cleaned);

        run.complete(SetupStage::Done);
        info!(
            changed = run.report.files_changed.len(),
            failures = run.report.failures.len(),
            "setup complete"
        );
        Ok(run.report)
    }
}

fn write_generated(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::file_io(parent, e))?;
    }
    write_text_atomic(path, content)
}
