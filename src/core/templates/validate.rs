//! Readiness checks for a pristine template tree.

use serde::Serialize;
use tracing::debug;

use super::TemplateDir;
use super::discovery::discover_files;
use super::files::read_text;
use super::placeholders::{DISPLAY_NAME_KEY, SERVICE_NAME_KEY, token};
use crate::core::error::{Error, Result};

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    /// Offending paths or a short explanation when the check failed
    pub details: Vec<String>,
}

impl CheckResult {
    fn from_problems(name: &str, details: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: details.is_empty(),
            details,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Runs every check against one template. Checks are independent: a failing
/// check never prevents the others from running.
pub struct TemplateValidator<'a> {
    template_dir: &'a TemplateDir,
}

impl<'a> TemplateValidator<'a> {
    pub fn new(template_dir: &'a TemplateDir) -> Self {
        Self { template_dir }
    }

    pub fn run(&self) -> Result<ValidationReport> {
        let checks = vec![
            self.check_marker_present(),
            self.check_marker_pristine(),
            self.check_required_paths(),
            self.check_placeholders(),
            self.check_encoding()?,
        ];
        for check in &checks {
            debug!(check = %check.name, passed = check.passed, "validation check");
        }
        Ok(ValidationReport { checks })
    }

    fn check_marker_present(&self) -> CheckResult {
        let problems = match self.template_dir.require_marker() {
            Ok(()) => Vec::new(),
            Err(e) => vec![e.to_string()],
        };
        CheckResult::from_problems("marker file present", problems)
    }

    fn check_marker_pristine(&self) -> CheckResult {
        let marker = self.template_dir.manifest().marker_file.display().to_string();
        let problems = match self.template_dir.is_customized() {
            Ok(false) => Vec::new(),
            Ok(true) => vec![format!(
                "{marker} no longer contains {}",
                token(SERVICE_NAME_KEY)
            )],
            Err(e) => vec![e.to_string()],
        };
        CheckResult::from_problems("marker holds service placeholder", problems)
    }

    fn check_required_paths(&self) -> CheckResult {
        let root = self.template_dir.template_path();
        let missing = self
            .template_dir
            .manifest()
            .required_paths
            .iter()
            .filter(|p| !root.join(p).exists())
            .map(|p| format!("missing: {}", p.display()))
            .collect();
        CheckResult::from_problems("required paths present", missing)
    }

    fn check_placeholders(&self) -> CheckResult {
        let root = self.template_dir.template_path();
        let wanted = [token(SERVICE_NAME_KEY), token(DISPLAY_NAME_KEY)];
        let mut problems = Vec::new();
        for relative in &self.template_dir.manifest().placeholder_files {
            match read_text(&root.join(relative)) {
                Ok(text) if wanted.iter().any(|t| text.contains(t.as_str())) => {}
                Ok(_) => problems.push(format!("no placeholder in {}", relative.display())),
                Err(e @ Error::Encoding { .. }) => problems.push(e.to_string()),
                Err(_) => problems.push(format!("cannot read {}", relative.display())),
            }
        }
        CheckResult::from_problems("template placeholders present", problems)
    }

    fn check_encoding(&self) -> Result<CheckResult> {
        let root = self.template_dir.template_path();
        let patterns = self.template_dir.manifest().substitution_patterns()?;
        let problems = discover_files(root, &patterns)
            .into_iter()
            .filter_map(|path| match read_text(&path) {
                Ok(_) => None,
                Err(_) => Some(
                    path.strip_prefix(root)
                        .unwrap_or(&path)
                        .display()
                        .to_string(),
                ),
            })
            .collect();
        Ok(CheckResult::from_problems("text files are UTF-8", problems))
    }
}
