//! Terminal rendering of setup progress, summaries and validation results.

use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;

use crate::core::templates::{
    ServiceValues, SetupEvent, SetupObserver, SetupReport, SetupStage, ValidationReport,
};

/// Narrates a run as it happens.
pub struct ConsoleObserver<W> {
    out: W,
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, event: &SetupEvent) -> io::Result<()> {
        match event {
            SetupEvent::StageStarted(stage) => {
                let heading = match stage {
                    SetupStage::Copied => "\n🔄 Creating Project...\n",
                    SetupStage::Substituted => "\n🔧 Processing Template Files...\n",
                    SetupStage::Renamed => "\n📁 Renaming directories...",
                    SetupStage::Rewritten => "\n🔗 Updating import statements...",
                    SetupStage::Cleaned => "\n🧹 Cleaning up template artifacts...",
                    _ => return Ok(()),
                };
                writeln!(self.out, "{}", heading.bold())
            }
            SetupEvent::FileCopied(path) => writeln!(self.out, "  📄 Copied: {}", path.display()),
            SetupEvent::MarkerRendered { from, to } => writeln!(
                self.out,
                "  ✏️  Created: {} from {}",
                to.display(),
                from.display()
            ),
            SetupEvent::FilesFound(count) => {
                writeln!(self.out, "📋 Found {count} additional files to process")
            }
            SetupEvent::FileUpdated(path) => writeln!(self.out, "  ✏️  Updated: {}", path.display()),
            SetupEvent::DirectoryRenamed { from, to } => writeln!(
                self.out,
                "  📁 Renaming: {} → {}",
                from.display(),
                to.display()
            ),
            SetupEvent::ReferencesUpdated(path) => {
                writeln!(self.out, "  🔗 Updated imports in: {}", path.display())
            }
            SetupEvent::ArtifactRemoved(path) => {
                writeln!(self.out, "  🗑️  Removed: {}", path.display())
            }
            SetupEvent::FileGenerated(path) => {
                writeln!(self.out, "  🪝 Created: {}", path.display())
            }
            SetupEvent::Failure(failure) => writeln!(
                self.out,
                "{}",
                format!("  ❌ {}: {}", failure.path.display(), failure.message).red()
            ),
        }
    }
}

impl<W: Write> SetupObserver for ConsoleObserver<W> {
    fn on_event(&mut self, event: &SetupEvent) {
        // Narration is best effort; a closed stdout must not stop the run.
        let _ = self.render(event);
    }
}

pub fn render_header(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "\n{}", "🚀 MCP Service Template Setup".blue().bold())?;
    writeln!(out, "{}\n", "=".repeat(50).blue())?;
    writeln!(
        out,
        "This tool will customize the MCP service template for your specific use case."
    )?;
    writeln!(
        out,
        "It will prompt for configuration values and replace all template placeholders.\n"
    )
}

/// Configuration, processing results and next steps for a finished run.
pub fn render_summary(
    out: &mut impl Write,
    values: &ServiceValues,
    report: &SetupReport,
) -> io::Result<()> {
    let status = if report.is_clean() {
        "✅ Setup Complete!".green().bold()
    } else {
        "⚠️  Setup Complete With Errors".yellow().bold()
    };
    writeln!(out, "\n{status}")?;
    writeln!(out, "{}\n", "=".repeat(50).green())?;

    writeln!(out, "{}", "📋 Configuration Summary:".bold())?;
    writeln!(out, "  • Service Name: {}", values.service_name)?;
    writeln!(out, "  • Display Name: {}", values.display_name)?;
    writeln!(out, "  • Description: {}", values.description)?;
    writeln!(out, "  • Domain: {}", values.domain)?;
    writeln!(out, "  • Project Location: {}", report.target.display())?;
    if let Some(author) = &values.author {
        writeln!(out, "  • Author: {author}")?;
    }
    if let Some(email) = &values.email {
        writeln!(out, "  • Email: {email}")?;
    }

    writeln!(out, "\n{}", "📊 Processing Summary:".bold())?;
    writeln!(out, "  • Files copied: {}", report.files_copied)?;
    writeln!(out, "  • Files processed: {}", report.files_changed.len())?;
    for renamed in &report.directories_renamed {
        writeln!(
            out,
            "  • Directory renamed: {} → {}",
            renamed.from.display(),
            renamed.to.display()
        )?;
    }
    writeln!(out, "  • References updated: {}", report.references_updated.len())?;
    writeln!(out, "  • Artifacts removed: {}", report.artifacts_removed.len())?;
    if !report.is_clean() {
        writeln!(
            out,
            "{}",
            format!("  • Failures: {}", report.failures.len()).red()
        )?;
        for failure in &report.failures {
            writeln!(
                out,
                "    - [{}] {}: {}",
                failure.stage,
                failure.path.display(),
                failure.message
            )?;
        }
    }

    render_next_steps(out, &values.service_name, &report.target)?;
    writeln!(
        out,
        "\n{}",
        format!(
            "🎉 Your MCP service '{}' is ready for development!",
            values.display_name
        )
        .green()
    )
}

fn render_next_steps(out: &mut impl Write, service_name: &str, target: &Path) -> io::Result<()> {
    let steps = [
        format!("Navigate to your project: {}", format!("cd {}", target.display()).yellow()),
        format!(
            "Install uv (if not installed): {}",
            "curl -LsSf https://astral.sh/uv/install.sh | sh".yellow()
        ),
        format!("Install dependencies: {}", "uv sync --all-extras".yellow()),
        format!(
            "Setup automated quality checks: {}",
            "uv run pre-commit install".yellow()
        ),
        format!("Run tests: {}", "uv run pytest".yellow()),
        "Update dependencies in pyproject.toml as needed".to_string(),
        format!(
            "Test your MCP server: {}",
            format!("uv run python3 -m {service_name}_mcp.server").yellow()
        ),
    ];

    writeln!(out, "\n{}", "🚀 Next Steps:".bold())?;
    for (index, step) in steps.iter().enumerate() {
        writeln!(out, "  {}. {step}", index + 1)?;
    }

    writeln!(out, "\n{}", "💡 Alternative (traditional pip):".bold())?;
    writeln!(out, "  • Install dependencies: {}", "pip install -e '.[dev]'".yellow())?;
    writeln!(out, "  • Run tests: {}", "pytest".yellow())
}

pub fn render_validation(out: &mut impl Write, report: &ValidationReport) -> io::Result<()> {
    writeln!(out, "{}", "🎯 MCP Service Template Validation".bold())?;
    writeln!(out, "{}", "=".repeat(40))?;
    for check in &report.checks {
        if check.passed {
            writeln!(out, "{} {}", "✅".green(), check.name)?;
        } else {
            writeln!(out, "{} {}", "❌".red(), check.name)?;
            for detail in &check.details {
                writeln!(out, "    {detail}")?;
            }
        }
    }
    writeln!(out, "{}", "=".repeat(40))?;
    if report.passed() {
        writeln!(out, "{}", "🎉 Template validation PASSED!".green().bold())
    } else {
        writeln!(out, "{}", "❌ Template validation FAILED!".red().bold())?;
        writeln!(out, "🔧 Please fix the issues above before distributing the template")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::templates::{CheckResult, FileFailure, RenamedDirectory};
    use std::path::PathBuf;

    fn values() -> ServiceValues {
        ServiceValues {
            target_directory: PathBuf::from("/tmp/billing"),
            service_name: "billing".to_string(),
            display_name: "Billing".to_string(),
            description: "Billing data tools".to_string(),
            domain: "Billing Analytics".to_string(),
            author: Some("Ada".to_string()),
            email: None,
        }
    }

    #[test]
    fn test_observer_narrates_events() {
        let mut observer = ConsoleObserver::new(Vec::new());
        observer.on_event(&SetupEvent::FilesFound(3));
        observer.on_event(&SetupEvent::DirectoryRenamed {
            from: PathBuf::from("src/service_name_mcp"),
            to: PathBuf::from("src/billing_mcp"),
        });
        observer.on_event(&SetupEvent::StageStarted(SetupStage::Done));

        let out = String::from_utf8(observer.into_inner()).unwrap();
        assert!(out.contains("Found 3 additional files to process"));
        assert!(out.contains("src/service_name_mcp → src/billing_mcp"));
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_summary_lists_configuration_and_next_steps() {
        let mut report = SetupReport::new(Path::new("/tmp/billing"));
        report.stage = SetupStage::Done;
        report.files_changed = vec![PathBuf::from("README.md")];
        report.directories_renamed = vec![RenamedDirectory {
            from: PathBuf::from("src/service_name_mcp"),
            to: PathBuf::from("src/billing_mcp"),
        }];

        let mut out = Vec::new();
        render_summary(&mut out, &values(), &report).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Service Name: billing"));
        assert!(out.contains("Author: Ada"));
        assert!(!out.contains("Email:"));
        assert!(out.contains("Files processed: 1"));
        assert!(out.contains("billing_mcp.server"));
        assert!(!out.contains("Failures"));
    }

    #[test]
    fn test_summary_reports_failures() {
        let mut report = SetupReport::new(Path::new("/tmp/billing"));
        report.failures.push(FileFailure {
            stage: SetupStage::Renamed,
            path: PathBuf::from("src/service_name_mcp"),
            message: "target already exists".to_string(),
        });

        let mut out = Vec::new();
        render_summary(&mut out, &values(), &report).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Failures: 1"));
        assert!(out.contains("[renamed] src/service_name_mcp: target already exists"));
    }

    #[test]
    fn test_validation_output() {
        let report = ValidationReport {
            checks: vec![
                CheckResult {
                    name: "marker file present".to_string(),
                    passed: true,
                    details: vec![],
                },
                CheckResult {
                    name: "required paths present".to_string(),
                    passed: false,
                    details: vec!["missing: tests".to_string()],
                },
            ],
        };

        let mut out = Vec::new();
        render_validation(&mut out, &report).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("missing: tests"));
        assert!(out.contains("Template validation FAILED!"));
    }
}
