//! Interactive collection of the values for a setup run.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::core::error::{Error, Result};
use crate::core::templates::{
    DEFAULT_TARGET_DIR, ServiceValues, resolve_target_dir, validate_optional_text,
    validate_service_name, validate_text,
};

/// Line-oriented prompts over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    assume_yes: bool,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            assume_yes: false,
        }
    }

    /// Answer every confirmation with yes without reading input.
    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Print `question` and return the trimmed answer. Running out of input
    /// is an error.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question.yellow())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input ended before all values were collected",
            )));
        }
        Ok(line.trim().to_string())
    }

    /// Ask until `validate` accepts the answer, reporting each rejection.
    pub fn ask_valid<F>(&mut self, question: &str, validate: F) -> Result<String>
    where
        F: Fn(&str) -> Result<()>,
    {
        loop {
            let answer = self.ask(question)?;
            match validate(&answer) {
                Ok(()) => return Ok(answer),
                Err(Error::Validation(msg)) => self.reject(&msg)?,
                Err(e) => return Err(e),
            }
        }
    }

    /// Yes/no question defaulting to no. Only `y`, in either case, counts as yes.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        if self.assume_yes {
            writeln!(self.output, "{question}y")?;
            return Ok(true);
        }
        let answer = self.ask(question)?.to_lowercase();
        Ok(answer == "y")
    }

    pub fn warn(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{}", format!("⚠️  {message}").yellow())?;
        Ok(())
    }

    fn reject(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{}", format!("❌ {message}").red())?;
        Ok(())
    }
}

/// Values given on the command line. Anything missing is prompted for.
#[derive(Debug, Clone, Default)]
pub struct PresetValues {
    pub target: Option<String>,
    pub service_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Collect every value for a run, relative targets resolved against
    /// `base`. Returns `None` when the user declines to overwrite a target
    /// given on the command line.
    pub fn collect_values(
        &mut self,
        preset: &PresetValues,
        base: &Path,
    ) -> Result<Option<ServiceValues>> {
        writeln!(self.output, "{}\n", "📝 Service Configuration".bold())?;

        let Some(target_directory) = self.collect_target(preset.target.as_deref(), base)? else {
            return Ok(None);
        };

        let service_name = self.value_or_ask(
            preset.service_name.as_deref(),
            "Service name (snake_case, e.g., 'payment_analytics'): ",
            validate_service_name,
        )?;
        let display_name = self.value_or_ask(
            preset.display_name.as_deref(),
            "Service display name (e.g., 'Payment Analytics'): ",
            |v| validate_text("Display name", v),
        )?;
        let description = self.value_or_ask(
            preset.description.as_deref(),
            "Service description (e.g., 'Advanced payment data analytics'): ",
            |v| validate_text("Description", v),
        )?;
        let domain = self.value_or_ask(
            preset.domain.as_deref(),
            "Business domain (title case, e.g., 'Payment Analytics'): ",
            |v| validate_text("Domain", v),
        )?;
        let author = self.optional_value(
            preset.author.as_deref(),
            "Author",
            "Author name (optional): ",
        )?;
        let email = self.optional_value(
            preset.email.as_deref(),
            "Email",
            "Author email (optional): ",
        )?;

        Ok(Some(ServiceValues {
            target_directory,
            service_name,
            display_name,
            description,
            domain,
            author,
            email,
        }))
    }

    fn collect_target(&mut self, preset: Option<&str>, base: &Path) -> Result<Option<PathBuf>> {
        loop {
            let raw = match preset {
                Some(target) => target.to_string(),
                None => self.ask(&format!(
                    "Target directory (where to create your project) [{DEFAULT_TARGET_DIR}]: "
                ))?,
            };
            let target = resolve_target_dir(&raw, base);
            if !target.exists() {
                return Ok(Some(target));
            }

            self.warn(&format!("Directory '{}' already exists.", target.display()))?;
            if self.confirm("Do you want to continue and overwrite? (y/N): ")? {
                return Ok(Some(target));
            }
            if preset.is_some() {
                return Ok(None);
            }
        }
    }

    /// A value from the command line is validated once and rejected outright;
    /// a prompted value is asked for again.
    fn value_or_ask<F>(
        &mut self,
        preset: Option<&str>,
        question: &str,
        validate: F,
    ) -> Result<String>
    where
        F: Fn(&str) -> Result<()>,
    {
        match preset {
            Some(value) => {
                let value = value.trim();
                validate(value)?;
                Ok(value.to_string())
            }
            None => self.ask_valid(question, validate),
        }
    }

    /// Optional values are skipped entirely in non-interactive runs.
    fn optional_value(
        &mut self,
        preset: Option<&str>,
        label: &str,
        question: &str,
    ) -> Result<Option<String>> {
        let value = match preset {
            Some(value) => {
                let value = value.trim();
                validate_optional_text(label, value)?;
                value.to_string()
            }
            None if self.assume_yes => return Ok(None),
            None => self.ask_valid(question, |v| validate_optional_text(label, v))?,
        };
        Ok((!value.is_empty()).then_some(value))
    }
}
