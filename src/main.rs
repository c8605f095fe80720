//! mcp-template-setup CLI entrypoint
//! Parses command-line arguments and dispatches to the template engine.
#![deny(unsafe_code)]

// Internal imports (std, crate)
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use mcp_template_setup::cli::{
    ConsoleObserver, PresetValues, Prompter, render_header, render_summary, render_validation,
};
use mcp_template_setup::core::templates::{
    NoopObserver, SetupReport, TemplateDir, TemplateManager, TemplateValidator,
};

// External imports (alphabetized)
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mcp-template-setup")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    setup: SetupArgs,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a customized project from the template (default)
    Setup(SetupArgs),
    /// Check that a template is ready to be distributed
    Validate(TemplateArgs),
}

#[derive(Args, Debug, Default, Clone)]
struct TemplateArgs {
    /// Template root (defaults to $MCP_TEMPLATE_DIR, then the current directory)
    #[arg(long)]
    template_dir: Option<PathBuf>,
    /// Template manifest to use instead of the one in the template root
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone)]
struct SetupArgs {
    #[command(flatten)]
    template: TemplateArgs,
    /// Directory to create the project in
    #[arg(long)]
    target: Option<String>,
    /// Service identifier (snake_case)
    #[arg(long)]
    service_name: Option<String>,
    /// Human readable service name
    #[arg(long)]
    display_name: Option<String>,
    /// One line service description
    #[arg(long)]
    description: Option<String>,
    /// Business domain in title case
    #[arg(long)]
    domain: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Answer yes to every confirmation and skip optional prompts
    #[arg(short, long)]
    yes: bool,
    /// Print the setup report as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

impl SetupArgs {
    fn presets(&self) -> PresetValues {
        PresetValues {
            target: self.target.clone(),
            service_name: self.service_name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            domain: self.domain.clone(),
            author: self.author.clone(),
            email: self.email.clone(),
        }
    }
}

fn log_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Logs go to stderr so they never interleave with the narration on stdout.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(log_level(cli.verbose, cli.quiet));
    info!(version = env!("CARGO_PKG_VERSION"), "Starting mcp-template-setup");

    match cli.command {
        Some(Commands::Validate(args)) => run_validate(&args),
        Some(Commands::Setup(args)) => run_setup(&args),
        None => run_setup(&cli.setup),
    }
}

fn run_setup(args: &SetupArgs) -> anyhow::Result<ExitCode> {
    // Keep stdout clean for the JSON report.
    let narration: Box<dyn Write> = if args.json {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };
    let mut prompter = Prompter::new(io::stdin().lock(), narration).assume_yes(args.yes);
    render_header(prompter.output())?;

    let template_dir = TemplateDir::discover(
        args.template.template_dir.as_deref(),
        args.template.config.as_deref(),
    )
    .context("Failed to load template")?;
    template_dir.require_marker()?;

    if template_dir.is_customized()? {
        prompter.warn("This template appears to have already been set up.")?;
        if !prompter.confirm("Do you want to continue anyway? (y/N): ")? {
            writeln!(prompter.output(), "Setup cancelled.")?;
            return Ok(ExitCode::SUCCESS);
        }
    }

    let base = std::env::current_dir().context("Failed to get current directory")?;
    let Some(values) = prompter.collect_values(&args.presets(), &base)? else {
        writeln!(prompter.output(), "Setup cancelled.")?;
        return Ok(ExitCode::SUCCESS);
    };
    debug!(?values, "collected service values");

    let manager = TemplateManager::new(template_dir);
    if args.json {
        let report = match manager.run(&values, &mut NoopObserver) {
            Ok(report) => report,
            Err(e) => {
                if let Some(report) = SetupReport::from_aborted(&values.target_directory, &e) {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                return Err(e.into());
            }
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut observer = ConsoleObserver::new(io::stdout());
    let report = manager.run(&values, &mut observer)?;
    render_summary(&mut io::stdout(), &values, &report)?;
    Ok(ExitCode::SUCCESS)
}

fn run_validate(args: &TemplateArgs) -> anyhow::Result<ExitCode> {
    let template_dir = TemplateDir::discover(args.template_dir.as_deref(), args.config.as_deref())
        .context("Failed to load template")?;
    let report = TemplateValidator::new(&template_dir).run()?;

    render_validation(&mut io::stdout(), &report)?;
    if report.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", "Template validation failed".red());
        Ok(ExitCode::FAILURE)
    }
}
