//! Command-line interface module for sortdir.
//!
//! This module handles:
//! - Argument parsing
//! - Merging flags over settings-file defaults
//! - Running the coordinator and printing the summary
//! - Mapping fatal errors to exit codes

use crate::collector::CollectionError;
use crate::config::{ConfigError, Mode, RunConfig, RunOptions, Settings};
use crate::coordinator::{RunCoordinator, RunSummary};
use crate::output::{ConsoleReporter, OutputFormatter};
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Sort files into category subdirectories by extension.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "sortdir", version, about)]
pub struct Cli {
    /// Source directory to organize
    #[arg(long = "src", value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Destination root directory (default: same as --src)
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Operation mode: move or copy (default: move)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Scan directories recursively
    #[arg(long)]
    pub recursive: bool,

    /// Show what would happen without changing files
    #[arg(long)]
    pub dry_run: bool,

    /// Print detailed actions
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Settings file (default: ./.sortdirrc.toml, then ~/.config/sortdir/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Fatal errors that end the process with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error("cannot write summary: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Exit code for this error. Usage errors from argument parsing exit
    /// with 2 before this type is involved.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => 1,
            CliError::Collection(_) => 3,
            CliError::Output(_) => 1,
        }
    }
}

impl Cli {
    /// Merges the flags over `settings`. Flags win; boolean flags can only
    /// switch a setting on.
    pub fn into_options(self, settings: Settings) -> Result<RunOptions, ConfigError> {
        let mode = match self.mode.as_deref() {
            Some(mode) => mode.parse::<Mode>()?,
            None => settings.mode()?.unwrap_or(Mode::Move),
        };

        Ok(RunOptions {
            source: self.source.ok_or(ConfigError::MissingSource)?,
            dest: self.dest,
            mode,
            recursive: self.recursive || settings.defaults.recursive,
            dry_run: self.dry_run,
            verbose: self.verbose || settings.defaults.verbose,
            filters: settings.filters,
        })
    }
}

/// Runs the CLI application: validates the configuration, performs the run
/// and prints the summary.
///
/// A completed run returns `Ok` even when individual files failed; those are
/// reported on stderr and counted in the summary.
///
/// # Examples
///
/// ```no_run
/// use sortdir::cli::{Cli, run_cli};
///
/// let cli = Cli {
///     source: Some("/home/user/Downloads".into()),
///     dry_run: true,
///     ..Default::default()
/// };
/// match run_cli(cli) {
///     Ok(summary) => println!("{} files would be sorted", summary.succeeded),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<RunSummary, CliError> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let json = cli.json;
    let config = RunConfig::new(cli.into_options(settings)?)?;
    debug!(
        source = %config.source_root.display(),
        dest = %config.dest_root.display(),
        mode = %config.mode,
        recursive = config.recursive,
        dry_run = config.dry_run,
        "configuration validated"
    );

    let mut reporter = ConsoleReporter::new(&config, json);
    let result = RunCoordinator::new(&config).run(&mut reporter);
    reporter.finish();
    let summary = result?;

    if json {
        OutputFormatter::print_summary_json(&summary)?;
    } else {
        OutputFormatter::print_summary(&summary);
    }

    Ok(summary)
}
