//! pgport: port embedded SQLite queries to PostgreSQL
//!
//! # Usage
//!
//! ```bash
//! # Convert a directory in place, keeping .backup copies
//! pgport routes/ models/
//!
//! # Show what would change, without writing
//! pgport src/ --dry-run --diff
//!
//! # CI gate: exit 1 if anything still needs converting
//! pgport src/ --check
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use pgport::driver::{self, WriteMode};
use pgport::prelude::*;
use pgport::report;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgport")]
#[command(author = "pgport contributors")]
#[command(version)]
#[command(about = "Port SQLite-flavoured SQL embedded in source files to PostgreSQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    pgport routes/ models/
    pgport src/db.js --dry-run --diff
    pgport src/ --check --format json")]
struct Cli {
    /// Files or directories to convert
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Don't write anything, just report what would change
    #[arg(short, long)]
    dry_run: bool,

    /// Like --dry-run, but exit with status 1 when any file would change
    #[arg(long)]
    check: bool,

    /// Overwrite files without writing a backup copy first
    #[arg(long)]
    no_backup: bool,

    /// Suffix appended to the file name of backup copies
    #[arg(long, value_name = "SUFFIX")]
    backup_suffix: Option<String>,

    /// Configuration file (defaults to ./pgport.toml, then the user config dir)
    #[arg(short, long, env = "PGPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print changed lines for each changed file
    #[arg(long)]
    diff: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pgport=debug" } else { "pgport=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn execute(cli: &Cli) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    if cli.no_backup {
        config.driver.backup = false;
    }
    if let Some(suffix) = &cli.backup_suffix {
        if suffix.is_empty() {
            anyhow::bail!("--backup-suffix must not be empty");
        }
        config.driver.backup_suffix = suffix.clone();
    }

    let converter = Converter::new(config.dialect.clone())?;
    let mode = if cli.dry_run || cli.check {
        WriteMode::DryRun
    } else {
        WriteMode::from_config(&config.driver)
    };

    let run = driver::run(&cli.paths, &config.driver, &converter, &mode);

    match cli.format {
        OutputFormat::Text => print!("{}", report::TextReport::new(&run, cli.diff)),
        OutputFormat::Json => println!("{}", report::to_json(&run)?),
    }

    if run.has_failures() || (cli.check && run.has_changes()) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
