//! sheetsplit CLI
//!
//! Splits CSV and XLSX files from an input directory into fixed-size chunks.

mod config;
mod logging;
mod progress;

use clap::{Parser, Subcommand};
use sheetsplit_files::{BatchDriver, BatchReport, FileProcessor, FileStatus};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::Config;
use logging::LogContext;
use progress::{BatchProgress, format_bytes};

/// Exit status when the dispatch policy refuses to run or setup fails
const EXIT_REFUSED: u8 = 1;
/// Exit status when at least one file was not archived
const EXIT_FILE_FAILURES: u8 = 2;

/// sheetsplit - split spreadsheets and CSV files into fixed-size chunks
#[derive(Parser)]
#[command(name = "sheetsplit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, default_value_os_t = Config::default_path())]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every file in the input directory
    Run {
        /// Print per-file outcomes as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and list pending files
    Check,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_REFUSED)
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Run { json } => {
            let config = load_config(&cli.config)?;
            run_batch(&config, json, cli.verbose)
        }
        Commands::Check => {
            logging::init_console(cli.verbose);
            let config = load_config(&cli.config)?;
            check(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            init_config(&cli.config, force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = Config::load(path)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Process the input directory once
fn run_batch(config: &Config, json: bool, verbose: bool) -> anyhow::Result<ExitCode> {
    config.ensure_directories()?;
    let progress = if json {
        BatchProgress::hidden()
    } else {
        BatchProgress::visible()
    };
    let log = LogContext::init(
        &config.log_directory,
        &config.log_level,
        verbose,
        progress.bar(),
    )?;
    tracing::info!(
        "sheetsplit {} starting (log: {})",
        env!("CARGO_PKG_VERSION"),
        log.log_file().display()
    );

    let processor = FileProcessor::new(config.processor_settings())?;
    let driver = BatchDriver::new(
        &config.input_directory,
        config.dispatch_policy,
        config.max_concurrent_files,
        processor,
    );

    let report = match driver.run_with(|n| progress.start(n), |o| progress.record(o)) {
        Ok(report) => report,
        Err(e) => {
            progress.abandon();
            tracing::error!("{}", e);
            return Ok(ExitCode::from(EXIT_REFUSED));
        }
    };

    progress.finish_with_message(format!(
        "{} archived, {} rejected, {} failed",
        report.archived(),
        report.rejected(),
        report.failed()
    ));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(if report.all_archived() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FILE_FAILURES)
    })
}

fn print_summary(report: &BatchReport) {
    println!(
        "Processed {} files ({}) with {} policy",
        report.outcomes.len(),
        format_bytes(report.total_bytes()),
        report.policy
    );

    for outcome in &report.outcomes {
        match &outcome.status {
            FileStatus::Archived {
                report, attempts, ..
            } => println!(
                "  [ok]       {} -> {} chunks in {} ({} attempt(s))",
                outcome.path.display(),
                report.chunks,
                report.output_dir.display(),
                attempts
            ),
            FileStatus::Rejected { reason } => {
                println!("  [rejected] {}: {}", outcome.path.display(), reason);
            }
            FileStatus::Failed { error, .. } => {
                println!("  [failed]   {}: {}", outcome.path.display(), error);
            }
        }
    }
}

/// Validate configuration and show what a run would pick up
fn check(config: &Config) -> anyhow::Result<()> {
    println!("Configuration:");
    println!("  Input: {}", config.input_directory.display());
    println!("  Output: {}", config.output_directory.display());
    println!("  Archive: {}", config.archive_directory.display());
    println!("  Log: {}", config.log_directory.display());
    println!("  Light threshold: {} MB", config.light_threshold_mb);
    println!("  Heavy path: {}", config.heavy_path_enabled);
    println!("  Rows per file: {}", config.rows_per_file);
    println!("  Dispatch: {}", config.dispatch_policy);
    println!("  Max concurrent files: {}", config.max_concurrent_files);
    println!(
        "  Retries: {} ({}s apart)",
        config.max_retries, config.retry_delay_seconds
    );
    println!();

    let processor = FileProcessor::new(config.processor_settings())?;
    let driver = BatchDriver::new(
        &config.input_directory,
        config.dispatch_policy,
        config.max_concurrent_files,
        processor,
    );
    let files = driver.list_input()?;

    println!("Pending files: {}", files.len());
    for path in files {
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        println!("  {} ({})", path.display(), format_bytes(size));
    }

    Ok(())
}

/// Write the default configuration
fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    Config::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
