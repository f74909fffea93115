// tracecheck CLI - reconcile per-person exports against the central export

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};
use recon::{PathOverrides, RunOptions};

#[derive(Parser)]
#[command(name = "tracecheck")]
#[command(about = "Cross-check per-person recordings against the central multi-channel export")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./tracecheck.toml when present)
    #[arg(long, short = 'c', global = true, env = "TRACECHECK_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one session and write the discrepancy report
    #[command(after_help = "\
Examples:
  tracecheck run 'Day 2 - HR.csv'
  tracecheck run 'Day 1 - SpO2.csv' --stdout
  tracecheck run 'Day 3 - HR.csv' --json --output day3.json
  tracecheck run --person-dir ./data_person --metric-dir ./data_metric

Exit codes:
  0  every observation matched
  1  discrepancies found
  2  usage error
  3  invalid config
  4  input error (files, columns, cells)
  5  report could not be written")]
    Run {
        /// Metric export file name, e.g. 'Day 2 - HR.csv' (prompted when omitted)
        metric_file: Option<String>,

        /// Directory holding the per-person exports
        #[arg(long)]
        person_dir: Option<PathBuf>,

        /// Directory holding the central metric exports
        #[arg(long)]
        metric_dir: Option<PathBuf>,

        /// Directory the text report is written to
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Write the text report to stdout instead of the output directory
        #[arg(long, conflicts_with = "json")]
        stdout: bool,

        /// Print the structured report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Check the config and print the resolved day table
    Validate,

    /// List the channel identifiers expected for a metric export
    #[command(after_help = "\
Examples:
  tracecheck channels 'Day 2 - HR.csv'")]
    Channels {
        /// Metric export file name
        metric_file: String,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("TRACECHECK_COMMIT"), ")",
        "\ntarget:  ", env!("TRACECHECK_TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            metric_file,
            person_dir,
            metric_dir,
            output_dir,
            stdout,
            json,
            output,
        } => recon::cmd_run(RunOptions {
            metric_file,
            config: cli.config,
            paths: PathOverrides { person_dir, metric_dir, output_dir },
            to_stdout: stdout,
            json,
            output,
        }),
        Commands::Validate => recon::cmd_validate(cli.config),
        Commands::Channels { metric_file } => recon::cmd_channels(metric_file, cli.config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
