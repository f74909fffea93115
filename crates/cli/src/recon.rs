//! `tracecheck run`, `validate` and `channels`: session reconciliation commands.

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use tracecheck_recon::config::ReconConfig;
use tracecheck_recon::day::{channel_columns, DayTable};
use tracecheck_recon::naming::parse_metric_filename;
use tracecheck_recon::{ReconError, TextReport};

use crate::exit_codes::{EXIT_INPUT, EXIT_INVALID_CONFIG, EXIT_MISMATCH, EXIT_OUTPUT, EXIT_USAGE};
use crate::CliError;

/// Looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "tracecheck.toml";

/// Directory overrides given on the command line.
#[derive(Debug, Default)]
pub struct PathOverrides {
    pub person_dir: Option<PathBuf>,
    pub metric_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

pub struct RunOptions {
    pub metric_file: Option<String>,
    pub config: Option<PathBuf>,
    pub paths: PathOverrides,
    pub to_stdout: bool,
    pub json: bool,
    pub output: Option<PathBuf>,
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

/// Map an engine error to an exit code and a hint where one helps.
fn engine_err(err: ReconError, config: &ReconConfig) -> CliError {
    let hint = match &err {
        ReconError::EmptySource { .. } => {
            Some("check --person-dir and that person file names carry the day token".to_string())
        }
        ReconError::UnrecognizedDayTag(_) | ReconError::MetricNameNotFound(_) => {
            let tags: Vec<String> = config.days.iter().map(|d| format!("'{} - <Metric>'", d.tag())).collect();
            Some(format!("metric file names look like {}", tags.join(", ")))
        }
        ReconError::ColumnResolution { .. } => {
            Some("list the expected identifiers with `tracecheck channels <METRIC_FILE>`".to_string())
        }
        _ => None,
    };
    let code = match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        _ => EXIT_INPUT,
    };
    CliError { code, message: err.to_string(), hint }
}

// ============================================================================
// config
// ============================================================================

pub fn resolve_config(path: Option<&Path>, overrides: &PathOverrides) -> Result<ReconConfig, CliError> {
    let mut config = match path {
        Some(p) => load_config(p)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => load_config(Path::new(DEFAULT_CONFIG_FILE))?,
        None => ReconConfig::default(),
    };

    if let Some(dir) = &overrides.person_dir {
        config.paths.person_dir = dir.clone();
    }
    if let Some(dir) = &overrides.metric_dir {
        config.paths.metric_dir = dir.clone();
    }
    if let Some(dir) = &overrides.output_dir {
        config.paths.output_dir = dir.clone();
    }
    Ok(config)
}

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config = ReconConfig::load(path).map_err(|e| recon_err(EXIT_INVALID_CONFIG, e.to_string()))?;
    info!("loaded config from {}", path.display());
    Ok(config)
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(opts: RunOptions) -> Result<(), CliError> {
    let config = resolve_config(opts.config.as_deref(), &opts.paths)?;

    let metric_file = match opts.metric_file {
        Some(name) => name,
        None => prompt_metric_file()?,
    };

    let result = if opts.to_stdout {
        let stdout = io::stdout();
        let mut report = TextReport::new(stdout.lock());
        let result = tracecheck_recon::run(&config, &metric_file, &mut report)
            .map_err(|e| engine_err(e, &config))?;
        report
            .finish()
            .map_err(|e| recon_err(EXIT_OUTPUT, format!("cannot write report: {e}")))?;
        result
    } else {
        // Normalize before touching the output file so a failed run leaves
        // any previous report in place.
        let sources = tracecheck_recon::load_sources(&config, &metric_file).map_err(|e| engine_err(e, &config))?;
        let path = report_path(&config.paths.output_dir, &metric_file)?;
        let file = File::create(&path)
            .map_err(|e| recon_err(EXIT_OUTPUT, format!("cannot create {}: {e}", path.display())))?;
        let mut report = TextReport::new(BufWriter::new(file));
        let result = tracecheck_recon::reconcile_sources(&config, &metric_file, sources, &mut report);
        report
            .finish()
            .map_err(|e| recon_err(EXIT_OUTPUT, format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
        result
    };

    if opts.json || opts.output.is_some() {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| recon_err(EXIT_OUTPUT, format!("JSON serialization error: {e}")))?;
        if let Some(ref path) = opts.output {
            std::fs::write(path, &json_str)
                .map_err(|e| recon_err(EXIT_OUTPUT, format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        if opts.json {
            println!("{json_str}");
        }
    }

    let s = &result.report.summary;
    eprintln!(
        "Day {} {}: {} person / {} metric observation(s), {} person-only, {} metric-only",
        result.meta.day, result.meta.metric, s.left_total, s.right_total, s.left_only, s.right_only,
    );

    if !result.report.fully_matched {
        // The summary above already says what differs.
        return Err(recon_err(EXIT_MISMATCH, ""));
    }
    Ok(())
}

/// `{output_dir}/{metric_file}.txt`, creating the directory.
pub fn report_path(output_dir: &Path, metric_file: &str) -> Result<PathBuf, CliError> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        recon_err(EXIT_OUTPUT, format!("cannot create {}: {e}", output_dir.display()))
    })?;
    let name = Path::new(metric_file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| metric_file.to_string());
    Ok(output_dir.join(format!("{name}.txt")))
}

fn prompt_metric_file() -> Result<String, CliError> {
    let mut stdout = io::stdout();
    write!(stdout, "Enter the metric filename: ")
        .and_then(|_| stdout.flush())
        .map_err(|e| recon_err(EXIT_OUTPUT, e.to_string()))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| recon_err(EXIT_USAGE, format!("cannot read metric filename: {e}")))?;

    let name = line.trim().to_string();
    if name.is_empty() {
        return Err(CliError::args("no metric filename given")
            .with_hint("pass it as an argument: tracecheck run 'Day 1 - <Metric>.csv'"));
    }
    Ok(name)
}

// ============================================================================
// validate / channels
// ============================================================================

pub fn cmd_validate(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = resolve_config(config_path.as_deref(), &PathOverrides::default())?;
    let days = DayTable::from_config(&config.days);

    println!("person_dir: {}", config.paths.person_dir.display());
    println!("metric_dir: {}", config.paths.metric_dir.display());
    println!("output_dir: {}", config.paths.output_dir.display());
    println!("decimals:   {}", config.matching.decimals);
    for day in days.days() {
        println!("day {}: tag '{}', token '{}', anchor {}", day.number, day.tag, day.token, day.anchor);
    }

    for dir in [&config.paths.person_dir, &config.paths.metric_dir] {
        if !dir.is_dir() {
            warn!("directory {} does not exist", dir.display());
        }
    }
    eprintln!("config OK");
    Ok(())
}

pub fn cmd_channels(metric_file: String, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = resolve_config(config_path.as_deref(), &PathOverrides::default())?;
    let days = DayTable::from_config(&config.days);
    let session = parse_metric_filename(&metric_file, &days).map_err(|e| engine_err(e, &config))?;

    println!(
        "{} ({}), metric {}: columns {} / {}",
        session.day.tag,
        session.day.anchor,
        session.metric,
        config.person.min_column_for(&session.metric),
        config.person.max_column_for(&session.metric),
    );
    for channel in channel_columns(&session.day, &config.channels) {
        println!("{channel}");
    }
    Ok(())
}
