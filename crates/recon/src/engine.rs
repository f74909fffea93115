use log::info;
use serde::Serialize;

use crate::config::ReconConfig;
use crate::day::{channel_columns, DayTable};
use crate::error::ReconError;
use crate::metric::normalize_metric_source;
use crate::model::{ObservationSequence, ReconciliationReport};
use crate::naming::{parse_metric_filename, SessionFile};
use crate::person::normalize_person_source;
use crate::reconcile::{reconcile_into, RoundingPolicy};
use crate::report::ReportSink;

/// Both normalized sides of one session, ready for reconciliation.
#[derive(Debug, Clone)]
pub struct SessionSources {
    pub session: SessionFile,
    pub channels: Vec<String>,
    pub person: ObservationSequence,
    pub metric: ObservationSequence,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub metric_file: String,
    pub day: u32,
    pub metric: String,
    pub decimals: u32,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub report: ReconciliationReport,
}

/// Normalize both sources for `metric_file`. Any failure aborts before
/// reconciliation.
pub fn load_sources(config: &ReconConfig, metric_file: &str) -> Result<SessionSources, ReconError> {
    let days = DayTable::from_config(&config.days);
    let session = parse_metric_filename(metric_file, &days)?;
    info!(
        "session: {} ({}), metric '{}'",
        session.day.tag, session.day.anchor, session.metric
    );

    let person = normalize_person_source(
        &config.paths.person_dir,
        &session.day.token,
        &session.metric,
        &config.person,
    )?;

    let channels = channel_columns(&session.day, &config.channels);
    let metric = normalize_metric_source(
        &config.paths.metric_dir,
        metric_file,
        &channels,
        &days,
        &config.metric,
    )?;

    Ok(SessionSources {
        session,
        channels,
        person,
        metric,
    })
}

/// Reconcile already-normalized `sources`, streaming into `sink`.
/// Person observations are the left side, metric observations the right.
pub fn reconcile_sources<S: ReportSink + ?Sized>(
    config: &ReconConfig,
    metric_file: &str,
    sources: SessionSources,
    sink: &mut S,
) -> ReconResult {
    let policy = RoundingPolicy::new(config.matching.decimals);
    let report = reconcile_into(&sources.person, &sources.metric, &policy, sink);
    info!(
        "reconciled {} person / {} metric observation(s): {} unmatched",
        report.summary.left_total,
        report.summary.right_total,
        report.summary.left_only + report.summary.right_only,
    );

    ReconResult {
        meta: ReconMeta {
            metric_file: metric_file.to_string(),
            day: sources.session.day.number,
            metric: sources.session.metric,
            decimals: policy.decimals,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        report,
    }
}

/// Load, normalize and reconcile one session, streaming into `sink`.
pub fn run<S: ReportSink + ?Sized>(
    config: &ReconConfig,
    metric_file: &str,
    sink: &mut S,
) -> Result<ReconResult, ReconError> {
    let sources = load_sources(config, metric_file)?;
    Ok(reconcile_sources(config, metric_file, sources, sink))
}
