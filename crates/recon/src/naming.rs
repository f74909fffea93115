//! Metric export file names: `Day {n} - {Metric}...`.

use std::sync::OnceLock;

use regex::Regex;

use crate::day::{Day, DayTable};
use crate::error::ReconError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    pub day: Day,
    pub metric: String,
}

fn metric_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Day \d+ - (\w+)").expect("static pattern"))
}

/// Metric name embedded in `filename`, if it follows the naming convention.
pub fn metric_name(filename: &str) -> Option<&str> {
    metric_name_pattern()
        .captures(filename)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Resolve both the day and the metric name from a metric export file name.
pub fn parse_metric_filename(filename: &str, days: &DayTable) -> Result<SessionFile, ReconError> {
    let day = days.resolve(filename)?.clone();
    let metric = metric_name(filename)
        .ok_or_else(|| ReconError::MetricNameNotFound(filename.to_string()))?
        .to_string();
    Ok(SessionFile { day, metric })
}
