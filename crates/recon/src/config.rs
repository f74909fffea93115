use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ReconError;

/// Placeholder substituted with the metric name in person column templates.
pub const METRIC_PLACEHOLDER: &str = "{metric}";
/// Placeholder substituted with the channel index in channel patterns.
pub const INDEX_PLACEHOLDER: &str = "{i}";
/// Placeholder substituted with the day number in channel patterns.
pub const DAY_PLACEHOLDER: &str = "{day}";

/// Leading non-data rows of the transposed metric export.
pub const DEFAULT_METRIC_SKIP_ROWS: usize = 19;
/// Uniform correction applied to reconstructed epoch seconds (UTC-8).
pub const DEFAULT_UTC_OFFSET_SECONDS: i64 = -28_800;
/// Decimal places compared when matching values.
pub const DEFAULT_MATCH_DECIMALS: u32 = 1;

const MAX_MATCH_DECIMALS: u32 = 6;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub person: PersonSourceConfig,
    #[serde(default)]
    pub metric: MetricSourceConfig,
    #[serde(default)]
    pub channels: ChannelConfig,
    #[serde(default, rename = "match")]
    pub matching: MatchConfig,
    #[serde(default = "default_days")]
    pub days: Vec<DayConfig>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            person: PersonSourceConfig::default(),
            metric: MetricSourceConfig::default(),
            channels: ChannelConfig::default(),
            matching: MatchConfig::default(),
            days: default_days(),
        }
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_person_dir")]
    pub person_dir: PathBuf,
    #[serde(default = "default_metric_dir")]
    pub metric_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_person_dir() -> PathBuf {
    PathBuf::from("data_person")
}

fn default_metric_dir() -> PathBuf {
    PathBuf::from("data_metric")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data_text")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            person_dir: default_person_dir(),
            metric_dir: default_metric_dir(),
            output_dir: default_output_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Person source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PersonSourceConfig {
    /// Rows preceding the header line.
    #[serde(default = "default_metadata_rows")]
    pub metadata_rows: usize,
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
    #[serde(default = "default_min_column")]
    pub min_column: String,
    #[serde(default = "default_max_column")]
    pub max_column: String,
}

fn default_metadata_rows() -> usize {
    1
}

fn default_timestamp_column() -> String {
    "Timestamp".into()
}

fn default_min_column() -> String {
    "PM.{metric}.Min".into()
}

fn default_max_column() -> String {
    "PM.{metric}.Max".into()
}

impl Default for PersonSourceConfig {
    fn default() -> Self {
        Self {
            metadata_rows: default_metadata_rows(),
            timestamp_column: default_timestamp_column(),
            min_column: default_min_column(),
            max_column: default_max_column(),
        }
    }
}

impl PersonSourceConfig {
    pub fn min_column_for(&self, metric: &str) -> String {
        self.min_column.replace(METRIC_PLACEHOLDER, metric)
    }

    pub fn max_column_for(&self, metric: &str) -> String {
        self.max_column.replace(METRIC_PLACEHOLDER, metric)
    }
}

// ---------------------------------------------------------------------------
// Metric source
// ---------------------------------------------------------------------------

/// Layout of the transposed multi-channel export.
///
/// Row indices refer to the table after transposition, where each row is
/// one time sample and each column one file row.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricSourceConfig {
    /// Row holding channel identifiers.
    #[serde(default = "default_header_row")]
    pub header_row: usize,
    /// Rows consumed as headers before data begins.
    #[serde(default = "default_leading_rows")]
    pub leading_rows: usize,
    /// Non-data rows dropped after the header rows.
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
    #[serde(default = "default_utc_offset")]
    pub utc_offset_seconds: i64,
    /// Names given to the first columns, replacing whatever the header held.
    #[serde(default = "default_fixed_columns")]
    pub fixed_columns: Vec<String>,
    /// Index into `fixed_columns` of the relative timestamp.
    #[serde(default = "default_timestamp_index")]
    pub timestamp_index: usize,
}

fn default_header_row() -> usize {
    1
}

fn default_leading_rows() -> usize {
    2
}

fn default_skip_rows() -> usize {
    DEFAULT_METRIC_SKIP_ROWS
}

fn default_utc_offset() -> i64 {
    DEFAULT_UTC_OFFSET_SECONDS
}

fn default_fixed_columns() -> Vec<String> {
    vec!["Online/Live".into(), "Min/Max".into(), "Timestamp".into()]
}

fn default_timestamp_index() -> usize {
    2
}

impl Default for MetricSourceConfig {
    fn default() -> Self {
        Self {
            header_row: default_header_row(),
            leading_rows: default_leading_rows(),
            skip_rows: default_skip_rows(),
            utc_offset_seconds: default_utc_offset(),
            fixed_columns: default_fixed_columns(),
            timestamp_index: default_timestamp_index(),
        }
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Channels per pattern, numbered from 1.
    #[serde(default = "default_channel_count")]
    pub count: u32,
    #[serde(default = "default_channel_patterns")]
    pub patterns: Vec<String>,
}

fn default_channel_count() -> u32 {
    10
}

fn default_channel_patterns() -> Vec<String> {
    vec!["{i}-AMPerson{i}D{day}".into(), "{i}-PMPerson{i}D{day}".into()]
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            count: default_channel_count(),
            patterns: default_channel_patterns(),
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    DEFAULT_MATCH_DECIMALS
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
        }
    }
}

// ---------------------------------------------------------------------------
// Days
// ---------------------------------------------------------------------------

/// One recording day. `tag` is searched in metric file names, `token` in
/// person file names; both default from `number`.
#[derive(Debug, Clone, Deserialize)]
pub struct DayConfig {
    pub number: u32,
    pub anchor: NaiveDate,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl DayConfig {
    pub fn new(number: u32, anchor: NaiveDate) -> Self {
        Self {
            number,
            anchor,
            tag: None,
            token: None,
        }
    }

    pub fn tag(&self) -> String {
        self.tag
            .clone()
            .unwrap_or_else(|| format!("Day {}", self.number))
    }

    pub fn token(&self) -> String {
        self.token
            .clone()
            .unwrap_or_else(|| format!("D{}", self.number))
    }
}

fn default_days() -> Vec<DayConfig> {
    [(1, 5), (2, 6), (3, 7)]
        .into_iter()
        .filter_map(|(number, day)| {
            NaiveDate::from_ymd_opt(2024, 6, day).map(|anchor| DayConfig::new(number, anchor))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.days.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one day is required".into(),
            ));
        }

        let mut numbers = HashSet::new();
        let mut tags = HashSet::new();
        for day in &self.days {
            if !numbers.insert(day.number) {
                return Err(ReconError::ConfigValidation(format!(
                    "day {} defined more than once",
                    day.number
                )));
            }
            let tag = day.tag();
            if tag.is_empty() || day.token().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "day {}: tag and token must not be empty",
                    day.number
                )));
            }
            if !tags.insert(tag.clone()) {
                return Err(ReconError::ConfigValidation(format!(
                    "day tag '{tag}' used more than once"
                )));
            }
        }

        if self.matching.decimals > MAX_MATCH_DECIMALS {
            return Err(ReconError::ConfigValidation(format!(
                "match.decimals must be at most {MAX_MATCH_DECIMALS}, got {}",
                self.matching.decimals
            )));
        }

        for (name, template) in [
            ("person.min_column", &self.person.min_column),
            ("person.max_column", &self.person.max_column),
        ] {
            if !template.contains(METRIC_PLACEHOLDER) {
                return Err(ReconError::ConfigValidation(format!(
                    "{name} must contain {METRIC_PLACEHOLDER}"
                )));
            }
        }

        let metric = &self.metric;
        if metric.header_row >= metric.leading_rows {
            return Err(ReconError::ConfigValidation(format!(
                "metric.header_row ({}) must be below metric.leading_rows ({})",
                metric.header_row, metric.leading_rows
            )));
        }
        if metric.fixed_columns.len() != 3 {
            return Err(ReconError::ConfigValidation(format!(
                "metric.fixed_columns needs exactly 3 names, got {}",
                metric.fixed_columns.len()
            )));
        }
        if metric.timestamp_index >= metric.fixed_columns.len() {
            return Err(ReconError::ConfigValidation(format!(
                "metric.timestamp_index ({}) is outside fixed_columns",
                metric.timestamp_index
            )));
        }

        if self.channels.patterns.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one channel pattern is required".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
