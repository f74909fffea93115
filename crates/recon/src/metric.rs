//! Centralized multi-channel export.
//!
//! The file stores one channel per row and one time sample per column. After
//! transposition each row is a sample whose first cells are the liveness
//! flag, the min/max discriminator and a day-relative timestamp, followed by
//! one cell per channel.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use log::{debug, info};

use crate::config::MetricSourceConfig;
use crate::day::{Day, DayTable};
use crate::error::ReconError;
use crate::model::{Observation, ObservationSequence};
use crate::table::{column_index, display_name, is_missing, parse_number, read_grid, transpose};

/// Largest relative offset accepted, in seconds (about 31 years).
const MAX_OFFSET_SECONDS: i64 = 1_000_000_000;

/// Build the metric-side sequence for the channels listed in `channels`.
pub fn normalize_metric_source(
    dir: &Path,
    filename: &str,
    channels: &[String],
    days: &DayTable,
    config: &MetricSourceConfig,
) -> Result<ObservationSequence, ReconError> {
    let day = days.resolve(filename)?;
    let path = dir.join(filename);
    let file = display_name(&path);

    // The CSV header line ends up as the transposed index, not as data.
    let body: Vec<Vec<String>> = read_grid(&path)?.into_iter().skip(1).collect();
    let samples = transpose(&body);

    let headers = sample_headers(&samples, config);
    let channel_idx = channels
        .iter()
        .map(|name| {
            column_index(&headers, name).ok_or_else(|| ReconError::ColumnResolution {
                file: file.clone(),
                column: name.clone(),
            })
        })
        .collect::<Result<Vec<usize>, ReconError>>()?;
    let ts_idx = config.timestamp_index;

    let mut seq = ObservationSequence::new();
    let mut rows = 0usize;
    let mut blank_rows = 0usize;
    let mut coerced = 0usize;
    for row in samples.iter().skip(config.leading_rows + config.skip_rows) {
        let ts_raw = row.get(ts_idx).map(String::as_str).unwrap_or("");
        if is_missing(ts_raw) {
            blank_rows += 1;
            continue;
        }
        let timestamp = absolute_timestamp(day, ts_raw, config.utc_offset_seconds).ok_or_else(
            || ReconError::TimestampParse {
                file: file.clone(),
                value: ts_raw.to_string(),
            },
        )?;
        let timestamp = timestamp.to_string();
        rows += 1;

        for &ci in &channel_idx {
            match row.get(ci).and_then(|c| parse_number(c)) {
                Some(value) => seq.push(Observation::new(timestamp.clone(), value)),
                None => coerced += 1,
            }
        }
    }

    seq.sort_canonical();
    debug!("{file}: {blank_rows} sample(s) without timestamp, {coerced} non-numeric value(s) skipped");
    info!(
        "metric source: {file} ({}), {rows} sample(s) x {} channel(s), {} observation(s)",
        day.tag,
        channels.len(),
        seq.len()
    );
    Ok(seq)
}

/// Column names of the transposed table: the header row with its leading
/// cells replaced by the fixed names.
fn sample_headers(samples: &[Vec<String>], config: &MetricSourceConfig) -> Vec<String> {
    let mut headers = samples.get(config.header_row).cloned().unwrap_or_default();
    for (i, name) in config.fixed_columns.iter().enumerate() {
        match headers.get_mut(i) {
            Some(h) => *h = name.clone(),
            None => headers.push(name.clone()),
        }
    }
    headers
}

/// Epoch seconds of `relative` on `day`, shifted by `utc_offset_seconds`.
///
/// The anchor is midnight UTC; sub-second offsets floor to the second.
pub fn absolute_timestamp(day: &Day, relative: &str, utc_offset_seconds: i64) -> Option<i64> {
    let offset = parse_relative_offset(relative)?;
    epoch_seconds(day.anchor, offset).map(|s| s + utc_offset_seconds)
}

fn epoch_seconds(anchor: NaiveDate, offset: Duration) -> Option<i64> {
    let midnight = anchor.and_hms_opt(0, 0, 0)?;
    midnight
        .checked_add_signed(offset)
        .map(|t| t.and_utc().timestamp())
}

/// Parse a duration written as `[-][D day[s][,] ][H:MM:SS[.fff]]`.
pub fn parse_relative_offset(text: &str) -> Option<Duration> {
    let text = text.trim();
    let (negative, mut rest) = match text.strip_prefix('-') {
        Some(r) => (true, r.trim_start()),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let mut seconds: i64 = 0;
    let mut nanos: i64 = 0;
    let mut parsed_any = false;

    if let Some(pos) = rest.find("day") {
        let days = digits(rest[..pos].trim())?;
        seconds = days.checked_mul(86_400)?;
        rest = rest[pos + 3..].trim_start_matches('s');
        rest = rest.trim_start().trim_start_matches(',').trim();
        parsed_any = true;
    }

    if !rest.is_empty() {
        let mut parts = rest.split(':');
        let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        let hours = digits(h)?;
        let minutes = digits(m)?;
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, Some(f)),
            None => (s, None),
        };
        let secs = digits(whole)?;
        if minutes >= 60 || secs >= 60 {
            return None;
        }
        if let Some(frac) = frac {
            nanos = fraction_nanos(frac)?;
        }
        seconds = seconds
            .checked_add(hours.checked_mul(3_600)?)?
            .checked_add(minutes * 60 + secs)?;
        parsed_any = true;
    }

    if !parsed_any || seconds > MAX_OFFSET_SECONDS {
        return None;
    }

    let offset = Duration::seconds(seconds) + Duration::nanoseconds(nanos);
    Some(if negative { -offset } else { offset })
}

fn digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn fraction_nanos(frac: &str) -> Option<i64> {
    if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut padded: String = frac.chars().take(9).collect();
    while padded.len() < 9 {
        padded.push('0');
    }
    padded.parse().ok()
}
