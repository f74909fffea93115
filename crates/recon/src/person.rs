//! Per-person exports: one file per participant and day, each row carrying a
//! timestamp plus a minimum and maximum reading.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::PersonSourceConfig;
use crate::error::ReconError;
use crate::model::{Observation, ObservationSequence};
use crate::table::{column_index, display_name, is_missing, parse_number, read_grid};

/// Regular files in `dir` whose name contains `token`, sorted by name.
pub fn person_files(dir: &Path, token: &str) -> Result<Vec<PathBuf>, ReconError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| ReconError::Io(format!("cannot list {}: {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReconError::Io(e.to_string()))?;
        if !entry.file_name().to_string_lossy().contains(token) {
            continue;
        }
        // `is_file` follows symlinks.
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Build the person-side sequence for one day and metric.
///
/// Each kept row yields `(timestamp, min)` and `(timestamp, max)`; exact
/// duplicates across all files collapse to one observation.
pub fn normalize_person_source(
    dir: &Path,
    token: &str,
    metric: &str,
    config: &PersonSourceConfig,
) -> Result<ObservationSequence, ReconError> {
    let files = person_files(dir, token)?;
    if files.is_empty() {
        return Err(ReconError::EmptySource {
            dir: dir.display().to_string(),
            token: token.to_string(),
        });
    }

    let columns = [
        config.timestamp_column.clone(),
        config.min_column_for(metric),
        config.max_column_for(metric),
    ];

    let mut seq = ObservationSequence::new();
    for path in &files {
        load_person_file(path, config.metadata_rows, &columns, &mut seq)?;
    }

    let expanded = seq.len();
    seq.sort_canonical();
    seq.dedup_exact();
    info!(
        "person source: {} file(s) for '{token}', {} observation(s) ({} duplicate(s) removed)",
        files.len(),
        seq.len(),
        expanded - seq.len()
    );
    Ok(seq)
}

fn load_person_file(
    path: &Path,
    metadata_rows: usize,
    columns: &[String; 3],
    out: &mut ObservationSequence,
) -> Result<(), ReconError> {
    let file = display_name(path);
    let grid = read_grid(path)?;
    let mut rows = grid.into_iter().skip(metadata_rows);
    let headers = rows.next().unwrap_or_default();

    let idx = |name: &str| -> Result<usize, ReconError> {
        column_index(&headers, name).ok_or_else(|| ReconError::MissingColumn {
            file: file.clone(),
            column: name.to_string(),
        })
    };
    let ts_idx = idx(&columns[0])?;
    let min_idx = idx(&columns[1])?;
    let max_idx = idx(&columns[2])?;

    let mut kept = 0usize;
    let mut dropped = 0usize;
    for row in rows {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
        let (ts_raw, min_raw, max_raw) = (cell(ts_idx), cell(min_idx), cell(max_idx));

        if is_missing(ts_raw) || is_missing(min_raw) || is_missing(max_raw) {
            dropped += 1;
            continue;
        }

        let ts = parse_number(ts_raw).ok_or_else(|| ReconError::TimestampParse {
            file: file.clone(),
            value: ts_raw.to_string(),
        })?;
        let value = |raw: &str, column: &str| {
            parse_number(raw).ok_or_else(|| ReconError::ValueParse {
                file: file.clone(),
                column: column.to_string(),
                value: raw.to_string(),
            })
        };
        let min = value(min_raw, &columns[1])?;
        let max = value(max_raw, &columns[2])?;

        let timestamp = format!("{ts:.0}");
        out.push(Observation::new(timestamp.clone(), min));
        out.push(Observation::new(timestamp, max));
        kept += 1;
    }

    debug!("{file}: {kept} row(s) kept, {dropped} row(s) with missing cells dropped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Timestamp,PM.HR.Min,PM.HR.Max,Other";

    fn write(dir: &TempDir, name: &str, lines: &[&str]) {
        let mut body = String::from("exported by device 7\n");
        for l in lines {
            body.push_str(l);
            body.push('\n');
        }
        fs::write(dir.path().join(name), body).unwrap();
    }

    fn pairs(seq: &ObservationSequence) -> Vec<(String, f64)> {
        seq.iter().map(|o| (o.timestamp.clone(), o.value)).collect()
    }

    #[test]
    fn expands_min_and_max() {
        let dir = TempDir::new().unwrap();
        write(&dir, "P01_D1.csv", &[HEADER, "1717545600.0,60.5,72.1,x", "1717545610,61,70,y"]);

        let seq = normalize_person_source(dir.path(), "D1", "HR", &PersonSourceConfig::default())
            .unwrap();
        assert_eq!(
            pairs(&seq),
            vec![
                ("1717545600".into(), 60.5),
                ("1717545600".into(), 72.1),
                ("1717545610".into(), 61.0),
                ("1717545610".into(), 70.0),
            ]
        );
    }

    #[test]
    fn filters_by_day_token_and_concatenates() {
        let dir = TempDir::new().unwrap();
        write(&dir, "P01_D1.csv", &[HEADER, "200,1,2,"]);
        write(&dir, "P02_D1.csv", &[HEADER, "100,3,4,"]);
        write(&dir, "P01_D2.csv", &[HEADER, "300,5,6,"]);

        let seq = normalize_person_source(dir.path(), "D1", "HR", &PersonSourceConfig::default())
            .unwrap();
        let ts: Vec<&str> = seq.iter().map(|o| o.timestamp.as_str()).collect();
        assert_eq!(ts, vec!["100", "100", "200", "200"]);
    }

    #[test]
    fn duplicate_rows_collapse_but_distinct_values_survive() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "P01_D1.csv",
            &[HEADER, "100,2.0,3.0,", "100,2.0,3.0,", "100,2.5,3.0,"],
        );

        let seq = normalize_person_source(dir.path(), "D1", "HR", &PersonSourceConfig::default())
            .unwrap();
        assert_eq!(
            pairs(&seq),
            vec![("100".into(), 2.0), ("100".into(), 2.5), ("100".into(), 3.0)]
        );
    }

    #[test]
    fn min_equal_to_max_yields_single_observation() {
        let dir = TempDir::new().unwrap();
        write(&dir, "P01_D1.csv", &[HEADER, "100,4.0,4.0,"]);
        let seq = normalize_person_source(dir.path(), "D1", "HR", &PersonSourceConfig::default())
            .unwrap();
        assert_eq!(pairs(&seq), vec![("100".into(), 4.0)]);
    }

    #[test]
    fn rows_with_missing_cells_are_dropped() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "P01_D1.csv",
            &[HEADER, "100,,3.0,", "110,NaN,3.0,", "120,1.0", "130,1.0,2.0,"],
        );
        let seq = normalize_person_source(dir.path(), "D1", "HR", &PersonSourceConfig::default())
            .unwrap();
        assert_eq!(pairs(&seq), vec![("130".into(), 1.0), ("130".into(), 2.0)]);
    }

    #[test]
    fn no_matching_file_is_empty_source() {
        let dir = TempDir::new().unwrap();
        write(&dir, "P01_D2.csv", &[HEADER, "100,1,2,"]);
        let err = normalize_person_source(dir.path(), "D1", "HR", &PersonSourceConfig::default())
            .unwrap_err();
        assert!(matches!(err, ReconError::EmptySource { ref token, .. } if token == "D1"));
    }

    #[test]
    fn missing_metric_column() {
        let dir = TempDir::new().unwrap();
        write(&dir, "P01_D1.csv", &[HEADER, "100,1,2,"]);
        let err = normalize_person_source(dir.path(), "D1", "SpO2", &PersonSourceConfig::default())
            .unwrap_err();
        assert!(
            matches!(err, ReconError::MissingColumn { ref column, .. } if column == "PM.SpO2.Min"),
            "{err}"
        );
    }

    #[test]
    fn non_numeric_timestamp_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "P01_D1.csv", &[HEADER, "noon,1,2,"]);
        let err = normalize_person_source(dir.path(), "D1", "HR", &PersonSourceConfig::default())
            .unwrap_err();
        assert!(matches!(err, ReconError::TimestampParse { .. }));
    }

    #[test]
    fn non_numeric_value_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "P01_D1.csv", &[HEADER, "100,low,2,"]);
        let err = normalize_person_source(dir.path(), "D1", "HR", &PersonSourceConfig::default())
            .unwrap_err();
        assert!(matches!(err, ReconError::ValueParse { ref column, .. } if column == "PM.HR.Min"));
    }

    #[test]
    fn directories_are_not_person_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("archive_D1")).unwrap();
        write(&dir, "P01_D1.csv", &[HEADER, "100,1,2,"]);
        let files = person_files(dir.path(), "D1").unwrap();
        assert_eq!(files.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_exports_are_read() {
        let staging = TempDir::new().unwrap();
        write(&staging, "export.csv", &[HEADER, "100,1,2,"]);
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(staging.path().join("export.csv"), dir.path().join("P01_D1.csv"))
            .unwrap();
        std::os::unix::fs::symlink(staging.path(), dir.path().join("linked_D1")).unwrap();

        assert_eq!(person_files(dir.path(), "D1").unwrap(), vec![dir.path().join("P01_D1.csv")]);
        let seq = normalize_person_source(dir.path(), "D1", "HR", &PersonSourceConfig::default())
            .unwrap();
        assert_eq!(pairs(&seq), vec![("100".into(), 1.0), ("100".into(), 2.0)]);
    }

    #[test]
    fn fractional_timestamps_round_half_to_even() {
        let dir = TempDir::new().unwrap();
        write(&dir, "P01_D1.csv", &[HEADER, "100.5,1,1,", "101.5,2,2,", "100.7,3,3,", "99.2,4,4,"]);
        let seq = normalize_person_source(dir.path(), "D1", "HR", &PersonSourceConfig::default())
            .unwrap();
        assert_eq!(
            pairs(&seq),
            vec![
                ("100".into(), 1.0),
                ("101".into(), 3.0),
                ("102".into(), 2.0),
                ("99".into(), 4.0),
            ]
        );
    }

    #[test]
    fn missing_directory_is_io_error() {
        let err = normalize_person_source(
            Path::new("/nonexistent/person"),
            "D1",
            "HR",
            &PersonSourceConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::Io(_)));
    }
}
