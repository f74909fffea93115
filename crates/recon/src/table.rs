//! Raw CSV grids shared by both normalizers.

use std::path::Path;

use crate::error::ReconError;

/// Row-major grid of raw cells; rows may differ in length.
pub type Grid = Vec<Vec<String>>;

/// Cell spellings treated as absent, in addition to the empty cell.
const MISSING_MARKERS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A", "None"];

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read every record of `path`, header line included.
pub fn read_grid(path: &Path) -> Result<Grid, ReconError> {
    let file = display_name(path);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ReconError::Io(format!("cannot open {}: {e}", path.display())))?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Csv {
            file: file.clone(),
            message: e.to_string(),
        })?;
        grid.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(grid)
}

/// Swap rows and columns; short rows are padded with empty cells.
pub fn transpose(grid: &[Vec<String>]) -> Grid {
    let width = grid.iter().map(|r| r.len()).max().unwrap_or(0);
    (0..width)
        .map(|c| {
            grid.iter()
                .map(|row| row.get(c).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Position of the first column named exactly `name`.
pub fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

/// Finite numeric value of `cell`, `None` for anything else.
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
