//! Plain-text matrix and label-map formats
//!
//! Matrices are whitespace-delimited numeric grids, one row per line. Item
//! labels are a JSON object keyed by item index. Callers supply the readers
//! and writers; nothing here opens files.

use crate::error::{RecommenderError, Result};
use crate::matrix::ItemLabels;
use ndarray::{Array2, ArrayView2};
use std::io::{BufRead, Read, Write};

/// Parse a whitespace-delimited grid. Blank lines are skipped.
pub fn read_grid<R: BufRead>(reader: R) -> Result<Array2<f64>> {
    let mut values = Vec::new();
    let mut columns: Option<usize> = None;
    let mut rows = 0usize;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let before = values.len();
        for token in line.split_whitespace() {
            let value = token.parse::<f64>().map_err(|e| RecommenderError::Parse {
                line: number + 1,
                message: format!("invalid number '{}': {}", token, e),
            })?;
            values.push(value);
        }

        let width = values.len() - before;
        match columns {
            None => columns = Some(width),
            Some(expected) if expected != width => {
                return Err(RecommenderError::Parse {
                    line: number + 1,
                    message: format!("expected {} values, found {}", expected, width),
                });
            }
            Some(_) => {}
        }
        rows += 1;
    }

    let shape = (rows, columns.unwrap_or(0));
    Array2::from_shape_vec(shape, values).map_err(|e| RecommenderError::Parse {
        line: rows,
        message: e.to_string(),
    })
}

/// Write `values` as a whitespace-delimited grid.
pub fn write_grid<W: Write>(values: ArrayView2<'_, f64>, mut writer: W) -> Result<()> {
    for row in values.rows() {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read an item label map from JSON.
pub fn read_labels<R: Read>(reader: R) -> Result<ItemLabels> {
    Ok(serde_json::from_reader(reader)?)
}

/// Write an item label map as pretty JSON.
pub fn write_labels<W: Write>(labels: &ItemLabels, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, labels)?;
    Ok(())
}
