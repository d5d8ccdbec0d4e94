//! xlsx body → DataFrame.
//!
//! Reads the first worksheet of an in-memory workbook. The first row holds
//! the column names; every following row becomes a table row. Column types
//! are inferred from the cells:
//!
//! - all empty → `Null`
//! - bools → `Boolean`
//! - integers → `Int64`, integers mixed with floats → `Float64`
//! - date cells → `Datetime(ms)`
//! - anything else (including mixed columns) → `String`
//!
//! Styles and number formats are only consulted to recognise date cells;
//! nothing about them is reported.

use super::provider::DataError;
use calamine::{Data, Reader, Xlsx};
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Null,
    Bool,
    Int,
    Float,
    Datetime,
    Text,
}

impl CellKind {
    fn of(cell: &Data) -> CellKind {
        match cell {
            Data::Empty => CellKind::Null,
            Data::Bool(_) => CellKind::Bool,
            Data::Int(_) => CellKind::Int,
            Data::Float(_) => CellKind::Float,
            Data::DateTime(dt) if dt.is_datetime() => CellKind::Datetime,
            Data::DateTime(_) => CellKind::Float,
            _ => CellKind::Text,
        }
    }

    /// Widen two cell kinds to one column type.
    fn merge(self, other: CellKind) -> CellKind {
        use CellKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Null, b) => b,
            (a, Null) => a,
            (Int, Float) | (Float, Int) => Float,
            _ => Text,
        }
    }
}

/// Parse an xlsx body into a table.
pub fn parse_xlsx(bytes: &[u8]) -> Result<DataFrame, DataError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| DataError::Parse(format!("not a readable xlsx workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataError::Parse("workbook contains no worksheets".into()))?
        .map_err(|e| DataError::Parse(format!("failed to read first worksheet: {e}")))?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(DataFrame::empty()),
    };
    let names = column_names(header);
    let body: Vec<&[Data]> = rows.collect();

    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| build_column(name, idx, &body))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DataFrame::new(columns)?)
}

/// Header cells as column names; blanks get a positional name, repeats a suffix.
fn column_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let raw = cell.to_string();
            let base = match raw.trim() {
                "" => format!("column_{idx}"),
                name => name.to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{base}_{}", *count - 1)
            }
        })
        .collect()
}

fn build_column(name: &str, idx: usize, rows: &[&[Data]]) -> Result<Column, DataError> {
    let cells: Vec<&Data> = rows
        .iter()
        .map(|row| row.get(idx).unwrap_or(&Data::Empty))
        .collect();

    let kind = cells
        .iter()
        .fold(CellKind::Null, |acc, cell| acc.merge(CellKind::of(cell)));

    let column = match kind {
        CellKind::Null => Column::full_null(name.into(), cells.len(), &DataType::Null),
        CellKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
        CellKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    Data::Int(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
        CellKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| match c {
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(v) => Some(*v),
                    Data::DateTime(dt) => Some(dt.as_f64()),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
        CellKind::Datetime => {
            let values = cells
                .iter()
                .enumerate()
                .map(|(row, c)| match c {
                    Data::DateTime(dt) => dt
                        .as_datetime()
                        .map(|naive| Some(naive.and_utc().timestamp_millis()))
                        .ok_or_else(|| {
                            DataError::Parse(format!(
                                "column '{name}', row {}: date cell out of range",
                                row + 1
                            ))
                        }),
                    _ => Ok(None),
                })
                .collect::<Result<Vec<Option<i64>>, _>>()?;
            Column::new(name.into(), values)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        CellKind::Text => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|c| match c {
                    Data::Empty => None,
                    other => Some(other.to_string()),
                })
                .collect();
            Column::new(name.into(), values)
        }
    };
    Ok(column)
}
