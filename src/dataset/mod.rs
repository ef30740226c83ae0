//! Raw tabular datasets.
//!
//! A [`Dataset`] is an n × p matrix of [`Value`] cells with validated shape:
//! at least one row, at least one column, every row the same width. Rows can
//! come from memory, JSON or (with the `csv` feature) CSV files.

pub mod encoding;
pub mod summary;

pub use encoding::{CategoricalEncoder, Encoding};
pub use summary::{ColumnSummarizer, ColumnSummary, DefaultTypeDetector, TagDetector};

use crate::core::error::{ImputeError, Result};
use crate::core::types::*;
use crate::input_error;
use serde::Serialize;

/// Validated raw matrix of cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    rows: Vec<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column_names: Option<Vec<String>>,
}

impl Dataset {
    /// Create a dataset, rejecting empty and ragged matrices.
    pub fn new(rows: Vec<Vec<Value>>) -> Result<Self> {
        let first = rows
            .first()
            .ok_or_else(|| ImputeError::invalid_input("dataset has no rows"))?;
        let width = first.len();
        if width == 0 {
            return Err(ImputeError::invalid_input("dataset has no columns"));
        }
        if let Some((row_idx, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(input_error!(
                "ragged rows: row {} has {} cells, expected {}",
                row_idx,
                row.len(),
                width
            ));
        }

        Ok(Dataset {
            rows,
            column_names: None,
        })
    }

    /// Build a dataset from anything convertible into cells.
    pub fn from_values<R, V>(rows: R) -> Result<Self>
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self::new(rows)
    }

    /// Parse a JSON array of arrays; `null` and `""` are missing cells.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<Vec<Value>> = serde_json::from_str(json)?;
        Self::new(rows)
    }

    /// Attach column names; the count must match the column count.
    pub fn with_column_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.num_columns() {
            return Err(input_error!(
                "{} column names for {} columns",
                names.len(),
                self.num_columns()
            ));
        }
        self.column_names = Some(names);
        Ok(self)
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.rows[0].len()
    }

    /// Column names, when known
    pub fn column_names(&self) -> Option<&[String]> {
        self.column_names.as_deref()
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// One row
    pub fn row(&self, row: RowIndex) -> Option<&[Value]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// One cell
    pub fn get(&self, row: RowIndex, column: ColumnIndex) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// The cells of one column in row order.
    pub fn column(&self, column: ColumnIndex) -> Vec<&Value> {
        self.rows.iter().map(|row| &row[column]).collect()
    }

    /// Total number of missing cells
    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|v| v.is_missing())
            .count()
    }

    /// Number of rows without any missing cell
    pub fn complete_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.iter().all(|v| !v.is_missing()))
            .count()
    }

    /// Row-wise structural copy of the cells.
    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        self.rows.iter().map(|row| row.to_vec()).collect()
    }

    /// Take the rows out of the dataset
    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }
}

impl TryFrom<Vec<Vec<Value>>> for Dataset {
    type Error = ImputeError;

    fn try_from(rows: Vec<Vec<Value>>) -> Result<Self> {
        Dataset::new(rows)
    }
}

#[cfg(feature = "csv")]
mod csv_io {
    use super::*;
    use std::io::{Read, Write};
    use std::path::Path;

    /// Empty fields are missing, numeric fields become numbers, anything else text.
    pub(super) fn parse_cell(field: &str) -> Value {
        let field = field.trim();
        if field.is_empty() {
            return Value::Missing;
        }
        match field.parse::<f64>() {
            Ok(v) => Value::Number(v),
            Err(_) => Value::Text(field.to_string()),
        }
    }

    impl Dataset {
        /// Read CSV records from any reader.
        pub fn from_csv_reader<R: Read>(reader: R, has_headers: bool) -> Result<Self> {
            let mut csv_reader = csv::ReaderBuilder::new()
                .has_headers(has_headers)
                .flexible(true)
                .from_reader(reader);

            let headers = if has_headers {
                Some(
                    csv_reader
                        .headers()?
                        .iter()
                        .map(|h| h.trim().to_string())
                        .collect::<Vec<_>>(),
                )
            } else {
                None
            };

            let mut rows = Vec::new();
            for record in csv_reader.records() {
                let record = record?;
                rows.push(record.iter().map(parse_cell).collect());
            }

            let dataset = Dataset::new(rows)?;
            match headers {
                Some(names) => dataset.with_column_names(names),
                None => Ok(dataset),
            }
        }

        /// Read a CSV file from disk.
        pub fn from_csv_path<P: AsRef<Path>>(path: P, has_headers: bool) -> Result<Self> {
            let file = std::fs::File::open(path)?;
            Self::from_csv_reader(file, has_headers)
        }

        /// Write the dataset as CSV; missing cells become empty fields.
        pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
            let mut csv_writer = csv::Writer::from_writer(writer);
            if let Some(names) = &self.column_names {
                csv_writer.write_record(names)?;
            }
            for row in &self.rows {
                csv_writer.write_record(row.iter().map(|v| match v {
                    v if v.is_missing() => String::new(),
                    other => other.to_string(),
                }))?;
            }
            csv_writer.flush()?;
            Ok(())
        }
    }
}
