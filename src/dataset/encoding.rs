//! Categorical label ↔ integer code mapping.
//!
//! Encodings are fitted once, from the fallback-completed matrix, before any
//! model is trained. Codes follow first-seen row order.

use crate::core::error::{ImputeError, Result};
use crate::core::types::*;
use ndarray::Array2;
use serde::Serialize;
use std::collections::HashMap;

/// Bijection between the distinct labels of one column and `0..k`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encoding {
    labels: Vec<Value>,
    #[serde(skip)]
    codes: HashMap<ValueKey, usize>,
}

impl Encoding {
    /// Fit from observed cells; missing markers are skipped.
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut labels = Vec::new();
        let mut codes = HashMap::new();
        for value in values {
            if let Some(key) = value.key() {
                codes.entry(key).or_insert_with(|| {
                    labels.push(value.clone());
                    labels.len() - 1
                });
            }
        }
        Encoding { labels, codes }
    }

    /// Code of a label, if it was seen during fitting
    pub fn code(&self, label: &Value) -> Option<usize> {
        label.key().and_then(|key| self.codes.get(&key).copied())
    }

    /// Label of a code
    pub fn label(&self, code: usize) -> Option<&Value> {
        self.labels.get(code)
    }

    /// Labels in code order
    pub fn labels(&self) -> &[Value] {
        &self.labels
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no label was seen
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Per-column encodings; `None` for numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalEncoder {
    encodings: Vec<Option<Encoding>>,
}

impl CategoricalEncoder {
    /// Fit encodings on a fully observed matrix and return it encoded.
    pub fn fit(matrix: &[Vec<Value>], types: &[ColumnType]) -> Result<(Array2<f64>, Self)> {
        let num_rows = matrix.len();
        let num_columns = types.len();
        if let Some((row_idx, row)) = matrix.iter().enumerate().find(|(_, row)| row.len() != num_columns) {
            return Err(ImputeError::invalid_input(format!(
                "row {} has {} cells, expected {}",
                row_idx,
                row.len(),
                num_columns
            )));
        }

        let encodings = types
            .iter()
            .enumerate()
            .map(|(col, column_type)| match column_type {
                ColumnType::Classification => Some(Encoding::fit(matrix.iter().map(|row| &row[col]))),
                ColumnType::Regression => None,
            })
            .collect();
        let encoder = CategoricalEncoder { encodings };

        let mut cells = Vec::with_capacity(num_rows * num_columns);
        for (row_idx, row) in matrix.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                if value.is_missing() {
                    return Err(ImputeError::internal(format!(
                        "base matrix has a missing cell at row {}, column {}",
                        row_idx, col
                    )));
                }
                cells.push(encoder.encode_label(col, value)?);
            }
        }

        let encoded = Array2::from_shape_vec((num_rows, num_columns), cells)
            .map_err(|e| ImputeError::internal(format!("failed to shape encoded matrix: {}", e)))?;
        Ok((encoded, encoder))
    }

    /// Encoded form of a label.
    pub fn encode_label(&self, column: ColumnIndex, label: &Value) -> Result<f64> {
        match self.encoding(column) {
            Some(encoding) => encoding
                .code(label)
                .map(|code| code as f64)
                .ok_or_else(|| ImputeError::unknown_label(column, label.to_string())),
            None => match label {
                Value::Number(v) if v.is_finite() => Ok(*v),
                other => Err(ImputeError::invalid_input(format!(
                    "column {} is numeric but contains '{}'",
                    column, other
                ))),
            },
        }
    }

    /// Label for an encoded value. Classifier outputs are rounded to the
    /// nearest code; numeric columns pass through.
    pub fn decode(&self, column: ColumnIndex, code: f64) -> Result<Value> {
        match self.encoding(column) {
            Some(encoding) => {
                let rounded = code.round();
                if !rounded.is_finite() || rounded < 0.0 {
                    return Err(ImputeError::unknown_label(column, code.to_string()));
                }
                encoding
                    .label(rounded as usize)
                    .cloned()
                    .ok_or_else(|| ImputeError::unknown_label(column, code.to_string()))
            }
            None => Ok(Value::Number(code)),
        }
    }

    /// Encoding of a column, `None` for numeric or out-of-range columns
    pub fn encoding(&self, column: ColumnIndex) -> Option<&Encoding> {
        self.encodings.get(column).and_then(Option::as_ref)
    }

    /// Labels of a categorical column in code order
    pub fn labels(&self, column: ColumnIndex) -> Option<&[Value]> {
        self.encoding(column).map(Encoding::labels)
    }

    /// Number of classes of a categorical column
    pub fn num_classes(&self, column: ColumnIndex) -> Option<usize> {
        self.encoding(column).map(Encoding::len)
    }

    /// Whether the column is categorical
    pub fn is_categorical(&self, column: ColumnIndex) -> bool {
        self.encoding(column).is_some()
    }

    /// Number of columns covered
    pub fn num_columns(&self) -> usize {
        self.encodings.len()
    }
}
