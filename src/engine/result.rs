//! Output of an imputation run.

use crate::core::error::Result;
use crate::core::types::*;
use serde::Serialize;
use std::fmt::Write;

/// Importance of every predictor for one target column in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceRecord {
    /// Pass number, starting at 1
    pub pass: usize,
    /// Target column
    pub column: ColumnIndex,
    /// One entry per dataset column; `None` at the target column itself
    pub importance: Vec<Option<f64>>,
}

/// Imputed data plus the bookkeeping collected along the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputationResult {
    /// Dataset in original label space; only targeted missing cells changed
    pub data: Vec<Vec<Value>>,
    /// One record per (pass, target column), in processing order
    pub importance_matrix: Vec<ImportanceRecord>,
    /// Originally missing rows of every column
    pub missing_index: Vec<Vec<RowIndex>>,
    /// `missing_index[i].len()` for every column
    pub missing_count: Vec<usize>,
    /// Detected type of every column
    pub column_types: Vec<ColumnType>,
    /// Target columns, in processing order
    pub columns: Vec<ColumnIndex>,
    /// Passes actually run (0 for fallback-only runs)
    pub passes: usize,
}

impl ImputationResult {
    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.data.len()
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.column_types.len()
    }

    /// Cells that were missing in a target column and have been filled
    pub fn imputed_cells(&self) -> usize {
        self.columns.iter().map(|&c| self.missing_count[c]).sum()
    }

    /// Missing cells left anywhere in `data`; only non-target columns can have any
    pub fn remaining_missing(&self) -> usize {
        self.data
            .iter()
            .flat_map(|row| row.iter())
            .filter(|v| v.is_missing())
            .count()
    }

    /// Importance record for a pass and target column
    pub fn importance(&self, pass: usize, column: ColumnIndex) -> Option<&ImportanceRecord> {
        self.importance_matrix
            .iter()
            .find(|r| r.pass == pass && r.column == column)
    }

    /// Records of the last pass, in target order
    pub fn final_importance(&self) -> Vec<&ImportanceRecord> {
        self.importance_matrix
            .iter()
            .filter(|r| r.pass == self.passes)
            .collect()
    }

    /// Short human-readable report
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} rows x {} columns, {} passes, {} cells imputed, {} left missing",
            self.num_rows(),
            self.num_columns(),
            self.passes,
            self.imputed_cells(),
            self.remaining_missing()
        );
        for (column, column_type) in self.column_types.iter().enumerate() {
            let marker = if self.columns.contains(&column) { "*" } else { " " };
            let _ = writeln!(
                out,
                "{} column {:>3} {:<14} missing {}",
                marker, column, column_type, self.missing_count[column]
            );
        }
        for record in self.final_importance() {
            let cells: Vec<String> = record
                .importance
                .iter()
                .map(|v| match v {
                    Some(v) => format!("{:.4}", v),
                    None => "-".to_string(),
                })
                .collect();
            let _ = writeln!(out, "importance column {}: [{}]", record.column, cells.join(", "));
        }
        out
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
