//! Per-column summaries: missing rows, column type and fallback value.

use crate::core::error::{ImputeError, Result};
use crate::core::traits::ColumnTypeDetector;
use crate::core::types::*;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::HashSet;

/// What the engine needs to know about one raw column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    /// Detected column type
    pub column_type: ColumnType,
    /// Mean (regression) or mode (classification) of the observed values
    pub fallback: Value,
    /// Rows whose original value is missing, ascending
    pub missing_rows: Vec<RowIndex>,
}

impl ColumnSummary {
    /// Number of originally missing rows
    pub fn missing_count(&self) -> usize {
        self.missing_rows.len()
    }
}

/// Computes [`ColumnSummary`]s, delegating type detection.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSummarizer<'a> {
    detector: &'a dyn ColumnTypeDetector,
}

impl<'a> ColumnSummarizer<'a> {
    /// Create a summarizer around a type detector
    pub fn new(detector: &'a dyn ColumnTypeDetector) -> Self {
        Self { detector }
    }

    /// Summarize one column given its cells in row order.
    pub fn summarize(&self, column: ColumnIndex, values: &[&Value]) -> Result<ColumnSummary> {
        let missing_rows = missing_rows(values);
        if missing_rows.len() == values.len() {
            return Err(ImputeError::empty_column(column));
        }

        let column_type = self.detector.detect(column, values)?;
        let fallback = match column_type {
            ColumnType::Regression => Value::Number(mean(column, values)?),
            ColumnType::Classification => mode(column, values)?,
        };

        Ok(ColumnSummary {
            column_type,
            fallback,
            missing_rows,
        })
    }
}

/// Row indices of missing cells, in row order.
pub fn missing_rows(values: &[&Value]) -> Vec<RowIndex> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_missing())
        .map(|(row, _)| row)
        .collect()
}

/// Arithmetic mean of the observed values.
///
/// Averages over the observed count only; a text value in a numeric column
/// is an input error. Kept as a running mean so large finite values do not
/// overflow a sum.
pub fn mean(column: ColumnIndex, values: &[&Value]) -> Result<f64> {
    let mut mean = 0.0;
    let mut count = 0usize;
    for value in values.iter().filter(|v| !v.is_missing()) {
        match value {
            Value::Number(v) => {
                count += 1;
                mean += (v - mean) / count as f64;
            }
            other => {
                return Err(ImputeError::invalid_input(format!(
                    "column {} is numeric but contains '{}'",
                    column, other
                )))
            }
        }
    }
    if count == 0 {
        return Err(ImputeError::empty_column(column));
    }
    Ok(mean)
}

/// Most frequent observed value.
///
/// One pass over the rows; on ties the value that reached the winning count
/// first wins.
pub fn mode(column: ColumnIndex, values: &[&Value]) -> Result<Value> {
    let mut counts: HashMap<ValueKey, usize> = HashMap::new();
    let mut best: Option<(&Value, usize)> = None;

    for value in values.iter().copied() {
        let Some(key) = value.key() else { continue };
        let count = counts.entry(key).or_insert(0);
        *count += 1;
        if best.map_or(true, |(_, best_count)| *count > best_count) {
            best = Some((value, *count));
        }
    }

    best.map(|(value, _)| value.clone())
        .ok_or_else(|| ImputeError::empty_column(column))
}

/// Text anywhere makes a column categorical; so does a numeric column with
/// at most `max_numeric_classes` distinct observed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultTypeDetector {
    /// Largest distinct-value count treated as categorical for numbers
    pub max_numeric_classes: usize,
}

impl Default for DefaultTypeDetector {
    fn default() -> Self {
        Self {
            max_numeric_classes: 2,
        }
    }
}

impl ColumnTypeDetector for DefaultTypeDetector {
    fn detect(&self, _column: ColumnIndex, values: &[&Value]) -> Result<ColumnType> {
        let mut distinct = HashSet::new();
        for value in values.iter().filter(|v| !v.is_missing()) {
            if matches!(value, Value::Text(_)) {
                return Ok(ColumnType::Classification);
            }
            if let Some(key) = value.key() {
                distinct.insert(key);
            }
        }
        if distinct.len() <= self.max_numeric_classes {
            Ok(ColumnType::Classification)
        } else {
            Ok(ColumnType::Regression)
        }
    }
}

/// Adapts a tag-producing classifier (`"regression"` / `"classification"`).
///
/// Any other tag fails with [`ImputeError::UnsupportedType`].
pub struct TagDetector<F> {
    classify: F,
}

impl<F> TagDetector<F>
where
    F: Fn(&[&Value]) -> String + Send + Sync,
{
    /// Wrap a tagging function
    pub fn new(classify: F) -> Self {
        Self { classify }
    }
}

impl<F> std::fmt::Debug for TagDetector<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagDetector").finish_non_exhaustive()
    }
}

impl<F> ColumnTypeDetector for TagDetector<F>
where
    F: Fn(&[&Value]) -> String + Send + Sync,
{
    fn detect(&self, column: ColumnIndex, values: &[&Value]) -> Result<ColumnType> {
        let tag = (self.classify)(values);
        ColumnType::from_tag(column, &tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cells(values: &[Value]) -> Vec<&Value> {
        values.iter().collect()
    }

    #[test]
    fn test_mean_ignores_missing() {
        let col = vec![Value::from(1.0), Value::from(2.0), Value::Missing, Value::from(3.0)];
        assert_abs_diff_eq!(mean(0, &cells(&col)).unwrap(), 2.0);
    }

    #[test]
    fn test_mean_of_large_values_stays_finite() {
        let col = vec![Value::from(1.5e308), Value::from(1.7e308), Value::Missing, Value::from(1.6e308)];
        let m = mean(0, &cells(&col)).unwrap();
        assert!(m.is_finite());
        assert_abs_diff_eq!(m / 1e308, 1.6, epsilon = 1e-9);
    }

    #[test]
    fn test_mean_rejects_text() {
        let col = vec![Value::from(1.0), Value::from("x")];
        assert!(matches!(mean(0, &cells(&col)), Err(ImputeError::InvalidInput { .. })));
    }

    #[test]
    fn test_mode_basic() {
        let col = vec![Value::from("a"), Value::from("a"), Value::from("b"), Value::Missing];
        assert_eq!(mode(0, &cells(&col)).unwrap(), Value::from("a"));
    }

    #[test]
    fn test_mode_tie_goes_to_first_to_reach_max() {
        // a reaches 2 at row 2, b only at row 3
        let col = vec![Value::from("b"), Value::from("a"), Value::from("a"), Value::from("b")];
        assert_eq!(mode(0, &cells(&col)).unwrap(), Value::from("a"));

        let col = vec![Value::from("x"), Value::from("y")];
        assert_eq!(mode(0, &cells(&col)).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_mode_long_column() {
        let mut col: Vec<Value> = (0..200_000).map(|i| Value::from((i % 3) as f64)).collect();
        col.push(Value::from(2.0));
        assert_eq!(mode(0, &cells(&col)).unwrap(), Value::from(0.0));
    }

    #[test]
    fn test_missing_rows_in_order() {
        let col = vec![Value::Missing, Value::from(1.0), Value::from(""), Value::from(f64::NAN)];
        assert_eq!(missing_rows(&cells(&col)), vec![0, 2, 3]);
    }

    #[test]
    fn test_default_detector() {
        let detector = DefaultTypeDetector::default();
        let numeric = vec![Value::from(1.0), Value::from(2.5), Value::from(3.0), Value::Missing];
        assert_eq!(detector.detect(0, &cells(&numeric)).unwrap(), ColumnType::Regression);

        let text = vec![Value::from(1.0), Value::from("b"), Value::from(3.0)];
        assert_eq!(detector.detect(0, &cells(&text)).unwrap(), ColumnType::Classification);

        let binary = vec![Value::from(0.0), Value::from(1.0), Value::from(1.0)];
        assert_eq!(detector.detect(0, &cells(&binary)).unwrap(), ColumnType::Classification);
    }

    #[test]
    fn test_summarize() {
        let detector = DefaultTypeDetector::default();
        let summarizer = ColumnSummarizer::new(&detector);
        let col = vec![Value::from(1.0), Value::from(2.0), Value::Missing, Value::from(3.0)];
        let summary = summarizer.summarize(0, &cells(&col)).unwrap();
        assert_eq!(summary.column_type, ColumnType::Regression);
        assert_eq!(summary.fallback, Value::Number(2.0));
        assert_eq!(summary.missing_rows, vec![2]);
        assert_eq!(summary.missing_count(), 1);
    }

    #[test]
    fn test_summarize_empty_column() {
        let detector = DefaultTypeDetector::default();
        let summarizer = ColumnSummarizer::new(&detector);
        let col = vec![Value::Missing, Value::from("")];
        assert!(matches!(
            summarizer.summarize(4, &cells(&col)),
            Err(ImputeError::EmptyColumn { column: 4 })
        ));
    }

    #[test]
    fn test_tag_detector() {
        let detector = TagDetector::new(|_: &[&Value]| "ordinal".to_string());
        let col = vec![Value::from(1.0)];
        assert!(matches!(
            detector.detect(2, &cells(&col)),
            Err(ImputeError::UnsupportedType { column: 2, .. })
        ));

        let detector = TagDetector::new(|_: &[&Value]| "classification".to_string());
        assert_eq!(detector.detect(0, &cells(&col)).unwrap(), ColumnType::Classification);
    }
}
