//! Core data types for mice-impute.
//!
//! Cells of the raw dataset are [`Value`]s. Everything the models see is an
//! encoded `f64`; the conversion between the two lives in the encoder.

use crate::core::error::{ImputeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row index into the dataset.
pub type RowIndex = usize;

/// Column index into the dataset.
pub type ColumnIndex = usize;

/// A single cell of the raw dataset.
///
/// Deserializes untagged, so a JSON `null` becomes [`Value::Missing`], numbers
/// become [`Value::Number`] and strings become [`Value::Text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Numeric cell
    Number(f64),
    /// Text cell
    Text(String),
    /// Missing cell
    #[default]
    Missing,
}

impl Value {
    /// Whether this cell counts as missing.
    ///
    /// `Missing`, the empty string and NaN are all missing markers.
    #[inline]
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Text(s) => s.is_empty(),
            Value::Number(v) => v.is_nan(),
        }
    }

    /// Numeric payload, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Hashable identity of an observed value, `None` for missing markers.
    pub fn key(&self) -> Option<ValueKey> {
        if self.is_missing() {
            return None;
        }
        match self {
            // -0.0 and 0.0 are the same label
            Value::Number(v) => Some(ValueKey::Number(if *v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })),
            Value::Text(s) => Some(ValueKey::Text(s.clone())),
            Value::Missing => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => write!(f, "null"),
        }
    }
}

/// Hashable identity of an observed cell, used for counting and encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    /// Bit pattern of a finite number
    Number(u64),
    /// Text label
    Text(String),
}

/// Column type assigned once per column at the start of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Numeric column, imputed with regressors
    Regression,
    /// Categorical column, imputed with classifiers
    Classification,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Regression => f.pad("regression"),
            ColumnType::Classification => f.pad("classification"),
        }
    }
}

impl ColumnType {
    /// Parse a detector tag for the given column.
    pub fn from_tag(column: ColumnIndex, tag: &str) -> Result<Self> {
        tag.parse()
            .map_err(|_| ImputeError::unsupported_type(column, tag))
    }
}

impl FromStr for ColumnType {
    type Err = ImputeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "regression" | "numeric" => Ok(ColumnType::Regression),
            "classification" | "categorical" => Ok(ColumnType::Classification),
            other => Err(ImputeError::unsupported_type(0, other)),
        }
    }
}

/// Model family used for the per-column models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Random forest regressor / classifier
    #[serde(alias = "rf")]
    TreeEnsemble,
    /// Linear regression for numeric columns, logistic regression for categorical ones
    #[serde(alias = "lr")]
    Linear,
    /// No model: single-shot mean/mode imputation
    None,
}

impl Default for ModelFamily {
    fn default() -> Self {
        ModelFamily::TreeEnsemble
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFamily::TreeEnsemble => write!(f, "tree_ensemble"),
            ModelFamily::Linear => write!(f, "linear"),
            ModelFamily::None => write!(f, "none"),
        }
    }
}

impl FromStr for ModelFamily {
    type Err = ImputeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tree_ensemble" | "rf" | "forest" => Ok(ModelFamily::TreeEnsemble),
            "linear" | "lr" => Ok(ModelFamily::Linear),
            "none" | "" => Ok(ModelFamily::None),
            other => Err(ImputeError::invalid_parameter(
                "model_family",
                other,
                "expected tree_ensemble, linear or none",
            )),
        }
    }
}

/// Metric driving permutation importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceKind {
    /// Symmetric mean absolute percentage error (regression)
    Smape,
    /// Cross-entropy over predicted class probabilities
    CrossEntropy,
    /// Classification accuracy
    Accuracy,
}

impl ImportanceKind {
    /// Metric used for a column of the given type under the given family.
    pub fn for_column(column_type: ColumnType, family: ModelFamily) -> Self {
        match (column_type, family) {
            (ColumnType::Regression, _) => ImportanceKind::Smape,
            (ColumnType::Classification, ModelFamily::Linear) => ImportanceKind::Accuracy,
            (ColumnType::Classification, _) => ImportanceKind::CrossEntropy,
        }
    }

    /// Whether larger metric values mean a better fit.
    pub fn higher_is_better(&self) -> bool {
        matches!(self, ImportanceKind::Accuracy)
    }
}

impl fmt::Display for ImportanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportanceKind::Smape => write!(f, "smape"),
            ImportanceKind::CrossEntropy => write!(f, "ce"),
            ImportanceKind::Accuracy => write!(f, "accuracy"),
        }
    }
}

/// Feature-sampling strategy for tree-ensemble splits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// sqrt(p) for classification, p/3 for regression
    Auto,
    /// Square root of the predictor count
    Sqrt,
    /// Log2 of the predictor count
    Log2,
    /// Fraction of the predictor count
    Fraction(f64),
    /// Fixed number of predictors
    Fixed(usize),
    /// Every predictor
    All,
}

impl Default for MaxFeatures {
    fn default() -> Self {
        MaxFeatures::Auto
    }
}

impl MaxFeatures {
    /// Number of predictors to try at each split, at least 1 when any exist.
    pub fn resolve(&self, n_features: usize, column_type: ColumnType) -> usize {
        if n_features == 0 {
            return 0;
        }
        let n = n_features as f64;
        let count = match self {
            MaxFeatures::Auto => match column_type {
                ColumnType::Classification => n.sqrt().ceil() as usize,
                ColumnType::Regression => (n / 3.0).ceil() as usize,
            },
            MaxFeatures::Sqrt => n.sqrt().ceil() as usize,
            MaxFeatures::Log2 => n.log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n * f).ceil() as usize,
            MaxFeatures::Fixed(k) => *k,
            MaxFeatures::All => n_features,
        };
        count.clamp(1, n_features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_markers() {
        assert!(Value::Missing.is_missing());
        assert!(Value::Text(String::new()).is_missing());
        assert!(Value::Number(f64::NAN).is_missing());
        assert!(!Value::Number(0.0).is_missing());
        assert!(!Value::from("a").is_missing());
    }

    #[test]
    fn test_value_json() {
        let row: Vec<Value> = serde_json::from_str(r#"[1.5, "a", null, ""]"#).unwrap();
        assert_eq!(row[0], Value::Number(1.5));
        assert_eq!(row[1], Value::from("a"));
        assert_eq!(row[2], Value::Missing);
        assert!(row[3].is_missing());
        assert_eq!(serde_json::to_string(&Value::Missing).unwrap(), "null");
    }

    #[test]
    fn test_value_keys() {
        assert_eq!(Value::Number(0.0).key(), Value::Number(-0.0).key());
        assert_ne!(Value::Number(1.0).key(), Value::from("1").key());
        assert_eq!(Value::Missing.key(), None);
    }

    #[test]
    fn test_column_type_tags() {
        assert_eq!(ColumnType::from_tag(0, "regression").unwrap(), ColumnType::Regression);
        assert_eq!(ColumnType::from_tag(0, "classification").unwrap(), ColumnType::Classification);
        let err = ColumnType::from_tag(3, "ordinal").unwrap_err();
        assert!(matches!(err, ImputeError::UnsupportedType { column: 3, .. }));
    }

    #[test]
    fn test_model_family_parsing() {
        assert_eq!("rf".parse::<ModelFamily>().unwrap(), ModelFamily::TreeEnsemble);
        assert_eq!("lr".parse::<ModelFamily>().unwrap(), ModelFamily::Linear);
        assert_eq!("none".parse::<ModelFamily>().unwrap(), ModelFamily::None);
        assert!("svm".parse::<ModelFamily>().is_err());
    }

    #[test]
    fn test_importance_kind_selection() {
        assert_eq!(
            ImportanceKind::for_column(ColumnType::Regression, ModelFamily::Linear),
            ImportanceKind::Smape
        );
        assert_eq!(
            ImportanceKind::for_column(ColumnType::Classification, ModelFamily::Linear),
            ImportanceKind::Accuracy
        );
        assert_eq!(
            ImportanceKind::for_column(ColumnType::Classification, ModelFamily::TreeEnsemble),
            ImportanceKind::CrossEntropy
        );
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Auto.resolve(9, ColumnType::Classification), 3);
        assert_eq!(MaxFeatures::Auto.resolve(9, ColumnType::Regression), 3);
        assert_eq!(MaxFeatures::Fixed(20).resolve(4, ColumnType::Regression), 4);
        assert_eq!(MaxFeatures::Fraction(0.01).resolve(4, ColumnType::Regression), 1);
        assert_eq!(MaxFeatures::All.resolve(0, ColumnType::Regression), 0);
    }
}
