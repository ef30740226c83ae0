//! Core trait definitions for mice-impute.
//!
//! These are the seams the engine talks through: the column-type detector,
//! the model adapters and the models they train. The engine never names a
//! concrete model type.

use crate::core::error::Result;
use crate::core::types::*;
use crate::importance::{permutation_importance, ImportanceOptions};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use std::fmt::Debug;

/// Classifies a raw column as numeric or categorical.
pub trait ColumnTypeDetector: Send + Sync + Debug {
    /// Decide the type of `column` from its values. Missing markers are
    /// included in `values`; implementations should look at observed values
    /// only.
    fn detect(&self, column: ColumnIndex, values: &[&Value]) -> Result<ColumnType>;
}

/// Factory for one model family bound to one column type.
pub trait ModelAdapter: Send + Sync + Debug {
    /// Train on `x` (m × (p-1) predictors) and `y` (length m, encoded form).
    fn train(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Box<dyn TrainedModel>>;

    /// Name of the binding, used in progress messages.
    fn name(&self) -> &'static str;
}

/// A model produced by [`ModelAdapter::train`].
pub trait TrainedModel: Send + Sync + Debug {
    /// One estimate per row of `x`, in the encoded form used for training.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>>;

    /// Class probabilities (rows × classes) for classifiers, `None` for regressors.
    fn predict_proba(&self, _x: ArrayView2<'_, f64>) -> Result<Option<Array2<f64>>> {
        Ok(None)
    }

    /// Number of predictor columns the model was trained on.
    fn num_features(&self) -> usize;

    /// Relative contribution of each predictor, length `num_features()`.
    fn importance(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        kind: ImportanceKind,
        options: &ImportanceOptions,
    ) -> Result<Array1<f64>> {
        permutation_importance(self, x, y, kind, options)
    }
}
