//! Model bindings for the per-column train/predict cycle.
//!
//! | family         | regression          | classification             |
//! |----------------|---------------------|----------------------------|
//! | `TreeEnsemble` | [`RandomForest`]    | [`RandomForest`] (votes)   |
//! | `Linear`       | [`LinearRegression`]| [`LogisticRegression`]     |
//! | `None`         | no model            | no model                   |
//!
//! Dispatch on family and column type happens in [`adapter_for`] only.

pub mod forest;
pub mod linear;
pub mod logistic;

pub use forest::{DecisionTree, RandomForest, RandomForestModel};
pub use linear::{LinearModel, LinearRegression};
pub use logistic::{LogisticModel, LogisticRegression};

use crate::config::ImputeConfig;
use crate::core::error::Result;
use crate::{ensure, prediction_error, training_error};
use crate::core::traits::ModelAdapter;
use crate::core::types::*;
use ndarray::{ArrayView1, ArrayView2};

/// Adapter for `family` bound to `column_type`, or `None` when the family
/// trains no models.
pub fn adapter_for(
    family: ModelFamily,
    column_type: ColumnType,
    config: &ImputeConfig,
    seed: u64,
) -> Option<Box<dyn ModelAdapter>> {
    match (family, column_type) {
        (ModelFamily::TreeEnsemble, _) => Some(Box::new(RandomForest::new(
            config.forest.clone(),
            column_type,
            seed,
        ))),
        (ModelFamily::Linear, ColumnType::Regression) => Some(Box::new(LinearRegression::new())),
        (ModelFamily::Linear, ColumnType::Classification) => {
            Some(Box::new(LogisticRegression::new(config.logistic.clone())))
        }
        (ModelFamily::None, _) => None,
    }
}

/// Shared training-input checks: at least one row, matching lengths and
/// finite values.
pub(crate) fn check_training_input(x: &ArrayView2<'_, f64>, y: &ArrayView1<'_, f64>) -> Result<()> {
    ensure!(x.nrows() > 0, training_error!("no training rows"));
    ensure!(
        x.nrows() == y.len(),
        training_error!("x has {} rows but y has {} values", x.nrows(), y.len())
    );
    ensure!(
        x.iter().all(|v| v.is_finite()),
        training_error!("non-finite value in training predictors")
    );
    ensure!(
        y.iter().all(|v| v.is_finite()),
        training_error!("non-finite value in training targets")
    );
    Ok(())
}

/// Shared prediction-input checks: predictor width and finite values.
pub(crate) fn check_prediction_input(x: &ArrayView2<'_, f64>, num_features: usize) -> Result<()> {
    ensure!(
        x.ncols() == num_features,
        prediction_error!("model expects {} predictors, got {}", num_features, x.ncols())
    );
    ensure!(
        x.iter().all(|v| v.is_finite()),
        prediction_error!("non-finite value in prediction input")
    );
    Ok(())
}

/// Number of classes implied by encoded targets (largest code + 1).
pub(crate) fn class_count(y: &ArrayView1<'_, f64>) -> Result<usize> {
    let mut max_code = 0usize;
    for &v in y.iter() {
        let code = v.round();
        ensure!(
            code >= 0.0 && (code - v).abs() <= 1e-9,
            training_error!("classification target {} is not a class code", v)
        );
        max_code = max_code.max(code as usize);
    }
    Ok(max_code + 1)
}
