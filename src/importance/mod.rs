//! Permutation feature importance.
//!
//! A predictor's importance is how much the model's score degrades when that
//! predictor's column is shuffled, averaged over several shuffles. Shuffles
//! are drawn from a seeded RNG so the scores are reproducible.

use crate::core::constants::DEFAULT_IMPORTANCE_REPEATS;
use crate::core::error::{ImputeError, Result};
use crate::core::traits::TrainedModel;
use crate::core::types::*;
use crate::metrics;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Settings for [`permutation_importance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceOptions {
    /// Number of shuffles averaged per predictor
    pub repeats: usize,
    /// Divide by the maximum absolute importance when it is non-zero
    pub scale: bool,
    /// Seed for the shuffles
    pub seed: u64,
}

impl Default for ImportanceOptions {
    fn default() -> Self {
        Self {
            repeats: DEFAULT_IMPORTANCE_REPEATS,
            scale: false,
            seed: 0,
        }
    }
}

/// Score `model` on `(x, y)` with the metric behind `kind`.
pub fn score_model<M: TrainedModel + ?Sized>(
    model: &M,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    kind: ImportanceKind,
) -> Result<f64> {
    match kind {
        ImportanceKind::Smape => {
            let predictions = model.predict(x)?;
            metrics::smape(&predictions.view(), &y)
        }
        ImportanceKind::Accuracy => {
            let predictions = model.predict(x)?;
            metrics::accuracy(&predictions.view(), &y)
        }
        ImportanceKind::CrossEntropy => {
            let probabilities = model.predict_proba(x)?.ok_or_else(|| {
                ImputeError::internal("cross-entropy importance requires class probabilities")
            })?;
            metrics::cross_entropy(&probabilities.view(), &y)
        }
    }
}

/// Permutation importance of every predictor column of `x`.
///
/// The result has one entry per column of `x`. Positive values mean the
/// model got worse when the column was shuffled.
pub fn permutation_importance<M: TrainedModel + ?Sized>(
    model: &M,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    kind: ImportanceKind,
    options: &ImportanceOptions,
) -> Result<Array1<f64>> {
    let num_features = x.ncols();
    if x.nrows() != y.len() {
        return Err(ImputeError::invalid_parameter(
            "y",
            format!("length {}", y.len()),
            format!("must match the {} rows of x", x.nrows()),
        ));
    }
    if num_features == 0 || x.nrows() == 0 {
        return Ok(Array1::zeros(num_features));
    }

    let baseline = score_model(model, x, y, kind)?;
    let repeats = options.repeats.max(1);
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut permuted = x.to_owned();
    let mut importance = Array1::zeros(num_features);

    for feature_idx in 0..num_features {
        let original: Vec<f64> = x.column(feature_idx).to_vec();
        let mut shuffled = original.clone();
        let mut total = 0.0;

        for _ in 0..repeats {
            shuffled.shuffle(&mut rng);
            permuted
                .column_mut(feature_idx)
                .iter_mut()
                .zip(shuffled.iter())
                .for_each(|(cell, &v)| *cell = v);

            let score = score_model(model, permuted.view(), y, kind)?;
            total += if kind.higher_is_better() {
                baseline - score
            } else {
                score - baseline
            };
        }

        // Restore before moving on to the next column
        permuted
            .column_mut(feature_idx)
            .iter_mut()
            .zip(original.iter())
            .for_each(|(cell, &v)| *cell = v);

        importance[feature_idx] = total / repeats as f64;
    }

    if options.scale {
        scale_importance(&mut importance);
    }

    Ok(importance)
}

/// Divide by the maximum absolute value; leaves an all-zero vector unchanged.
pub fn scale_importance(importance: &mut Array1<f64>) {
    let max_abs = importance.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if max_abs > 0.0 {
        importance.mapv_inplace(|v| v / max_abs);
    }
}

/// Widen a predictor-importance vector to full column width by inserting the
/// `None` sentinel at the target column.
pub fn with_sentinel(importance: &Array1<f64>, target: ColumnIndex) -> Vec<Option<f64>> {
    let mut full: Vec<Option<f64>> = importance.iter().map(|&v| Some(v)).collect();
    full.insert(target.min(full.len()), None);
    full
}
