//! Ordinary least squares for numeric columns.
//!
//! Features and target are centred, the normal equations are solved by
//! Gaussian elimination with partial pivoting, and the intercept is recovered
//! from the means. A singular system is retried with a tiny ridge term on the
//! diagonal, which pins the coefficients of constant or collinear predictors.

use super::{check_prediction_input, check_training_input};
use crate::core::constants::LINEAR_RIDGE_EPSILON;
use crate::core::error::{ImputeError, Result};
use crate::core::traits::{ModelAdapter, TrainedModel};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Least-squares regression binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRegression;

impl LinearRegression {
    /// Create the binding
    pub fn new() -> Self {
        LinearRegression
    }

    /// Train and return the concrete model type
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<LinearModel> {
        check_training_input(&x, &y)?;
        let num_features = x.ncols();

        let x_mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(num_features));
        let y_mean = y.mean().unwrap_or(0.0);
        if num_features == 0 {
            return Ok(LinearModel {
                coefficients: Array1::zeros(0),
                intercept: y_mean,
            });
        }

        let x_centered = &x - &x_mean.view().insert_axis(Axis(0));
        let y_centered = y.mapv(|v| v - y_mean);
        let xtx = x_centered.t().dot(&x_centered);
        let xty = x_centered.t().dot(&y_centered);

        let coefficients = match solve_linear_system(xtx.clone(), xty.clone()) {
            Some(solution) => solution,
            None => {
                let scale = xtx.diag().iter().fold(1.0f64, |acc, v| acc.max(v.abs()));
                let mut ridged = xtx;
                ridged
                    .diag_mut()
                    .mapv_inplace(|v| v + LINEAR_RIDGE_EPSILON * scale);
                solve_linear_system(ridged, xty)
                    .ok_or_else(|| ImputeError::training("normal equations are singular"))?
            }
        };

        let intercept = y_mean - coefficients.dot(&x_mean);
        Ok(LinearModel {
            coefficients,
            intercept,
        })
    }
}

impl ModelAdapter for LinearRegression {
    fn train(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Box<dyn TrainedModel>> {
        Ok(Box::new(self.fit(x, y)?))
    }

    fn name(&self) -> &'static str {
        "linear_regression"
    }
}

/// Fitted linear model `y = x · coefficients + intercept`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LinearModel {
    /// Fitted coefficients
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// Fitted intercept
    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl TrainedModel for LinearModel {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        check_prediction_input(&x, self.coefficients.len())?;
        Ok(x.dot(&self.coefficients) + self.intercept)
    }

    fn num_features(&self) -> usize {
        self.coefficients.len()
    }
}

/// Solve `a · w = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when a pivot is negligible relative to the largest
/// diagonal entry.
pub(crate) fn solve_linear_system(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let tolerance = a.diag().iter().fold(0.0f64, |acc, v| acc.max(v.abs())) * 1e-12;

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot_row, col]].abs() <= tolerance {
            return None;
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut w = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * w[k]).sum();
        w[row] = (b[row] - tail) / a[[row, row]];
    }
    Some(w)
}
