//! Accuracy-type metrics used to score models during importance estimation.
//!
//! Loss metrics ([`smape`], [`cross_entropy`], [`mean_squared_error`]) are
//! lower-is-better; [`accuracy`] is higher-is-better.

use crate::core::constants::PROBABILITY_EPSILON;
use crate::core::error::{ImputeError, Result};
use ndarray::{ArrayView1, ArrayView2};

fn check_lengths(predictions: usize, targets: usize) -> Result<()> {
    if predictions != targets {
        return Err(ImputeError::invalid_parameter(
            "predictions",
            format!("length {} != targets length {}", predictions, targets),
            "predictions and targets must have the same length",
        ));
    }
    Ok(())
}

/// Symmetric mean absolute percentage error, in percent.
///
/// Pairs where both prediction and target are zero contribute nothing.
pub fn smape(predictions: &ArrayView1<'_, f64>, targets: &ArrayView1<'_, f64>) -> Result<f64> {
    check_lengths(predictions.len(), targets.len())?;
    let n = predictions.len();
    if n == 0 {
        return Ok(0.0);
    }

    let mut sum = 0.0;
    for (&pred, &target) in predictions.iter().zip(targets.iter()) {
        let denominator = (pred.abs() + target.abs()) / 2.0;
        if denominator != 0.0 {
            sum += (pred - target).abs() / denominator;
        }
    }
    Ok(sum / n as f64 * 100.0)
}

/// Mean squared error.
pub fn mean_squared_error(predictions: &ArrayView1<'_, f64>, targets: &ArrayView1<'_, f64>) -> Result<f64> {
    check_lengths(predictions.len(), targets.len())?;
    if predictions.is_empty() {
        return Ok(0.0);
    }
    let sum: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(&pred, &target)| (pred - target).powi(2))
        .sum();
    Ok(sum / predictions.len() as f64)
}

/// Fraction of predicted codes equal to the target codes.
pub fn accuracy(predictions: &ArrayView1<'_, f64>, targets: &ArrayView1<'_, f64>) -> Result<f64> {
    check_lengths(predictions.len(), targets.len())?;
    if predictions.is_empty() {
        return Ok(0.0);
    }
    let correct = predictions
        .iter()
        .zip(targets.iter())
        .filter(|(&pred, &target)| pred.round() == target.round())
        .count();
    Ok(correct as f64 / predictions.len() as f64)
}

/// Mean negative log-probability of the true class.
///
/// `probabilities` is rows × classes; a target code outside the class range
/// is scored with the probability floor.
pub fn cross_entropy(probabilities: &ArrayView2<'_, f64>, targets: &ArrayView1<'_, f64>) -> Result<f64> {
    check_lengths(probabilities.nrows(), targets.len())?;
    if targets.is_empty() {
        return Ok(0.0);
    }

    let num_classes = probabilities.ncols();
    let mut loss = 0.0;
    for (row, &target) in probabilities.rows().into_iter().zip(targets.iter()) {
        let class = target.round();
        let p = if class >= 0.0 && (class as usize) < num_classes {
            row[class as usize]
        } else {
            0.0
        };
        loss -= p.max(PROBABILITY_EPSILON).ln();
    }
    Ok(loss / targets.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_smape() {
        let pred = array![1.0, 2.0, 0.0];
        let target = array![1.0, 4.0, 0.0];
        // |2-4| / 3 = 2/3 over 3 samples
        assert_abs_diff_eq!(smape(&pred.view(), &target.view()).unwrap(), 200.0 / 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_accuracy() {
        let pred = array![0.0, 1.0, 2.0, 1.0];
        let target = array![0.0, 1.0, 1.0, 1.0];
        assert_abs_diff_eq!(accuracy(&pred.view(), &target.view()).unwrap(), 0.75);
    }

    #[test]
    fn test_cross_entropy() {
        let proba = array![[0.5, 0.5], [1.0, 0.0]];
        let target = array![0.0, 0.0];
        let ce = cross_entropy(&proba.view(), &target.view()).unwrap();
        assert_abs_diff_eq!(ce, -(0.5f64.ln()) / 2.0, epsilon = 1e-12);

        let target = array![0.0, 1.0];
        let ce = cross_entropy(&proba.view(), &target.view()).unwrap();
        assert!(ce.is_finite());
        assert!(ce > 10.0);
    }

    #[test]
    fn test_mse_and_length_mismatch() {
        let pred = array![1.0, 3.0];
        let target = array![1.0, 1.0];
        assert_abs_diff_eq!(mean_squared_error(&pred.view(), &target.view()).unwrap(), 2.0);
        assert!(smape(&pred.view(), &array![1.0].view()).is_err());
    }
}
