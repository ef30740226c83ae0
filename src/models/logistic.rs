//! One-vs-rest logistic regression for categorical columns.
//!
//! Each class gets a binary model trained with full-batch gradient descent
//! on standardized predictors. Prediction picks the class whose model is
//! most confident; probabilities are the per-class scores normalized to sum
//! to one.

use super::forest::argmax;
use super::{check_prediction_input, check_training_input, class_count};
use crate::config::LogisticParams;
use crate::core::error::Result;
use crate::core::traits::{ModelAdapter, TrainedModel};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

#[inline]
fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic-regression binding.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    params: LogisticParams,
}

impl LogisticRegression {
    /// Create a binding with the given optimizer settings
    pub fn new(params: LogisticParams) -> Self {
        Self { params }
    }

    /// Train and return the concrete model type
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<LogisticModel> {
        check_training_input(&x, &y)?;
        let num_classes = class_count(&y)?;
        let num_features = x.ncols();
        let n_samples = x.nrows() as f64;

        let mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(num_features));
        let std = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 0.0 { s } else { 1.0 });
        let z = (&x - &mean.view().insert_axis(Axis(0))) / &std.view().insert_axis(Axis(0));

        let mut weights = Array2::zeros((num_classes, num_features));
        let mut biases = Array1::zeros(num_classes);

        for class in 0..num_classes {
            let targets = y.mapv(|v| if v.round() as usize == class { 1.0 } else { 0.0 });
            let mut w = Array1::<f64>::zeros(num_features);
            let mut b = 0.0;

            for _ in 0..self.params.num_steps {
                let errors = (z.dot(&w) + b).mapv(sigmoid) - &targets;
                let dw = z.t().dot(&errors) / n_samples;
                let db = errors.sum() / n_samples;
                w.scaled_add(-self.params.learning_rate, &dw);
                b -= self.params.learning_rate * db;
            }

            weights.row_mut(class).assign(&w);
            biases[class] = b;
        }

        Ok(LogisticModel {
            weights,
            biases,
            mean,
            std,
        })
    }
}

impl ModelAdapter for LogisticRegression {
    fn train(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<Box<dyn TrainedModel>> {
        Ok(Box::new(self.fit(x, y)?))
    }

    fn name(&self) -> &'static str {
        "logistic_regression"
    }
}

/// Fitted one-vs-rest model.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    /// classes × features, on the standardized scale
    weights: Array2<f64>,
    biases: Array1<f64>,
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl LogisticModel {
    /// Number of classes the model scores
    pub fn num_classes(&self) -> usize {
        self.biases.len()
    }

    /// Per-class sigmoid scores, rows × classes
    fn scores(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let z = (&x - &self.mean.view().insert_axis(Axis(0))) / &self.std.view().insert_axis(Axis(0));
        (z.dot(&self.weights.t()) + &self.biases.view().insert_axis(Axis(0))).mapv(sigmoid)
    }
}

impl TrainedModel for LogisticModel {
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        check_prediction_input(&x, self.num_features())?;
        Ok(self
            .scores(x)
            .outer_iter()
            .map(|row| argmax(row.iter().copied()) as f64)
            .collect())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Option<Array2<f64>>> {
        check_prediction_input(&x, self.num_features())?;
        let mut scores = self.scores(x);
        let num_classes = self.num_classes() as f64;
        for mut row in scores.outer_iter_mut() {
            let total = row.sum();
            if total > 0.0 {
                row.mapv_inplace(|v| v / total);
            } else {
                row.fill(1.0 / num_classes);
            }
        }
        Ok(Some(scores))
    }

    fn num_features(&self) -> usize {
        self.mean.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ImputeError;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 * 10.0 } else { 1.0 });
        let y = x.column(0).mapv(|v| if v < 200.0 { 0.0 } else { 1.0 });
        (x, y)
    }

    #[test]
    fn test_binary_separation() {
        let (x, y) = separable();
        let model = LogisticRegression::new(LogisticParams::default()).fit(x.view(), y.view()).unwrap();
        let pred = model.predict(array![[0.0, 1.0], [390.0, 1.0]].view()).unwrap();
        assert_eq!(pred.to_vec(), vec![0.0, 1.0]);

        let proba = model.predict_proba(x.view()).unwrap().unwrap();
        assert_eq!(proba.dim(), (40, 2));
        for row in proba.outer_iter() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_three_classes() {
        let x = Array2::from_shape_fn((60, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| (v / 20.0).floor());
        let params = LogisticParams {
            num_steps: 2000,
            learning_rate: 0.5,
        };
        let model = LogisticRegression::new(params).fit(x.view(), y.view()).unwrap();
        assert_eq!(model.num_classes(), 3);
        let pred = model.predict(array![[1.0], [58.0]].view()).unwrap();
        assert_eq!(pred.to_vec(), vec![0.0, 2.0]);
    }

    #[test]
    fn test_single_class() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 0.0];
        let model = LogisticRegression::new(LogisticParams::default()).fit(x.view(), y.view()).unwrap();
        assert_eq!(model.predict(x.view()).unwrap().to_vec(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let model = LogisticRegression::new(LogisticParams::default());
        assert!(matches!(
            model.fit(array![[1.0]].view(), array![0.5].view()),
            Err(ImputeError::ModelTraining { .. })
        ));
        let fitted = model.fit(array![[1.0], [2.0]].view(), array![0.0, 1.0].view()).unwrap();
        assert!(matches!(
            fitted.predict(array![[1.0, 1.0]].view()),
            Err(ImputeError::ModelPrediction { .. })
        ));
    }
}
