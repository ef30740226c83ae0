//! Common test utilities for mice-impute integration tests.

#![allow(dead_code)]

use mice_impute::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;

/// The four-row table used throughout the docs.
pub fn small_example() -> Dataset {
    Dataset::from_values(vec![
        vec![Some(1.0), Some(2.0)],
        vec![Some(2.0), None],
        vec![None, Some(4.0)],
        vec![Some(4.0), Some(5.0)],
    ])
    .expect("valid example")
}

/// Complete mixed table: two related numeric columns, a label column driven
/// by the first one and a noise column.
pub fn mixed_rows(num_samples: usize, seed: u64) -> Vec<Vec<Value>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_samples)
        .map(|_| {
            let x0: f64 = rng.gen_range(0.0..10.0);
            let x1 = 2.0 * x0 + rng.gen_range(-0.5..0.5);
            let label = if x0 < 3.0 {
                "low"
            } else if x0 < 7.0 {
                "mid"
            } else {
                "high"
            };
            let noise: f64 = rng.gen_range(-1.0..1.0);
            vec![Value::from(x0), Value::from(x1), Value::from(label), Value::from(noise)]
        })
        .collect()
}

/// Replace cells with `Value::Missing` at `rate`, keeping the first row
/// complete so every column has an observed value.
pub fn knock_out(rows: &[Vec<Value>], rate: f64, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.iter()
                .map(|v| {
                    if i > 0 && rng.gen::<f64>() < rate {
                        Value::Missing
                    } else {
                        v.clone()
                    }
                })
                .collect()
        })
        .collect();
    Dataset::new(rows).expect("valid dataset")
}

/// Mixed table with roughly 20% of cells missing.
pub fn mixed_dataset(num_samples: usize, seed: u64) -> Dataset {
    knock_out(&mixed_rows(num_samples, seed), 0.2, seed.wrapping_add(1))
}

/// Configuration with a small forest so tests stay fast.
pub fn fast_config(family: ModelFamily) -> ImputeConfig {
    ConfigBuilder::new()
        .model_family(family)
        .n_estimators(8)
        .max_depth(6)
        .min_samples_leaf(2)
        .num_steps(200)
        .learning_rate(0.1)
        .importance_repeats(2)
        .seed(42)
        .build()
        .expect("valid config")
}

/// Regression features where only the first column matters.
pub fn informative_regression(num_samples: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let x = Array2::from_shape_fn((num_samples, 3), |_| rng.gen_range(1.0..5.0));
    let y = x.column(0).mapv(|v| 3.0 * v + 10.0);
    (x, y)
}

/// Binary codes determined by the sign of the first column.
pub fn informative_classification(num_samples: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let x = Array2::from_shape_fn((num_samples, 3), |_| rng.gen_range(-3.0..3.0));
    let y = x.column(0).mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
    (x, y)
}

/// Every cell of `data` in a targeted column is observed.
pub fn targets_complete(result: &ImputationResult) -> bool {
    result
        .data
        .iter()
        .all(|row| result.columns.iter().all(|&c| !row[c].is_missing()))
}
