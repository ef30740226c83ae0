//! Default configuration values for mice-impute.

/// Default number of chained-equation passes.
pub const DEFAULT_MAX_PASSES: usize = 1;

/// Default number of trees in the forest.
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Default maximum tree depth.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default minimum number of training rows in a leaf.
pub const DEFAULT_MIN_SAMPLES_LEAF: usize = 5;

/// Default minimum impurity decrease required to split.
pub const DEFAULT_MIN_INFO_GAIN: f64 = 0.0;

/// Default number of gradient steps for logistic regression.
pub const DEFAULT_LOGISTIC_STEPS: usize = 1000;

/// Default logistic regression learning rate.
pub const DEFAULT_LOGISTIC_LEARNING_RATE: f64 = 5e-3;

/// Default number of shuffles averaged per predictor in permutation importance.
pub const DEFAULT_IMPORTANCE_REPEATS: usize = 3;

/// Default random seed for reproducible results.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Default number of threads (0 = use all available cores).
pub const DEFAULT_NUM_THREADS: usize = 0;

/// Ridge term added to the normal equations when they are singular.
pub const LINEAR_RIDGE_EPSILON: f64 = 1e-8;

/// Probability floor used by the cross-entropy metric.
pub const PROBABILITY_EPSILON: f64 = 1e-15;

/// Log target used for engine progress messages.
pub const LOG_TARGET: &str = "mice_impute::engine";

/// Crate version.
pub const MICE_IMPUTE_VERSION: &str = env!("CARGO_PKG_VERSION");
