//! # mice-impute
//!
//! Multiple Imputation by Chained Equations for mixed numeric and categorical
//! tables, in pure Rust.
//!
//! Every column with missing values is predicted from the other columns by a
//! per-column model, and the estimates are refined over several passes. Next
//! to the completed table, each run reports how much every predictor column
//! mattered to every target column's model.
//!
//! ## Features
//!
//! - **Mixed data**: numeric columns are imputed with regressors, categorical
//!   columns (text labels or few distinct numbers) with classifiers.
//! - **Model families**: random forests, linear/logistic regression, or a
//!   plain mean/mode fill.
//! - **Deterministic**: every model and every importance shuffle is seeded, so
//!   a fixed seed gives identical results with or without parallelism.
//! - **Parallel**: the columns of a pass and the trees of a forest are
//!   processed with Rayon.
//!
//! ## Quick Start
//!
//! ```rust
//! use mice_impute::{ConfigBuilder, Dataset, ModelFamily};
//!
//! # fn main() -> mice_impute::Result<()> {
//! let dataset = Dataset::from_values(vec![
//!     vec![Some(1.0), Some(2.0)],
//!     vec![Some(2.0), None],
//!     vec![None, Some(4.0)],
//!     vec![Some(4.0), Some(5.0)],
//! ])?;
//!
//! let config = ConfigBuilder::new()
//!     .model_family(ModelFamily::None)
//!     .build()?;
//!
//! let result = mice_impute::impute(&dataset, config)?;
//! assert_eq!(result.remaining_missing(), 0);
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom collaborators
//!
//! The column-type detector and the progress logger are injected through
//! [`ImputationEngine::with_type_detector`] and
//! [`ImputationEngine::with_logger`]. Models implement [`ModelAdapter`] and
//! [`TrainedModel`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Raw datasets, summaries and encoding
pub mod dataset;

// Scoring metrics
pub mod metrics;

// Permutation importance
pub mod importance;

// Model bindings
pub mod models;

// The pass loop
pub mod engine;

// Re-export core functionality for convenience
pub use self::core::{
    constants::*,
    error::{ImputeError, Result},
    logging::{LogProgress, MemoryLogger, NoopLogger, ProgressLogger},
    traits::*,
    types::*,
};

// Re-export configuration functionality
pub use config::{ConfigBuilder, ForestParams, ImputeConfig, LogisticParams};

// Re-export dataset functionality
pub use dataset::{
    CategoricalEncoder, ColumnSummarizer, ColumnSummary, Dataset, DefaultTypeDetector, Encoding, TagDetector,
};

// Re-export importance functionality
pub use importance::{permutation_importance, ImportanceOptions};

// Re-export model functionality
pub use models::{adapter_for, LinearRegression, LogisticRegression, RandomForest};

// Re-export engine functionality
pub use engine::{ImportanceRecord, ImputationEngine, ImputationResult};

// Version information
pub use self::core::constants::MICE_IMPUTE_VERSION as VERSION;

/// Impute `dataset` with `config`.
///
/// Shorthand for `ImputationEngine::new(config)?.run(dataset)`.
pub fn impute(dataset: &Dataset, config: ImputeConfig) -> Result<ImputationResult> {
    ImputationEngine::new(config)?.run(dataset)
}

/// Initialize logging.
///
/// Installs an `env_logger` backend (default level `info`, overridable with
/// `RUST_LOG`) so that `verbose` runs print their progress. Safe to call more
/// than once.
///
/// ```rust
/// mice_impute::init();
/// mice_impute::init();
/// ```
pub fn init() {
    self::core::initialize_logging()
}
