//! The chained-equations pass loop.
//!
//! A run summarizes every column, completes the matrix with fallback values,
//! encodes it once and then makes `max_passes` passes over the target
//! columns. Within a pass every column reads the same frozen base matrix;
//! predictions go to a separate accumulator that becomes the next base at the
//! pass boundary. Columns of a pass may therefore be processed in parallel,
//! and their outcomes are merged in target order.

pub mod result;

pub use result::{ImportanceRecord, ImputationResult};

use crate::config::ImputeConfig;
use crate::core::error::{ImputeError, Result};
use crate::core::logging::{LogProgress, NoopLogger, ProgressLogger};
use crate::core::traits::ColumnTypeDetector;
use crate::core::types::*;
use crate::dataset::{CategoricalEncoder, ColumnSummarizer, ColumnSummary, Dataset, DefaultTypeDetector};
use crate::importance::{with_sentinel, ImportanceOptions};
use crate::models::adapter_for;
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Seed for the models and importance of one column in one pass.
pub fn column_seed(seed: u64, pass: usize, column: ColumnIndex) -> u64 {
    seed.wrapping_add((pass as u64) << 32).wrapping_add(column as u64)
}

/// Everything fixed before the first pass.
struct RunState {
    summaries: Vec<ColumnSummary>,
    encoder: CategoricalEncoder,
}

/// What one column contributes to a pass.
struct ColumnOutcome {
    column: ColumnIndex,
    model_name: &'static str,
    train_rows: usize,
    record: ImportanceRecord,
    /// (row, encoded estimate, decoded estimate)
    estimates: Vec<(RowIndex, f64, Value)>,
}

/// Runs MICE imputation with a fixed configuration.
#[derive(Debug, Clone)]
pub struct ImputationEngine {
    config: ImputeConfig,
    logger: Arc<dyn ProgressLogger>,
    detector: Arc<dyn ColumnTypeDetector>,
}

impl ImputationEngine {
    /// Create an engine; the configuration is validated here.
    pub fn new(config: ImputeConfig) -> Result<Self> {
        config.validate()?;
        let logger: Arc<dyn ProgressLogger> = if config.verbose {
            Arc::new(LogProgress)
        } else {
            Arc::new(NoopLogger)
        };
        Ok(ImputationEngine {
            config,
            logger,
            detector: Arc::new(DefaultTypeDetector::default()),
        })
    }

    /// Replace the progress logger
    pub fn with_logger(mut self, logger: Arc<dyn ProgressLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the column-type detector
    pub fn with_type_detector(mut self, detector: Arc<dyn ColumnTypeDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// The engine's configuration
    pub fn config(&self) -> &ImputeConfig {
        &self.config
    }

    /// Impute the targeted missing cells of `dataset`.
    ///
    /// Any per-column failure aborts the run with
    /// [`ImputeError::ColumnFailed`]; no partial result is returned.
    pub fn run(&self, dataset: &Dataset) -> Result<ImputationResult> {
        if self.config.num_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.num_threads)
                .build()
                .map_err(|e| ImputeError::config(format!("Failed to build thread pool: {}", e)))?;
            pool.install(|| self.run_inner(dataset))
        } else {
            self.run_inner(dataset)
        }
    }

    fn info(&self, message: impl FnOnce() -> String) {
        if self.logger.enabled() {
            self.logger.info(&message());
        }
    }

    fn debug(&self, message: impl FnOnce() -> String) {
        if self.logger.enabled() {
            self.logger.debug(&message());
        }
    }

    fn run_inner(&self, dataset: &Dataset) -> Result<ImputationResult> {
        let n = dataset.num_rows();
        let p = dataset.num_columns();
        let targets = self.target_columns(p)?;

        self.info(|| format!("Imputing {} rows x {} columns", n, p));
        self.info(|| format!("Target columns: {:?}", targets));

        let summarizer = ColumnSummarizer::new(self.detector.as_ref());
        let summaries = (0..p)
            .map(|col| summarizer.summarize(col, &dataset.column(col)))
            .collect::<Result<Vec<_>>>()?;
        let column_types: Vec<ColumnType> = summaries.iter().map(|s| s.column_type).collect();

        self.info(|| {
            format!(
                "Missing values by column: {:?}",
                summaries.iter().map(ColumnSummary::missing_count).collect::<Vec<_>>()
            )
        });
        self.info(|| format!("Column types: {:?}", column_types.iter().map(|t| t.to_string()).collect::<Vec<_>>()));
        self.debug(|| {
            format!(
                "Fallback values: [{}]",
                summaries
                    .iter()
                    .map(|s| s.fallback.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        });

        let mut imputed = dataset.to_rows();
        let mut completed = dataset.to_rows();
        for (col, summary) in summaries.iter().enumerate() {
            for &row in &summary.missing_rows {
                completed[row][col] = summary.fallback.clone();
            }
        }

        let finish = |data: Vec<Vec<Value>>,
                      importance_matrix: Vec<ImportanceRecord>,
                      passes: usize,
                      summaries: Vec<ColumnSummary>| {
            let missing_index: Vec<Vec<RowIndex>> = summaries.into_iter().map(|s| s.missing_rows).collect();
            ImputationResult {
                data,
                importance_matrix,
                missing_count: missing_index.iter().map(Vec::len).collect(),
                missing_index,
                column_types: column_types.clone(),
                columns: targets.clone(),
                passes,
            }
        };

        if !self.config.uses_models() {
            for &col in &targets {
                for &row in &summaries[col].missing_rows {
                    imputed[row][col] = completed[row][col].clone();
                }
            }
            self.info(|| "No model family configured, filled target columns with fallback values".to_string());
            return Ok(finish(imputed, Vec::new(), 0, summaries));
        }

        let (mut base, encoder) = CategoricalEncoder::fit(&completed, &column_types)?;
        drop(completed);
        let state = RunState { summaries, encoder };
        let mut importance_matrix = Vec::with_capacity(targets.len() * self.config.max_passes);

        for pass in 1..=self.config.max_passes {
            self.info(|| format!("Pass {}/{}", pass, self.config.max_passes));

            let outcomes: Vec<Result<ColumnOutcome>> = if self.config.parallel {
                targets
                    .par_iter()
                    .map(|&col| self.impute_column(pass, col, &base, &state))
                    .collect()
            } else {
                targets
                    .iter()
                    .map(|&col| self.impute_column(pass, col, &base, &state))
                    .collect()
            };

            let mut next_base = base.clone();
            for outcome in outcomes {
                let outcome = outcome?;
                self.debug(|| {
                    format!(
                        " > column {} ({}): trained on {} rows, imputed {}",
                        outcome.column,
                        outcome.model_name,
                        outcome.train_rows,
                        outcome.estimates.len()
                    )
                });
                for (row, encoded, decoded) in outcome.estimates {
                    next_base[[row, outcome.column]] = encoded;
                    imputed[row][outcome.column] = decoded;
                }
                importance_matrix.push(outcome.record);
            }
            base = next_base;
        }

        self.debug(|| {
            format!(
                "Importances: {}",
                serde_json::to_string(&importance_matrix).unwrap_or_default()
            )
        });
        self.info(|| format!("Finished {} passes", self.config.max_passes));

        Ok(finish(imputed, importance_matrix, self.config.max_passes, state.summaries))
    }

    /// Configured target columns, range- and duplicate-checked.
    fn target_columns(&self, num_columns: usize) -> Result<Vec<ColumnIndex>> {
        let Some(columns) = &self.config.columns else {
            return Ok((0..num_columns).collect());
        };
        let mut seen = HashSet::new();
        for &col in columns {
            if col >= num_columns {
                return Err(ImputeError::invalid_input(format!(
                    "target column {} is out of range for {} columns",
                    col, num_columns
                )));
            }
            if !seen.insert(col) {
                return Err(ImputeError::invalid_input(format!("target column {} listed twice", col)));
            }
        }
        Ok(columns.clone())
    }

    fn impute_column(
        &self,
        pass: usize,
        column: ColumnIndex,
        base: &Array2<f64>,
        state: &RunState,
    ) -> Result<ColumnOutcome> {
        self.train_and_predict(pass, column, base, state)
            .map_err(|e| ImputeError::column_failed(pass, column, e))
    }

    fn train_and_predict(
        &self,
        pass: usize,
        column: ColumnIndex,
        base: &Array2<f64>,
        state: &RunState,
    ) -> Result<ColumnOutcome> {
        let summary = &state.summaries[column];
        let missing = &summary.missing_rows;
        let missing_set: HashSet<RowIndex> = missing.iter().copied().collect();
        let train_rows: Vec<RowIndex> = (0..base.nrows()).filter(|r| !missing_set.contains(r)).collect();
        let predictors: Vec<ColumnIndex> = (0..base.ncols()).filter(|&c| c != column).collect();

        let x_train = base.select(Axis(0), &train_rows).select(Axis(1), &predictors);
        let y_train = base.column(column).select(Axis(0), &train_rows);

        let seed = column_seed(self.config.seed, pass, column);
        let family = self.config.model_family;
        let adapter = adapter_for(family, summary.column_type, &self.config, seed)
            .ok_or_else(|| ImputeError::internal(format!("model family {} trains no models", family)))?;

        let model = adapter.train(x_train.view(), y_train.view())?;
        let options = ImportanceOptions {
            repeats: self.config.importance_repeats,
            scale: self.config.scale_importance,
            seed,
        };
        let kind = ImportanceKind::for_column(summary.column_type, family);
        let importance = model.importance(x_train.view(), y_train.view(), kind, &options)?;

        let mut estimates = Vec::with_capacity(missing.len());
        if !missing.is_empty() {
            let x_pred = base.select(Axis(0), missing).select(Axis(1), &predictors);
            let predictions = model.predict(x_pred.view())?;
            if predictions.len() != missing.len() {
                return Err(ImputeError::prediction(format!(
                    "{} predictions for {} missing rows",
                    predictions.len(),
                    missing.len()
                )));
            }
            for (&row, &estimate) in missing.iter().zip(predictions.iter()) {
                if !estimate.is_finite() {
                    return Err(ImputeError::prediction(format!("non-finite estimate for row {}", row)));
                }
                let encoded = match summary.column_type {
                    ColumnType::Regression => estimate,
                    ColumnType::Classification => estimate.round(),
                };
                let decoded = state.encoder.decode(column, encoded)?;
                estimates.push((row, encoded, decoded));
            }
        }

        Ok(ColumnOutcome {
            column,
            model_name: adapter.name(),
            train_rows: train_rows.len(),
            record: ImportanceRecord {
                pass,
                column,
                importance: with_sentinel(&importance, column),
            },
            estimates,
        })
    }
}
