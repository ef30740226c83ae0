//! Core configuration structures for mice-impute.
//!
//! [`ImputeConfig`] holds everything a run needs: which columns to impute,
//! how many passes to make, the model family and its hyper-parameters, and
//! the seed. It can be built fluently with [`ConfigBuilder`], loaded from
//! `.json` / `.toml` files or read from `MICE_*` environment variables.

use crate::core::constants::*;
use crate::core::error::{ImputeError, Result};
use crate::core::types::*;
use super::DEFAULT_CONFIG_FILE;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Random-forest hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum number of training rows in a leaf
    pub min_samples_leaf: usize,
    /// Minimum impurity decrease required to split
    pub min_info_gain: f64,
    /// Predictors tried at each split
    pub max_features: MaxFeatures,
    /// Train each tree on a bootstrap sample
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_depth: DEFAULT_MAX_DEPTH,
            min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF,
            min_info_gain: DEFAULT_MIN_INFO_GAIN,
            max_features: MaxFeatures::Auto,
            bootstrap: true,
        }
    }
}

impl ForestParams {
    /// Validate the forest parameters
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ImputeError::invalid_parameter(
                "n_estimators",
                self.n_estimators.to_string(),
                "must be at least 1",
            ));
        }
        if self.max_depth == 0 {
            return Err(ImputeError::invalid_parameter(
                "max_depth",
                self.max_depth.to_string(),
                "must be at least 1",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ImputeError::invalid_parameter(
                "min_samples_leaf",
                self.min_samples_leaf.to_string(),
                "must be at least 1",
            ));
        }
        if !self.min_info_gain.is_finite() || self.min_info_gain < 0.0 {
            return Err(ImputeError::invalid_parameter(
                "min_info_gain",
                self.min_info_gain.to_string(),
                "must be a finite non-negative number",
            ));
        }
        match self.max_features {
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(ImputeError::invalid_parameter(
                    "max_features",
                    f.to_string(),
                    "fraction must be in range (0.0, 1.0]",
                ));
            }
            MaxFeatures::Fixed(0) => {
                return Err(ImputeError::invalid_parameter("max_features", "0", "must be at least 1"));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Logistic-regression hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    /// Number of full-batch gradient steps
    pub num_steps: usize,
    /// Gradient-descent step size
    pub learning_rate: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        LogisticParams {
            num_steps: DEFAULT_LOGISTIC_STEPS,
            learning_rate: DEFAULT_LOGISTIC_LEARNING_RATE,
        }
    }
}

impl LogisticParams {
    /// Validate the logistic parameters
    pub fn validate(&self) -> Result<()> {
        if self.num_steps == 0 {
            return Err(ImputeError::invalid_parameter(
                "num_steps",
                self.num_steps.to_string(),
                "must be at least 1",
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ImputeError::invalid_parameter(
                "learning_rate",
                self.learning_rate.to_string(),
                "must be a finite positive number",
            ));
        }
        Ok(())
    }
}

/// Configuration of one imputation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputeConfig {
    /// Target columns in processing order; `None` means every column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnIndex>>,
    /// Number of chained-equation passes
    pub max_passes: usize,
    /// Model family used for every target column
    pub model_family: ModelFamily,
    /// Divide each importance vector by its maximum absolute value
    pub scale_importance: bool,
    /// Shuffles averaged per predictor in permutation importance
    pub importance_repeats: usize,
    /// Base seed for models and importance
    pub seed: u64,
    /// Process the columns of a pass in parallel
    pub parallel: bool,
    /// Worker threads for parallel work (0 = rayon's global pool)
    pub num_threads: usize,
    /// Report progress through the `log` crate
    pub verbose: bool,
    /// Tree-ensemble hyper-parameters
    pub forest: ForestParams,
    /// Logistic-regression hyper-parameters
    pub logistic: LogisticParams,
}

impl Default for ImputeConfig {
    fn default() -> Self {
        ImputeConfig {
            columns: None,
            max_passes: DEFAULT_MAX_PASSES,
            model_family: ModelFamily::TreeEnsemble,
            scale_importance: false,
            importance_repeats: DEFAULT_IMPORTANCE_REPEATS,
            seed: DEFAULT_RANDOM_SEED,
            parallel: true,
            num_threads: DEFAULT_NUM_THREADS,
            verbose: false,
            forest: ForestParams::default(),
            logistic: LogisticParams::default(),
        }
    }
}

impl ImputeConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters.
    ///
    /// Column indices are range-checked against the dataset when a run
    /// starts; here only duplicates are rejected.
    pub fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(ImputeError::invalid_parameter(
                "max_passes",
                self.max_passes.to_string(),
                "must be at least 1",
            ));
        }

        if self.importance_repeats == 0 {
            return Err(ImputeError::invalid_parameter(
                "importance_repeats",
                self.importance_repeats.to_string(),
                "must be at least 1",
            ));
        }

        if let Some(columns) = &self.columns {
            let mut seen = HashSet::new();
            if let Some(duplicate) = columns.iter().find(|c| !seen.insert(**c)) {
                return Err(ImputeError::invalid_parameter(
                    "columns",
                    duplicate.to_string(),
                    "target columns must be distinct",
                ));
            }
        }

        self.forest.validate()?;
        self.logistic.validate()?;

        let cpus = num_cpus::get();
        if self.num_threads > cpus * 2 {
            log::warn!(
                "num_threads ({}) is much higher than available CPUs ({})",
                self.num_threads,
                cpus
            );
        }

        Ok(())
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ImputeError::config(format!("Failed to read config file: {}", e)))?;

        let config: ImputeConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ImputeError::config(format!("Failed to parse JSON config: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ImputeError::config(format!("Failed to parse TOML config: {}", e)))?,
            _ => {
                return Err(ImputeError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| ImputeError::config(format!("Failed to serialize to JSON: {}", e)))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| ImputeError::config(format!("Failed to serialize to TOML: {}", e)))?,
            _ => {
                return Err(ImputeError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)
            .map_err(|e| ImputeError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load `DEFAULT_CONFIG_FILE` from `dir` when it exists, defaults otherwise
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(DEFAULT_CONFIG_FILE);
        if path.is_file() {
            log::info!("Loading configuration from {}", path.display());
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from `MICE_*` environment variables on top of the defaults
    pub fn load_from_environment() -> Result<Self> {
        let mut config = ImputeConfig::default();
        config.apply_environment_overrides()?;
        Ok(config)
    }

    /// Override fields with any `MICE_*` environment variables that are set
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("MICE_MAX_PASSES") {
            self.max_passes = val
                .parse()
                .map_err(|_| ImputeError::config("Invalid MICE_MAX_PASSES"))?;
        }

        if let Ok(val) = std::env::var("MICE_MODEL_FAMILY") {
            self.model_family = val
                .parse()
                .map_err(|_| ImputeError::config("Invalid MICE_MODEL_FAMILY"))?;
        }

        if let Ok(val) = std::env::var("MICE_SEED") {
            self.seed = val
                .parse()
                .map_err(|_| ImputeError::config("Invalid MICE_SEED"))?;
        }

        if let Ok(val) = std::env::var("MICE_SCALE_IMPORTANCE") {
            self.scale_importance = parse_flag(&val)
                .ok_or_else(|| ImputeError::config("Invalid MICE_SCALE_IMPORTANCE"))?;
        }

        if let Ok(val) = std::env::var("MICE_VERBOSE") {
            self.verbose = parse_flag(&val).ok_or_else(|| ImputeError::config("Invalid MICE_VERBOSE"))?;
        }

        if let Ok(val) = std::env::var("MICE_NUM_THREADS") {
            self.num_threads = val
                .parse()
                .map_err(|_| ImputeError::config("Invalid MICE_NUM_THREADS"))?;
        }

        self.validate()
    }

    /// Whether the run trains models at all
    pub fn uses_models(&self) -> bool {
        self.model_family != ModelFamily::None
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration builder for fluent configuration creation
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: ImputeConfig,
    validation_errors: Vec<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        ConfigBuilder {
            config: ImputeConfig::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Restrict imputation to these columns, in this order
    pub fn columns(mut self, columns: Vec<ColumnIndex>) -> Self {
        self.config.columns = Some(columns);
        self
    }

    /// Set the number of passes
    pub fn max_passes(mut self, passes: usize) -> Self {
        if passes == 0 {
            self.validation_errors
                .push("max_passes must be at least 1".to_string());
        }
        self.config.max_passes = passes;
        self
    }

    /// Set the model family
    pub fn model_family(mut self, family: ModelFamily) -> Self {
        self.config.model_family = family;
        self
    }

    /// Scale importance vectors by their maximum absolute value
    pub fn scale_importance(mut self, scale: bool) -> Self {
        self.config.scale_importance = scale;
        self
    }

    /// Set the number of importance shuffles
    pub fn importance_repeats(mut self, repeats: usize) -> Self {
        if repeats == 0 {
            self.validation_errors
                .push("importance_repeats must be at least 1".to_string());
        }
        self.config.importance_repeats = repeats;
        self
    }

    /// Set the number of trees
    pub fn n_estimators(mut self, n: usize) -> Self {
        if n == 0 {
            self.validation_errors
                .push("n_estimators must be at least 1".to_string());
        }
        self.config.forest.n_estimators = n;
        self
    }

    /// Set the maximum tree depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        if depth == 0 {
            self.validation_errors
                .push("max_depth must be at least 1".to_string());
        }
        self.config.forest.max_depth = depth;
        self
    }

    /// Set the minimum leaf size
    pub fn min_samples_leaf(mut self, min_samples: usize) -> Self {
        if min_samples == 0 {
            self.validation_errors
                .push("min_samples_leaf must be at least 1".to_string());
        }
        self.config.forest.min_samples_leaf = min_samples;
        self
    }

    /// Set the minimum split gain
    pub fn min_info_gain(mut self, gain: f64) -> Self {
        if !gain.is_finite() || gain < 0.0 {
            self.validation_errors
                .push("min_info_gain must be a finite non-negative number".to_string());
        }
        self.config.forest.min_info_gain = gain;
        self
    }

    /// Set the split feature-sampling strategy
    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.config.forest.max_features = max_features;
        self
    }

    /// Enable or disable bootstrap sampling
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.config.forest.bootstrap = bootstrap;
        self
    }

    /// Set the logistic gradient steps
    pub fn num_steps(mut self, steps: usize) -> Self {
        self.config.logistic.num_steps = steps;
        self
    }

    /// Set the logistic learning rate
    pub fn learning_rate(mut self, rate: f64) -> Self {
        if !rate.is_finite() || rate <= 0.0 {
            self.validation_errors
                .push("learning_rate must be a finite positive number".to_string());
        }
        self.config.logistic.learning_rate = rate;
        self
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Enable or disable per-pass column parallelism
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Set the number of worker threads
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Enable or disable `log`-backed progress output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ImputeConfig> {
        if !self.validation_errors.is_empty() {
            return Err(ImputeError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
