//! Error handling and error types for mice-impute.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the single [`ImputeError`] enum. Per-column failures inside the pass
//! loop are wrapped in [`ImputeError::ColumnFailed`] so a caller can see
//! which pass and column aborted the run.

use std::io;
use thiserror::Error;

/// Main error type for the imputation library.
#[derive(Error, Debug)]
pub enum ImputeError {
    /// Malformed input matrix (empty, ragged, bad target columns)
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What is wrong with the input
        message: String,
    },

    /// A column has no observed values, so no fallback can be computed
    #[error("Column {column} has no observed values; mean/mode is undefined")]
    EmptyColumn {
        /// Offending column
        column: usize,
    },

    /// A type detector produced a tag other than regression/classification
    #[error("Unsupported column type '{tag}' for column {column}")]
    UnsupportedType {
        /// Column being classified
        column: usize,
        /// Tag returned by the detector
        tag: String,
    },

    /// Model training failed
    #[error("Model training error: {message}")]
    ModelTraining {
        /// Why training failed
        message: String,
    },

    /// Model prediction failed
    #[error("Model prediction error: {message}")]
    ModelPrediction {
        /// Why prediction failed
        message: String,
    },

    /// Encoder was asked about a label or code outside its fitted set
    #[error("Unknown label for column {column}: {label}")]
    UnknownLabel {
        /// Column whose encoding was queried
        column: usize,
        /// The label or code that is not in the encoding
        label: String,
    },

    /// A single target column failed during a pass
    #[error("Imputation aborted at pass {pass}, column {column}: {source}")]
    ColumnFailed {
        /// Pass number, starting at 1
        pass: usize,
        /// Target column
        column: usize,
        /// Underlying failure
        #[source]
        source: Box<ImputeError>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Rejected value
        value: String,
        /// Accepted range or rule
        reason: String,
    },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        /// Underlying I/O error
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        /// Underlying serde_json error
        #[from]
        source: serde_json::Error,
    },

    /// CSV parsing errors
    #[cfg(feature = "csv")]
    #[error("CSV parsing error: {source}")]
    Csv {
        /// Underlying csv error
        #[from]
        source: csv::Error,
    },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the violated invariant
        message: String,
    },
}

/// Type alias for Results using ImputeError
pub type Result<T> = std::result::Result<T, ImputeError>;

impl ImputeError {
    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        ImputeError::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an empty column error
    pub fn empty_column(column: usize) -> Self {
        ImputeError::EmptyColumn { column }
    }

    /// Create an unsupported type error
    pub fn unsupported_type<S: Into<String>>(column: usize, tag: S) -> Self {
        ImputeError::UnsupportedType {
            column,
            tag: tag.into(),
        }
    }

    /// Create a model training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        ImputeError::ModelTraining {
            message: message.into(),
        }
    }

    /// Create a model prediction error
    pub fn prediction<S: Into<String>>(message: S) -> Self {
        ImputeError::ModelPrediction {
            message: message.into(),
        }
    }

    /// Create an unknown label error
    pub fn unknown_label<S: Into<String>>(column: usize, label: S) -> Self {
        ImputeError::UnknownLabel {
            column,
            label: label.into(),
        }
    }

    /// Wrap a per-column failure with its pass and column
    pub fn column_failed(pass: usize, column: usize, source: ImputeError) -> Self {
        ImputeError::ColumnFailed {
            pass,
            column,
            source: Box::new(source),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ImputeError::Config {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        ImputeError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        ImputeError::Internal {
            message: message.into(),
        }
    }

    /// Innermost error, looking through `ColumnFailed` wrappers
    pub fn root_cause(&self) -> &ImputeError {
        match self {
            ImputeError::ColumnFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Check if this error is recoverable by retrying with other settings
    pub fn is_recoverable(&self) -> bool {
        match self {
            ImputeError::InvalidInput { .. } => false,
            ImputeError::EmptyColumn { .. } => false,
            ImputeError::UnsupportedType { .. } => false,
            ImputeError::ModelTraining { .. } => true,
            ImputeError::ModelPrediction { .. } => true,
            ImputeError::UnknownLabel { .. } => false,
            ImputeError::ColumnFailed { source, .. } => source.is_recoverable(),
            ImputeError::Config { .. } => false,
            ImputeError::InvalidParameter { .. } => false,
            ImputeError::IO { .. } => false,
            ImputeError::Json { .. } => false,
            #[cfg(feature = "csv")]
            ImputeError::Csv { .. } => false,
            ImputeError::Internal { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ImputeError::InvalidInput { .. } => "invalid_input",
            ImputeError::EmptyColumn { .. } => "invalid_input",
            ImputeError::UnsupportedType { .. } => "unsupported_type",
            ImputeError::ModelTraining { .. } => "model_training",
            ImputeError::ModelPrediction { .. } => "model_prediction",
            ImputeError::UnknownLabel { .. } => "unknown_label",
            ImputeError::ColumnFailed { source, .. } => source.category(),
            ImputeError::Config { .. } => "config",
            ImputeError::InvalidParameter { .. } => "invalid_parameter",
            ImputeError::IO { .. } => "io",
            ImputeError::Json { .. } => "json",
            #[cfg(feature = "csv")]
            ImputeError::Csv { .. } => "csv",
            ImputeError::Internal { .. } => "internal",
        }
    }
}

/// Build an [`ImputeError::InvalidInput`] from a message or format arguments
#[macro_export]
macro_rules! input_error {
    ($msg:expr) => {
        $crate::core::error::ImputeError::invalid_input($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ImputeError::invalid_input(format!($fmt, $($arg)*))
    };
}

/// Build an [`ImputeError::ModelTraining`] from a message or format arguments
#[macro_export]
macro_rules! training_error {
    ($msg:expr) => {
        $crate::core::error::ImputeError::training($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ImputeError::training(format!($fmt, $($arg)*))
    };
}

/// Build an [`ImputeError::ModelPrediction`] from a message or format arguments
#[macro_export]
macro_rules! prediction_error {
    ($msg:expr) => {
        $crate::core::error::ImputeError::prediction($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ImputeError::prediction(format!($fmt, $($arg)*))
    };
}

/// Return early with `Err($err)` unless `$cond` holds
///
/// ```rust
/// use mice_impute::{ensure, training_error, ImputeError, Result};
///
/// fn rows(n: usize) -> Result<usize> {
///     ensure!(n > 0, training_error!("no training rows"));
///     Ok(n)
/// }
///
/// assert_eq!(rows(3).unwrap(), 3);
/// assert!(matches!(rows(0), Err(ImputeError::ModelTraining { .. })));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
