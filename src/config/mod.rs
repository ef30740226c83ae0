//! Configuration management for mice-impute.
//!
//! [`ImputeConfig`] is plain serde data with a validating builder, so the
//! same settings can come from code, a `.toml` / `.json` file or the
//! environment.

pub mod core;

pub use self::core::{ConfigBuilder, ForestParams, ImputeConfig, LogisticParams};

/// Conventional configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "mice.toml";
