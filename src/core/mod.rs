//! Core infrastructure module for mice-impute.
//!
//! - [`types`]: cell values, column types, model families
//! - [`constants`]: configuration defaults
//! - [`error`]: the crate error type
//! - [`traits`]: detector and model-adapter seams
//! - [`logging`]: injectable progress logging

pub mod constants;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use constants::*;
pub use error::{ImputeError, Result};
pub use logging::{LogProgress, MemoryLogger, NoopLogger, ProgressLogger};
pub use traits::*;
pub use types::*;

/// Initialize the `env_logger` backend, defaulting to `info` when `RUST_LOG`
/// is unset. Calling it more than once is harmless.
pub(crate) fn initialize_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    // Already initialized elsewhere is fine
    let _ = env_logger::Builder::from_env(env).try_init();
    log::debug!("mice-impute {} logging initialized", MICE_IMPUTE_VERSION);
}
