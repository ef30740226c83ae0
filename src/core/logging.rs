//! Progress reporting for the imputation engine.
//!
//! The engine reports through an injected [`ProgressLogger`] rather than
//! global state. [`NoopLogger`] is the default; [`LogProgress`] forwards to
//! the `log` facade so output shows up wherever `env_logger` (or any other
//! backend) sends it.

use crate::core::constants::LOG_TARGET;
use std::fmt::Debug;

/// Receiver for engine progress messages.
pub trait ProgressLogger: Send + Sync + Debug {
    /// Run-level progress (run header, passes, summaries)
    fn info(&self, message: &str);

    /// Per-column detail
    fn debug(&self, message: &str);

    /// Whether messages are consumed at all; lets callers skip formatting.
    fn enabled(&self) -> bool {
        true
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl ProgressLogger for NoopLogger {
    fn info(&self, _message: &str) {}

    fn debug(&self, _message: &str) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Forwards to `log::info!` / `log::debug!` under the engine log target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressLogger for LogProgress {
    fn info(&self, message: &str) {
        log::info!(target: LOG_TARGET, "{}", message);
    }

    fn debug(&self, message: &str) {
        log::debug!(target: LOG_TARGET, "{}", message);
    }

    fn enabled(&self) -> bool {
        log::log_enabled!(target: LOG_TARGET, log::Level::Info)
    }
}

/// Collects messages in memory; handy for asserting on progress output.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: std::sync::Mutex<Vec<String>>,
}

impl MemoryLogger {
    /// Create an empty logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the collected lines, each prefixed with its level
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, line: String) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

impl ProgressLogger for MemoryLogger {
    fn info(&self, message: &str) {
        self.push(format!("INFO {}", message));
    }

    fn debug(&self, message: &str) {
        self.push(format!("DEBUG {}", message));
    }
}
