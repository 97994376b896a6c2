//! No-op logger implementation

use super::level::Level;
use super::traits::{LogRecord, Logger};

/// A logger that does nothing
///
/// Reports every level as disabled, so guarded calls never build messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl NoOpLogger {
    /// Create a new no-op logger
    pub fn new() -> Self {
        Self
    }
}

impl Logger for NoOpLogger {
    fn name(&self) -> &str {
        "noop"
    }

    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn log(&self, _record: &LogRecord<'_>) {}
}
