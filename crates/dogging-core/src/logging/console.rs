//! Console logger implementation

use super::level::Level;
use super::traits::{LogRecord, Logger};

/// Environment variable holding the console logger's minimum level
pub const LOG_LEVEL_ENV: &str = "DOGGING_LOG_LEVEL";

/// A logger that outputs to the console (stdout/stderr)
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    name: String,
    prefix: String,
    min_level: Level,
}

impl ConsoleLogger {
    /// Create a console logger prefixed with its name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            prefix: format!("[{name}]"),
            name,
            min_level: Level::Trace,
        }
    }

    /// Create a console logger with a custom prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Drop messages below `level`
    pub fn with_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Create a console logger whose minimum level comes from `DOGGING_LOG_LEVEL`
    ///
    /// Defaults to `Info` when the variable is unset or unparsable.
    pub fn from_env(name: impl Into<String>) -> Self {
        let level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(Level::Info);
        Self::new(name).with_level(level)
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    fn line(&self, record: &LogRecord<'_>) -> String {
        let mut line = format!("{} {}: {}", self.prefix, record.level, record.message);
        if let Some(extra) = record.extra_json() {
            line.push(' ');
            line.push_str(&extra);
        }
        if let Some(error) = record.error {
            line.push_str(&format!(" (error: {error})"));
        }
        line
    }
}

impl Logger for ConsoleLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn log(&self, record: &LogRecord<'_>) {
        if !self.enabled(record.level) {
            return;
        }
        if record.level == Level::Info {
            println!("{}", self.line(record));
        } else {
            eprintln!("{}", self.line(record));
        }
    }
}
