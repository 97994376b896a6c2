//! Logger that forwards to the `tracing` crate

use tracing::level_filters::LevelFilter;

use super::level::Level;
use super::traits::{LogRecord, Logger};

/// Target of every event emitted by [`TracingLogger`]
pub const TRACING_TARGET: &str = "dogging";

/// The default sink: one `tracing` event per record
///
/// Levels are bucketed onto `tracing`'s five (see `From<Level>`); the number
/// itself travels in the `severity` field and `critical` is set from
/// `Critical` up. The error (if any) is a display field.
///
/// `tracing` fields are named at the call site, so extras can not become
/// one field each: they are attached together as the JSON object string
/// `extra`.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    name: String,
}

impl TracingLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

macro_rules! emit {
    ($level:expr, $record:expr) => {{
        let extra = $record.extra_json();
        let error = $record.error.map(|e| e.to_string());
        tracing::event!(
            target: TRACING_TARGET,
            $level,
            logger = $record.logger,
            severity = $record.level.value(),
            critical = $record.level >= Level::Critical,
            extra = extra.as_deref(),
            error = error.as_deref(),
            "{}",
            $record.message
        )
    }};
}

impl Logger for TracingLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self, level: Level) -> bool {
        tracing::Level::from(level) <= LevelFilter::current()
    }

    fn log(&self, record: &LogRecord<'_>) {
        let level = tracing::Level::from(record.level);
        if level == tracing::Level::ERROR {
            emit!(tracing::Level::ERROR, record)
        } else if level == tracing::Level::WARN {
            emit!(tracing::Level::WARN, record)
        } else if level == tracing::Level::INFO {
            emit!(tracing::Level::INFO, record)
        } else if level == tracing::Level::DEBUG {
            emit!(tracing::Level::DEBUG, record)
        } else {
            emit!(tracing::Level::TRACE, record)
        }
    }
}
