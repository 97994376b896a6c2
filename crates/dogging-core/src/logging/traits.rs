//! Logger trait definition

use std::error::Error;
use std::sync::Arc;

use super::level::Level;
use crate::attributes::ExtraValues;
use crate::format::Message;

/// One log event handed to a sink
///
/// The message renders lazily and the extras evaluate lazily: a sink that
/// never looks at them never pays for them.
pub struct LogRecord<'a> {
    /// Name of the logger the event is sent to
    pub logger: &'a str,
    pub level: Level,
    pub message: &'a Message<'a>,
    /// The intercepted error, when the error phase asks for error info
    pub error: Option<&'a (dyn Error + 'static)>,
    pub extra: Option<&'a ExtraValues<'a>>,
}

impl LogRecord<'_> {
    /// Extras as a compact JSON object, if there are any
    pub fn extra_json(&self) -> Option<String> {
        self.extra
            .map(|extra| extra.values())
            .filter(|values| !values.is_empty())
            .map(|values| serde_json::Value::Object(values.clone()).to_string())
    }
}

/// Logger abstraction for guarded functions
///
/// Implementations:
/// - `TracingLogger`: forwards to the `tracing` crate (default)
/// - `ConsoleLogger`: logs to stdout/stderr
/// - `MemoryLogger`: keeps records in memory, for tests
/// - `NoOpLogger`: discards everything
pub trait Logger: Send + Sync {
    /// Logger name
    fn name(&self) -> &str;

    /// Whether a message at `level` would be emitted
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    /// Emit one record
    fn log(&self, record: &LogRecord<'_>);
}

/// Type alias for a boxed logger
pub type BoxedLogger = Box<dyn Logger>;

/// Type alias for an Arc-wrapped logger
pub type SharedLogger = Arc<dyn Logger>;
