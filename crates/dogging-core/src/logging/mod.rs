//! Logging sinks for guarded functions

mod console;
mod level;
mod memory;
mod noop;
mod registry;
mod tracing_logger;
mod traits;

pub use console::{ConsoleLogger, LOG_LEVEL_ENV};
pub use level::Level;
pub use memory::{MemoryLogger, RecordedLog};
pub use noop::NoOpLogger;
pub use registry::{get_logger, list_loggers, register_logger};
pub use tracing_logger::{TracingLogger, TRACING_TARGET};
pub use traits::{BoxedLogger, LogRecord, Logger, SharedLogger};
