//! Named logger registry

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::traits::SharedLogger;
use super::tracing_logger::TracingLogger;

/// Global registry of loggers, keyed by logger name
static LOGGERS: Lazy<RwLock<HashMap<String, SharedLogger>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Get the logger registered under `name`
///
/// Unknown names get a [`TracingLogger`], registered so later lookups return
/// the same instance.
pub fn get_logger(name: &str) -> SharedLogger {
    if let Some(logger) = LOGGERS.read().get(name) {
        return logger.clone();
    }
    LOGGERS
        .write()
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(TracingLogger::new(name)))
        .clone()
}

/// Install `logger` under its own name, replacing any previous logger
pub fn register_logger(logger: SharedLogger) {
    let name = logger.name().to_string();
    tracing::debug!(logger = %name, "registering logger");
    LOGGERS.write().insert(name, logger);
}

/// Names of every registered logger
pub fn list_loggers() -> Vec<String> {
    let mut names: Vec<String> = LOGGERS.read().keys().cloned().collect();
    names.sort();
    names
}
