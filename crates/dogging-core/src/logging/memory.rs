//! In-memory logger implementation

use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::level::Level;
use super::traits::{LogRecord, Logger};

/// A record kept by [`MemoryLogger`], fully materialized
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedLog {
    pub logger: String,
    pub level: Level,
    pub message: String,
    pub error: Option<String>,
    pub extra: Option<Map<String, Value>>,
}

/// A logger that keeps every record in memory
///
/// Useful for testing: records are rendered when logged and can be
/// inspected afterwards.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    name: String,
    min_level: Option<Level>,
    records: Mutex<Vec<RecordedLog>>,
}

impl MemoryLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_level: None,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Drop messages below `level` without rendering them
    pub fn with_level(mut self, level: Level) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn records(&self) -> Vec<RecordedLog> {
        self.records.lock().clone()
    }

    /// Rendered messages, in logging order
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self, level: Level) -> bool {
        self.min_level.map_or(true, |min| level >= min)
    }

    fn log(&self, record: &LogRecord<'_>) {
        if !self.enabled(record.level) {
            return;
        }
        let recorded = RecordedLog {
            logger: record.logger.to_string(),
            level: record.level,
            message: record.message.to_string(),
            error: record.error.map(|e| e.to_string()),
            extra: record.extra.map(|extra| extra.values().clone()),
        };
        self.records.lock().push(recorded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeContext, AttributeSet, ExtraValues, ProviderChain, SharedAttributes};
    use crate::format::{parse_template, ArgMap, Message};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_memory_logger_records() {
        let parsed = parse_template("{bar}").unwrap();
        let message = Message::new(&parsed, || {
            let mut args = ArgMap::new();
            args.insert("bar".into(), json!("cake"));
            args
        });
        let provider: SharedAttributes = Arc::new(AttributeSet::new("x").with_attribute("y", |_| 1));
        let chain = ProviderChain::new(vec![provider]);
        let ctx = AttributeContext::from_args(ArgMap::new());
        let extra = ExtraValues::new(&chain, &ctx);
        let error = std::io::Error::new(std::io::ErrorKind::Other, "boom");

        let logger = MemoryLogger::new("tests");
        logger.log(&LogRecord {
            logger: "tests",
            level: Level::Error,
            message: &message,
            error: Some(&error),
            extra: Some(&extra),
        });

        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "cake");
        assert_eq!(records[0].error.as_deref(), Some("boom"));
        assert_eq!(records[0].extra.as_ref().unwrap()["y"], json!(1));

        logger.clear();
        assert!(logger.is_empty());
    }

    #[test]
    fn test_memory_logger_level_filter() {
        let logger = MemoryLogger::new("tests").with_level(Level::Warn);
        assert!(!logger.enabled(Level::Info));
        assert!(logger.enabled(Level::Critical));
    }
}
