//! Log levels

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a log message
///
/// Numeric values follow the usual 10-step scale (`Info` = 20), with `Trace`
/// below `Debug`. Any other number is a `Custom` level that sorts between
/// its neighbours; levels compare, hash and serialize by number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
    Custom(i64),
}

impl Level {
    /// The named levels, lowest first
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Critical,
    ];

    /// Upper-case name, `None` for numbers without one
    pub fn name(&self) -> Option<&'static str> {
        match self.normalized() {
            Level::Trace => Some("TRACE"),
            Level::Debug => Some("DEBUG"),
            Level::Info => Some("INFO"),
            Level::Warn => Some("WARN"),
            Level::Error => Some("ERROR"),
            Level::Critical => Some("CRITICAL"),
            Level::Custom(_) => None,
        }
    }

    pub fn value(&self) -> i64 {
        match self {
            Level::Trace => 5,
            Level::Debug => 10,
            Level::Info => 20,
            Level::Warn => 30,
            Level::Error => 40,
            Level::Critical => 50,
            Level::Custom(value) => *value,
        }
    }

    /// The named level with this numeric value, or a custom one
    pub fn from_value(value: i64) -> Level {
        Self::ALL
            .into_iter()
            .find(|level| level.value() == value)
            .unwrap_or(Level::Custom(value))
    }

    fn normalized(&self) -> Level {
        Self::from_value(self.value())
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Info
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for Level {}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl Hash for Level {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

impl From<i64> for Level {
    fn from(value: i64) -> Self {
        Level::from_value(value)
    }
}

impl From<Level> for i64 {
    fn from(level: Level) -> Self {
        level.value()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Level {}", self.value()),
        }
    }
}

impl FromStr for Level {
    type Err = String;

    /// Parse a level name (any case, `warning` accepted) or numeric value
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<i64>() {
            return Ok(Level::from_value(value));
        }
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "critical" | "fatal" => Ok(Level::Critical),
            other => Err(format!("unknown log level: {other:?}")),
        }
    }
}

/// Buckets by number: each `tracing` level covers its value up to the next
/// one, `Critical` and above map to `ERROR`
impl From<Level> for tracing::Level {
    fn from(level: Level) -> Self {
        match level.value() {
            v if v >= Level::Error.value() => tracing::Level::ERROR,
            v if v >= Level::Warn.value() => tracing::Level::WARN,
            v if v >= Level::Info.value() => tracing::Level::INFO,
            v if v >= Level::Debug.value() => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_named_and_custom_values() {
        assert_eq!(Level::from_value(20), Level::Info);
        assert!(matches!(Level::from_value(50), Level::Critical));
        assert!(matches!(Level::from_value(25), Level::Custom(25)));
        assert_eq!(Level::from_value(-3).value(), -3);
    }

    #[test]
    fn test_custom_levels_sort_between_named() {
        let custom = Level::from_value(25);
        assert!(Level::Info < custom && custom < Level::Warn);
        assert!(Level::from_value(1) < Level::Trace);
        assert_eq!(Level::Custom(20), Level::Info);

        let set: HashSet<Level> = [Level::Custom(30), Level::Warn].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Level::Warn.to_string(), "WARN");
        assert_eq!(Level::Custom(15).to_string(), "Level 15");
        assert_eq!(Level::Custom(40).to_string(), "ERROR");
    }

    #[test]
    fn test_tracing_buckets() {
        assert_eq!(tracing::Level::from(Level::Custom(15)), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(Level::Custom(25)), tracing::Level::INFO);
        assert_eq!(tracing::Level::from(Level::Custom(1)), tracing::Level::TRACE);
        assert_eq!(tracing::Level::from(Level::Critical), tracing::Level::ERROR);
        assert_eq!(tracing::Level::from(Level::Custom(90)), tracing::Level::ERROR);
    }

    #[test]
    fn test_serde_as_number() {
        assert_eq!(serde_json::to_value(Level::Warn).unwrap(), serde_json::json!(30));
        let level: Level = serde_json::from_str("25").unwrap();
        assert_eq!(level.value(), 25);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("warning".parse::<Level>(), Ok(Level::Warn));
        assert_eq!("DEBUG".parse::<Level>(), Ok(Level::Debug));
        assert_eq!("40".parse::<Level>(), Ok(Level::Error));
        assert_eq!("15".parse::<Level>(), Ok(Level::Custom(15)));
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Error < Level::Critical);
        assert_eq!(Level::default(), Level::Info);
    }
}
