use serde::{Serialize, Serializer};
use std::fmt;

/// Record severity, with the conventional 100 to 600 numbering so stored
/// records stay comparable across producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug = 100,
    Info = 200,
    Notice = 250,
    Warning = 300,
    Error = 400,
    Critical = 500,
    Alert = 550,
    Emergency = 600,
}

impl Level {
    pub const ALL: [Level; 8] = [
        Level::Debug,
        Level::Info,
        Level::Notice,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Alert,
        Level::Emergency,
    ];

    /// Numeric severity as written to the `level` field.
    pub fn value(self) -> u16 {
        self as u16
    }

    /// Upper-case name as written to the `level_name` field.
    pub fn name(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Alert => "ALERT",
            Level::Emergency => "EMERGENCY",
        }
    }

    pub fn from_value(value: u64) -> Option<Level> {
        Level::ALL.into_iter().find(|level| u64::from(level.value()) == value)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered_by_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Critical < Level::Emergency);
        assert_eq!(Level::Warning.value(), 300);
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Level::from_value(250), Some(Level::Notice));
        assert_eq!(Level::from_value(301), None);
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Level::Error).unwrap(), "400");
    }
}
