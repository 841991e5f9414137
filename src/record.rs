use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use crate::level::Level;

/// Ordered JSON object used for caller context, processor output and
/// records read back from a sink.
pub type Fields = Map<String, Value>;

/// A record as it flows through the processor chain, before formatting.
///
/// `context` belongs to the caller and is never touched by processors.
/// Processors write either to `extra` (dropped by the formatter, apart
/// from `memory_usage`) or to `fields`, which end up top-level on the wire.
#[derive(Debug, Clone)]
pub struct Record {
    pub message: String,
    pub context: Fields,
    pub level: Level,
    pub channel: String,
    pub datetime: DateTime<Local>,
    pub extra: Fields,
    pub fields: Fields,
}

impl Record {
    /// Capture a fresh record stamped with the current local time.
    pub fn new(
        channel: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        context: Fields,
    ) -> Self {
        Record {
            message: message.into(),
            context,
            level,
            channel: channel.into(),
            datetime: Local::now(),
            extra: Fields::new(),
            fields: Fields::new(),
        }
    }
}
