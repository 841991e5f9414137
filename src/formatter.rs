use serde_json::Value;
use tracing::debug;

use crate::error::{QLogError, Result};
use crate::processor::MEMORY_USAGE_KEY;
use crate::record::{Fields, Record};

/// Pattern applied to `datetime`: `YYYY:MM:DD HH:MM:SS.ffffff`.
pub const DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S%.6f";

/// Keys the formatter owns. Processor fields under these names are ignored.
pub const RESERVED_KEYS: [&str; 7] = [
    "message",
    "context",
    "level",
    "level_name",
    "channel",
    "datetime",
    "mem",
];

/// Serializes an enriched [`Record`] into the flat JSON object stored by
/// every sink.
///
/// `extra` does not survive formatting: its `memory_usage` entry becomes
/// the top-level `mem` field and anything else in it is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct QLogFormatter;

impl QLogFormatter {
    /// Build the wire object in its fixed field order.
    pub fn to_fields(&self, record: &Record) -> Fields {
        let mut out = Fields::new();
        out.insert("message".to_string(), Value::String(record.message.clone()));
        out.insert("context".to_string(), Value::Object(record.context.clone()));
        out.insert("level".to_string(), Value::from(record.level.value()));
        out.insert(
            "level_name".to_string(),
            Value::String(record.level.name().to_string()),
        );
        out.insert("channel".to_string(), Value::String(record.channel.clone()));
        out.insert(
            "datetime".to_string(),
            Value::String(record.datetime.format(DATETIME_FORMAT).to_string()),
        );
        for (key, value) in &record.fields {
            if RESERVED_KEYS.contains(&key.as_str()) {
                debug!(key = %key, "processor field shadows a reserved key, skipped");
                continue;
            }
            out.insert(key.clone(), value.clone());
        }
        let mem = record
            .extra
            .get(MEMORY_USAGE_KEY)
            .cloned()
            .unwrap_or(Value::Null);
        out.insert("mem".to_string(), mem);
        out
    }

    /// Format one record as a JSON string.
    pub fn format(&self, record: &Record) -> Result<String> {
        serde_json::to_string(&self.to_fields(record)).map_err(QLogError::Format)
    }

    /// Batches are not formatted as a unit; callers format each record.
    pub fn format_batch(&self, _records: &[Record]) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use chrono::{Local, TimeZone};
    use serde_json::json;

    fn enriched() -> Record {
        let mut context = Fields::new();
        context.insert("with".to_string(), json!({"some": "context"}));
        let mut record = Record::new("sql", Level::Warning, "warning log", context);
        record.datetime = Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
            .unwrap()
            + chrono::Duration::microseconds(42);
        record.fields.insert("car_id".to_string(), json!("234"));
        record.fields.insert("session".to_string(), json!("s1"));
        record.fields.insert("time".to_string(), json!("3 ms"));
        record.fields.insert("time_total".to_string(), json!("9 ms"));
        record.extra.insert(MEMORY_USAGE_KEY.to_string(), json!(2097152));
        record.extra.insert("dropped".to_string(), json!(true));
        record
    }

    #[test]
    fn test_format_layout() {
        let formatted = QLogFormatter.format(&enriched()).unwrap();
        assert_eq!(
            formatted,
            concat!(
                r#"{"message":"warning log","context":{"with":{"some":"context"}},"#,
                r#""level":300,"level_name":"WARNING","channel":"sql","#,
                r#""datetime":"2024:03:09 07:05:01.000042","car_id":"234","session":"s1","#,
                r#""time":"3 ms","time_total":"9 ms","mem":2097152}"#
            )
        );
    }

    #[test]
    fn test_extra_is_collapsed_into_mem() {
        let fields = QLogFormatter.to_fields(&enriched());
        assert!(!fields.contains_key("extra"));
        assert!(!fields.contains_key("dropped"));
        assert_eq!(fields["mem"], json!(2097152));
    }

    #[test]
    fn test_missing_memory_is_null() {
        let record = Record::new("app", Level::Debug, "m", Fields::new());
        let fields = QLogFormatter.to_fields(&record);
        assert_eq!(fields["mem"], Value::Null);
    }

    #[test]
    fn test_round_trip_keeps_fields() {
        let record = enriched();
        let formatted = QLogFormatter.format(&record).unwrap();
        let parsed: Fields = serde_json::from_str(&formatted).unwrap();
        assert_eq!(parsed, QLogFormatter.to_fields(&record));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), formatted);
    }

    #[test]
    fn test_round_trip_keeps_numbers_and_unicode() {
        let mut record = enriched();
        record.context.insert("ratio".to_string(), json!(971.9863718547629));
        record.context.insert("tiny".to_string(), json!(1.0715660391465826e-75));
        record.context.insert("big".to_string(), json!(u64::MAX));
        record.context.insert("neg".to_string(), json!(i64::MIN));
        record.context.insert("s".to_string(), json!({"nested": "é\u{1F600}"}));

        let formatted = QLogFormatter.format(&record).unwrap();
        let parsed: Fields = serde_json::from_str(&formatted).unwrap();
        assert_eq!(parsed, QLogFormatter.to_fields(&record));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), formatted);
        assert_eq!(parsed["context"]["ratio"], json!(971.9863718547629));
        assert_eq!(parsed["context"]["big"], json!(u64::MAX));
    }

    #[test]
    fn test_processor_fields_cannot_shadow_reserved_keys() {
        let mut record = enriched();
        for key in RESERVED_KEYS {
            record.fields.insert(key.to_string(), json!("overwritten"));
        }
        let fields = QLogFormatter.to_fields(&record);
        assert_eq!(fields["message"], json!("warning log"));
        assert_eq!(fields["context"], json!({"with": {"some": "context"}}));
        assert_eq!(fields["level"], json!(300));
        assert_eq!(fields["level_name"], json!("WARNING"));
        assert_eq!(fields["channel"], json!("sql"));
        assert_eq!(fields["datetime"], json!("2024:03:09 07:05:01.000042"));
        assert_eq!(fields["mem"], json!(2097152));
        assert_eq!(fields["car_id"], json!("234"));
    }

    #[test]
    fn test_batch_is_unsupported() {
        assert!(QLogFormatter.format_batch(&[enriched()]).is_none());
    }
}
