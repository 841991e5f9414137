use serde_json::Value;
use std::time::Instant;

use crate::error::{QLogError, Result};
use crate::memory::{MemoryReader, ProcMemoryReader};
use crate::record::{Fields, Record};

/// Key under `extra` where the memory processor leaves its reading.
pub const MEMORY_USAGE_KEY: &str = "memory_usage";

const ID_SUFFIX: &str = "_id";

/// One enrichment step applied to every record before formatting.
///
/// Processors receive the record built so far and hand back the updated
/// record. They must leave `context` alone. Entries added to `fields`
/// under a key the formatter owns (`message`, `level`, `channel`, ...) are
/// dropped at formatting time.
pub trait Processor: Send {
    fn process(&mut self, record: Record) -> Record;
}

/// Stamps every registered identity (`car_id`, `user_id`, ...) onto the
/// record as a top-level field.
#[derive(Debug, Default, Clone)]
pub struct IdProcessor {
    identities: Fields,
}

impl IdProcessor {
    /// Register or overwrite an identity. The key must end with `_id`;
    /// a rejected key leaves the registered set untouched.
    pub fn set_id(&mut self, id: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let id = id.into();
        if !id.ends_with(ID_SUFFIX) {
            return Err(QLogError::InvalidArgument(format!(
                "id must end with `{ID_SUFFIX}`, got `{id}`"
            )));
        }
        self.identities.insert(id, value.into());
        Ok(())
    }

    pub fn identities(&self) -> &Fields {
        &self.identities
    }
}

impl Processor for IdProcessor {
    fn process(&mut self, mut record: Record) -> Record {
        for (id, value) in &self.identities {
            record.fields.insert(id.clone(), value.clone());
        }
        record
    }
}

/// Stamps the logger's session under `session`.
#[derive(Debug, Clone)]
pub struct SessionProcessor {
    session: String,
}

impl SessionProcessor {
    pub fn new(session: impl Into<String>) -> Self {
        SessionProcessor { session: session.into() }
    }
}

impl Processor for SessionProcessor {
    fn process(&mut self, mut record: Record) -> Record {
        record
            .fields
            .insert("session".to_string(), Value::String(self.session.clone()));
        record
    }
}

/// Adds `time` (since the previous record) and `time_total` (since the
/// processor was created), both rendered as `"<n> ms"`.
#[derive(Debug, Clone)]
pub struct TimerProcessor {
    start: Instant,
    last: Instant,
}

impl TimerProcessor {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        TimerProcessor { start, last: start }
    }

    /// Same as [`Processor::process`] with an explicit clock reading.
    pub fn process_at(&mut self, mut record: Record, now: Instant) -> Record {
        record.fields.insert(
            "time".to_string(),
            Value::String(elapsed_ms(self.last, now)),
        );
        record.fields.insert(
            "time_total".to_string(),
            Value::String(elapsed_ms(self.start, now)),
        );
        self.last = now;
        record
    }
}

impl Default for TimerProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for TimerProcessor {
    fn process(&mut self, record: Record) -> Record {
        self.process_at(record, Instant::now())
    }
}

/// Elapsed time between two instants: seconds rounded to three decimals,
/// then scaled to milliseconds.
pub fn elapsed_ms(from: Instant, to: Instant) -> String {
    let secs = to.saturating_duration_since(from).as_secs_f64();
    let rounded = (secs * 1000.0).round() / 1000.0;
    format!("{} ms", (rounded * 1000.0).round() as u64)
}

/// Leaves the current resident memory, in bytes, under
/// `extra.memory_usage`. The formatter lifts it to the top-level `mem`.
pub struct MemoryUsageProcessor {
    reader: Box<dyn MemoryReader>,
}

impl MemoryUsageProcessor {
    pub fn new() -> Self {
        Self::with_reader(ProcMemoryReader)
    }

    pub fn with_reader(reader: impl MemoryReader + 'static) -> Self {
        MemoryUsageProcessor { reader: Box::new(reader) }
    }
}

impl Default for MemoryUsageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for MemoryUsageProcessor {
    fn process(&mut self, mut record: Record) -> Record {
        let usage = self.reader.resident_bytes().map_or(Value::Null, Value::from);
        record.extra.insert(MEMORY_USAGE_KEY.to_string(), usage);
        record
    }
}

/// The ordered processor chain: identities, session, timer, memory, then
/// anything pushed by the host.
///
/// The identity processor is held apart so the logger can keep
/// registering identities after construction.
pub struct ProcessorChain {
    ids: IdProcessor,
    processors: Vec<Box<dyn Processor>>,
}

impl ProcessorChain {
    pub fn new(session: impl Into<String>) -> Self {
        let processors: Vec<Box<dyn Processor>> = vec![
            Box::new(SessionProcessor::new(session)),
            Box::new(TimerProcessor::new()),
            Box::new(MemoryUsageProcessor::new()),
        ];
        ProcessorChain {
            ids: IdProcessor::default(),
            processors,
        }
    }

    pub fn ids_mut(&mut self) -> &mut IdProcessor {
        &mut self.ids
    }

    pub fn ids(&self) -> &IdProcessor {
        &self.ids
    }

    /// Append a processor after the built-in ones.
    pub fn push(&mut self, processor: impl Processor + 'static) {
        self.processors.push(Box::new(processor));
    }

    pub fn run(&mut self, record: Record) -> Record {
        let record = self.ids.process(record);
        self.processors
            .iter_mut()
            .fold(record, |record, processor| processor.process(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use serde_json::json;
    use std::time::Duration;

    fn record() -> Record {
        let mut context = Fields::new();
        context.insert("k".to_string(), json!("v"));
        Record::new("app", Level::Info, "hello", context)
    }

    struct FixedMemory(u64);

    impl MemoryReader for FixedMemory {
        fn resident_bytes(&self) -> Option<u64> {
            Some(self.0)
        }
    }

    #[test]
    fn test_id_suffix_is_validated() {
        let mut ids = IdProcessor::default();
        let err = ids.set_id("car", 123).unwrap_err();
        assert!(matches!(err, QLogError::InvalidArgument(_)));
        assert!(err.to_string().contains("id must end with"));
        assert!(ids.identities().is_empty());
    }

    #[test]
    fn test_ids_accumulate_and_overwrite() {
        let mut ids = IdProcessor::default();
        ids.set_id("car_id", "123").unwrap();
        ids.set_id("car_id", "234").unwrap();
        ids.set_id("user_id", "345").unwrap();

        let record = ids.process(record());
        assert_eq!(record.fields["car_id"], json!("234"));
        assert_eq!(record.fields["user_id"], json!("345"));
        assert_eq!(record.context["k"], json!("v"));
    }

    #[test]
    fn test_timer_rounds_to_milliseconds() {
        let start = Instant::now();
        let mut timer = TimerProcessor::starting_at(start);

        let first = timer.process_at(record(), start);
        assert_eq!(first.fields["time"], json!("0 ms"));
        assert_eq!(first.fields["time_total"], json!("0 ms"));

        let second = timer.process_at(record(), start + Duration::from_micros(10_400));
        assert_eq!(second.fields["time"], json!("10 ms"));

        let third = timer.process_at(record(), start + Duration::from_micros(15_600));
        assert_eq!(third.fields["time"], json!("5 ms"));
        assert_eq!(third.fields["time_total"], json!("16 ms"));
    }

    #[test]
    fn test_memory_goes_to_extra() {
        let mut memory = MemoryUsageProcessor::with_reader(FixedMemory(4096));
        let record = memory.process(record());
        assert_eq!(record.extra[MEMORY_USAGE_KEY], json!(4096));
        assert!(!record.fields.contains_key(MEMORY_USAGE_KEY));
    }

    #[test]
    fn test_chain_runs_in_order() {
        let mut chain = ProcessorChain::new("abc");
        chain.ids_mut().set_id("order_id", 7).unwrap();
        let record = chain.run(record());

        let keys: Vec<&str> = record.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["order_id", "session", "time", "time_total"]);
        assert_eq!(record.fields["session"], json!("abc"));
        assert!(record.extra.contains_key(MEMORY_USAGE_KEY));
    }

    #[test]
    fn test_pushed_processor_runs_last() {
        struct Host;
        impl Processor for Host {
            fn process(&mut self, mut record: Record) -> Record {
                let seen = record.fields.contains_key("session");
                record.fields.insert("host".to_string(), json!(seen));
                record
            }
        }

        let mut chain = ProcessorChain::new("abc");
        chain.push(Host);
        let record = chain.run(record());
        assert_eq!(record.fields["host"], json!(true));
    }
}
