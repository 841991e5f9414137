use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::autolog::{ApiCall, SqlQuery};
use crate::channel::Channel;
use crate::config::QLogConfig;
use crate::error::{QLogError, Result};
use crate::formatter::QLogFormatter;
use crate::group::HandlerGroup;
use crate::level::Level;
use crate::processor::{Processor, ProcessorChain};
use crate::record::{Fields, Record};
use crate::remote::RemoteHandler;
use crate::session::{self, SESSION_KEY};
use crate::stash::{StashHandler, StashedRecord};
use crate::store::ListStore;

/// What an emit call did with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    /// The record went through the pipeline and every selected sink.
    Logged,
    /// The logger is disabled; nothing ran.
    Disabled,
}

impl LogOutcome {
    pub fn is_logged(self) -> bool {
        self == LogOutcome::Logged
    }
}

/// Request-scoped structured logger.
///
/// Each emit builds a [`Record`], runs it through the processor chain
/// (identities, session, timer, memory), formats it once with
/// [`QLogFormatter`] and hands the payload to the [`HandlerGroup`].
/// Everything happens inside the emitting call.
///
/// One instance is meant to be created per request (or process) by the
/// host and passed to whoever logs; it is not a global.
///
/// ```no_run
/// # async fn run() -> qlog::error::Result<()> {
/// use std::sync::Arc;
/// use qlog::{config::QLogConfig, logger::QLogger, store::MemoryListStore};
/// use serde_json::json;
///
/// let mut logger = QLogger::new(Arc::new(MemoryListStore::new()), QLogConfig::new("qlog"))?;
/// logger.id_by("user_id", 42)?.in_sql().info("select 1", json!({}))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct QLogger {
    default_channel: String,
    next_channel: Option<String>,
    disabled: bool,
    session: String,
    processors: ProcessorChain,
    formatter: QLogFormatter,
    handlers: HandlerGroup,
}

impl QLogger {
    /// Build a logger writing its remote records to `store`.
    ///
    /// Fails with [`QLogError::Configuration`] when `queue_name` is missing
    /// or empty, or `size` is zero.
    pub fn new(store: Arc<dyn ListStore>, config: QLogConfig) -> Result<Self> {
        let queue_name = config.validate()?.to_string();

        let session = config
            .session
            .filter(|session| !session.is_empty())
            .unwrap_or_else(session::generate);

        let remote = RemoteHandler::new(store, queue_name, config.size, config.remote_timeout);
        let handlers = HandlerGroup::new(StashHandler::new(), remote, config.log_to, config.fan_out);

        info!(
            queue = handlers.remote().queue_name(),
            log_to = ?config.log_to,
            disabled = config.disable,
            "qlog logger created"
        );

        Ok(QLogger {
            default_channel: config.default_channel,
            next_channel: None,
            disabled: config.disable,
            processors: ProcessorChain::new(session.clone()),
            session,
            formatter: QLogFormatter,
            handlers,
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// The session stamped on every record of this logger.
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Cookie `(name, value)` propagating the session to downstream calls.
    pub fn session_cookie(&self) -> (&'static str, &str) {
        (SESSION_KEY, &self.session)
    }

    pub fn default_channel(&self) -> &str {
        &self.default_channel
    }

    /// Channel the next emit will use.
    pub fn channel(&self) -> &str {
        self.next_channel.as_deref().unwrap_or(&self.default_channel)
    }

    /// Select the channel for the next emit only. Later emits fall back
    /// to the default channel.
    pub fn in_channel(&mut self, channel: impl Into<String>) -> &mut Self {
        self.next_channel = Some(channel.into());
        self
    }

    pub fn select(&mut self, channel: Channel) -> &mut Self {
        self.in_channel(channel)
    }

    pub fn in_app(&mut self) -> &mut Self {
        self.select(Channel::App)
    }

    pub fn in_sql(&mut self) -> &mut Self {
        self.select(Channel::Sql)
    }

    pub fn in_api(&mut self) -> &mut Self {
        self.select(Channel::Api)
    }

    pub fn in_req(&mut self) -> &mut Self {
        self.select(Channel::Req)
    }

    pub fn in_resp(&mut self) -> &mut Self {
        self.select(Channel::Resp)
    }

    /// Register or overwrite an identity carried by every following
    /// record. `key` must end with `_id`.
    pub fn id_by(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        self.processors.ids_mut().set_id(key, value)?;
        Ok(self)
    }

    pub fn identities(&self) -> &Fields {
        self.processors.ids().identities()
    }

    /// Append a processor that runs after the built-in ones. It cannot
    /// override the caller's `message`, `context`, `level` or `channel`.
    pub fn push_processor(&mut self, processor: impl Processor + 'static) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Emit a record.
    ///
    /// `context` must be a JSON object (or `null` for none). A pending
    /// channel selection is consumed even when the logger is disabled.
    pub async fn log(
        &mut self,
        level: Level,
        message: impl Into<String>,
        context: Value,
    ) -> Result<LogOutcome> {
        let context = into_context(context)?;
        let channel = self
            .next_channel
            .take()
            .unwrap_or_else(|| self.default_channel.clone());

        if self.disabled {
            return Ok(LogOutcome::Disabled);
        }

        let record = self.processors.run(Record::new(channel, level, message, context));
        let formatted = self.formatter.format(&record)?;
        self.handlers.dispatch(level, &formatted).await?;
        Ok(LogOutcome::Logged)
    }

    pub async fn debug(&mut self, message: impl Into<String>, context: Value) -> Result<LogOutcome> {
        self.log(Level::Debug, message, context).await
    }

    pub async fn info(&mut self, message: impl Into<String>, context: Value) -> Result<LogOutcome> {
        self.log(Level::Info, message, context).await
    }

    pub async fn notice(&mut self, message: impl Into<String>, context: Value) -> Result<LogOutcome> {
        self.log(Level::Notice, message, context).await
    }

    pub async fn warning(&mut self, message: impl Into<String>, context: Value) -> Result<LogOutcome> {
        self.log(Level::Warning, message, context).await
    }

    pub async fn error(&mut self, message: impl Into<String>, context: Value) -> Result<LogOutcome> {
        self.log(Level::Error, message, context).await
    }

    pub async fn critical(&mut self, message: impl Into<String>, context: Value) -> Result<LogOutcome> {
        self.log(Level::Critical, message, context).await
    }

    pub async fn alert(&mut self, message: impl Into<String>, context: Value) -> Result<LogOutcome> {
        self.log(Level::Alert, message, context).await
    }

    pub async fn emergency(&mut self, message: impl Into<String>, context: Value) -> Result<LogOutcome> {
        self.log(Level::Emergency, message, context).await
    }

    /// Log a database query on the `sql` channel.
    pub async fn log_sql(&mut self, query: &SqlQuery) -> Result<LogOutcome> {
        self.in_sql().info(query.message(), Value::Null).await
    }

    /// Log an outbound API call on the `api` channel, at error level when
    /// the call failed.
    pub async fn log_api(&mut self, call: &ApiCall) -> Result<LogOutcome> {
        let level = if call.failed() { Level::Error } else { Level::Info };
        self.in_api()
            .log(level, call.message(), Value::Object(call.context()))
            .await
    }

    pub fn stash(&self) -> &StashHandler {
        self.handlers.stash()
    }

    pub fn stashed(&self) -> Vec<StashedRecord> {
        self.handlers.stash().stashed()
    }

    pub fn stashed_by<P>(&self, predicate: P) -> Vec<StashedRecord>
    where
        P: Fn(&StashedRecord) -> bool,
    {
        self.handlers.stash().stashed_by(predicate)
    }

    pub fn clean(&mut self) {
        self.handlers.stash_mut().clean();
    }

    pub fn stash_len(&self) -> usize {
        self.handlers.stash().stash_len()
    }

    pub fn shift(&mut self) -> Option<StashedRecord> {
        self.handlers.stash_mut().shift()
    }

    pub fn pop(&mut self) -> Option<StashedRecord> {
        self.handlers.stash_mut().pop()
    }
}

fn into_context(context: Value) -> Result<Fields> {
    match context {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Fields::new()),
        other => Err(QLogError::InvalidArgument(format!(
            "context must be a JSON object, got `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogTo;
    use crate::store::MemoryListStore;
    use serde_json::json;

    fn stash_logger() -> QLogger {
        let config = QLogConfig {
            log_to: LogTo::Stash,
            ..QLogConfig::new("q")
        };
        QLogger::new(Arc::new(MemoryListStore::new()), config).unwrap()
    }

    #[test]
    fn test_channel_selection_is_pending_until_emit() {
        let mut logger = stash_logger();
        assert_eq!(logger.channel(), "app");
        logger.in_resp();
        assert_eq!(logger.channel(), "resp");
        assert_eq!(logger.default_channel(), "app");
    }

    #[test]
    fn test_session_from_config() {
        let config = QLogConfig {
            session: Some("seeded".to_string()),
            ..QLogConfig::new("q")
        };
        let logger = QLogger::new(Arc::new(MemoryListStore::new()), config).unwrap();
        assert_eq!(logger.session(), "seeded");
        assert_eq!(logger.session_cookie(), ("QLOG_SESSION", "seeded"));
    }

    #[test]
    fn test_empty_session_is_regenerated() {
        let config = QLogConfig {
            session: Some(String::new()),
            ..QLogConfig::new("q")
        };
        let logger = QLogger::new(Arc::new(MemoryListStore::new()), config).unwrap();
        assert_eq!(logger.session().len(), 32);
    }

    #[tokio::test]
    async fn test_non_object_context_is_rejected() {
        let mut logger = stash_logger();
        logger.in_sql();
        let err = logger.info("m", json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, QLogError::InvalidArgument(_)));
        assert_eq!(logger.stash_len(), 0);
        assert_eq!(logger.channel(), "sql");
    }

    #[tokio::test]
    async fn test_null_context_is_empty() {
        let mut logger = stash_logger();
        logger.notice("m", Value::Null).await.unwrap();
        assert_eq!(logger.pop().unwrap()["context"], json!({}));
    }

    #[tokio::test]
    async fn test_every_level_emits() {
        let mut logger = stash_logger();
        logger.debug("m", json!({})).await.unwrap();
        logger.info("m", json!({})).await.unwrap();
        logger.notice("m", json!({})).await.unwrap();
        logger.warning("m", json!({})).await.unwrap();
        logger.error("m", json!({})).await.unwrap();
        logger.critical("m", json!({})).await.unwrap();
        logger.alert("m", json!({})).await.unwrap();
        logger.emergency("m", json!({})).await.unwrap();

        let levels: Vec<_> = logger.stashed().iter().map(|r| r["level"].clone()).collect();
        let expected: Vec<_> = Level::ALL.iter().map(|l| json!(l.value())).collect();
        assert_eq!(levels, expected);
    }

    #[tokio::test]
    async fn test_pushed_processor_fields_reach_the_wire() {
        struct Host;
        impl Processor for Host {
            fn process(&mut self, mut record: Record) -> Record {
                record.fields.insert("host".to_string(), json!("web-1"));
                record
            }
        }

        let mut logger = stash_logger();
        logger.push_processor(Host).info("m", json!({})).await.unwrap();
        assert_eq!(logger.pop().unwrap()["host"], json!("web-1"));
    }

    #[tokio::test]
    async fn test_pushed_processor_cannot_rewrite_caller_values() {
        struct Meddler;
        impl Processor for Meddler {
            fn process(&mut self, mut record: Record) -> Record {
                record.fields.insert("message".to_string(), json!("rewritten"));
                record.fields.insert("context".to_string(), json!({"rewritten": true}));
                record.fields.insert("channel".to_string(), json!("other"));
                record
            }
        }

        let mut logger = stash_logger();
        logger
            .push_processor(Meddler)
            .in_sql()
            .info("original", json!({"kept": 1}))
            .await
            .unwrap();
        let log = logger.pop().unwrap();
        assert_eq!(log["message"], json!("original"));
        assert_eq!(log["context"], json!({"kept": 1}));
        assert_eq!(log["channel"], json!("sql"));
    }
}
