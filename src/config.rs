use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use std::time::Duration;

use crate::channel::Channel;
use crate::env::{
    QLOG_DEFAULT_CHANNEL_ENV, QLOG_DISABLE_ENV, QLOG_FAN_OUT_ENV, QLOG_LOG_TO_ENV,
    QLOG_QUEUE_NAME_ENV, QLOG_REMOTE_TIMEOUT_MS_ENV, QLOG_SIZE_ENV,
};
use crate::error::{QLogError, Result};

pub const DEFAULT_SIZE: usize = 3000;
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(2);

/// Which sinks receive records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "LogToRepr")]
pub enum LogTo {
    Stash,
    #[default]
    Remote,
    Both,
}

impl LogTo {
    pub fn includes_stash(self) -> bool {
        matches!(self, LogTo::Stash | LogTo::Both)
    }

    pub fn includes_remote(self) -> bool {
        matches!(self, LogTo::Remote | LogTo::Both)
    }
}

impl FromStr for LogTo {
    type Err = QLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "stash" => Ok(LogTo::Stash),
            "1" | "remote" | "redis" => Ok(LogTo::Remote),
            "2" | "both" => Ok(LogTo::Both),
            other => Err(QLogError::Configuration(format!(
                "`log_to` must be stash, remote or both, got `{other}`"
            ))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LogToRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<LogToRepr> for LogTo {
    type Error = QLogError;

    fn try_from(repr: LogToRepr) -> Result<Self> {
        match repr {
            LogToRepr::Code(code) => code.to_string().parse(),
            LogToRepr::Name(name) => name.parse(),
        }
    }
}

/// What the dispatcher does when a sink write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// Stop at the first failing sink and return its error.
    #[default]
    FailFast,
    /// Write to every selected sink, then return the first error.
    BestEffort,
}

impl FromStr for FanOut {
    type Err = QLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" => Ok(FanOut::FailFast),
            "best_effort" | "best-effort" => Ok(FanOut::BestEffort),
            other => Err(QLogError::Configuration(format!(
                "`fan_out` must be fail_fast or best_effort, got `{other}`"
            ))),
        }
    }
}

/// Logger configuration.
///
/// Only `queue_name` is required; everything else has a default:
/// - `disable`: `false`.
/// - `default_channel`: `"app"`.
/// - `size`: `3000` entries kept in the remote list.
/// - `log_to`: [`LogTo::Remote`].
/// - `fan_out`: [`FanOut::FailFast`].
/// - `remote_timeout`: 2 s per remote write (milliseconds when deserialized).
/// - `session`: `None`, meaning a random session is generated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QLogConfig {
    pub queue_name: Option<String>,
    pub disable: bool,
    pub default_channel: String,
    pub size: usize,
    pub log_to: LogTo,
    pub fan_out: FanOut,
    #[serde(rename = "remote_timeout_ms", deserialize_with = "duration_from_ms")]
    pub remote_timeout: Duration,
    pub session: Option<String>,
}

impl Default for QLogConfig {
    fn default() -> Self {
        Self {
            queue_name: None,
            disable: false,
            default_channel: Channel::App.as_str().to_string(),
            size: DEFAULT_SIZE,
            log_to: LogTo::default(),
            fan_out: FanOut::default(),
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            session: None,
        }
    }
}

fn duration_from_ms<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

impl QLogConfig {
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: Some(queue_name.into()),
            ..Self::default()
        }
    }

    /// Build a configuration from `QLOG_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup, using the `QLOG_*` names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            queue_name: lookup(QLOG_QUEUE_NAME_ENV),
            ..Self::default()
        };
        if let Some(disable) = lookup(QLOG_DISABLE_ENV) {
            config.disable = parse_bool(QLOG_DISABLE_ENV, &disable)?;
        }
        if let Some(channel) = lookup(QLOG_DEFAULT_CHANNEL_ENV) {
            config.default_channel = channel;
        }
        if let Some(size) = lookup(QLOG_SIZE_ENV) {
            config.size = parse_number(QLOG_SIZE_ENV, &size)?;
        }
        if let Some(log_to) = lookup(QLOG_LOG_TO_ENV) {
            config.log_to = log_to.parse()?;
        }
        if let Some(fan_out) = lookup(QLOG_FAN_OUT_ENV) {
            config.fan_out = fan_out.parse()?;
        }
        if let Some(ms) = lookup(QLOG_REMOTE_TIMEOUT_MS_ENV) {
            config.remote_timeout = Duration::from_millis(parse_number(QLOG_REMOTE_TIMEOUT_MS_ENV, &ms)?);
        }
        Ok(config)
    }

    /// Debugging override: logging is forced on and records go to
    /// `log_to`, or to the stash when none is given.
    pub fn debugging(mut self, log_to: Option<LogTo>) -> Self {
        self.disable = false;
        self.log_to = log_to.unwrap_or(LogTo::Stash);
        self
    }

    /// Check the configuration and return the queue name.
    pub fn validate(&self) -> Result<&str> {
        let queue_name = match self.queue_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                return Err(QLogError::Configuration(
                    "`queue_name` can not be empty".to_string(),
                ))
            }
        };
        if self.size == 0 {
            return Err(QLogError::Configuration(
                "`size` must be a positive integer".to_string(),
            ));
        }
        Ok(queue_name)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(QLogError::Configuration(format!(
            "`{key}` must be a boolean, got `{other}`"
        ))),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        QLogError::Configuration(format!("`{key}` must be a positive integer, got `{value}`"))
    })
}
