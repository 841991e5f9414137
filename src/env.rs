//! Environment variable names read by [`QLogConfig::from_env`].
//!
//! These are purely helpers; the logger itself never touches the
//! environment.
//!
//! [`QLogConfig::from_env`]: crate::config::QLogConfig::from_env

/// Name of the remote list, required.
pub const QLOG_QUEUE_NAME_ENV: &str = "QLOG_QUEUE_NAME";

/// `true`/`1` turns every emit into a no-op.
pub const QLOG_DISABLE_ENV: &str = "QLOG_DISABLE";

/// Channel used when none is selected.
pub const QLOG_DEFAULT_CHANNEL_ENV: &str = "QLOG_DEFAULT_CHANNEL";

/// Maximum length of the remote list.
pub const QLOG_SIZE_ENV: &str = "QLOG_SIZE";

/// `stash`, `remote` (or `redis`), `both`, or the codes `0`, `1`, `2`.
pub const QLOG_LOG_TO_ENV: &str = "QLOG_LOG_TO";

/// `fail_fast` or `best_effort`.
pub const QLOG_FAN_OUT_ENV: &str = "QLOG_FAN_OUT";

/// Remote write timeout in milliseconds.
pub const QLOG_REMOTE_TIMEOUT_MS_ENV: &str = "QLOG_REMOTE_TIMEOUT_MS";

/// Redis URL for hosts using the `redis` store, e.g. `redis://127.0.0.1:6379`.
pub const QLOG_REDIS_URL_ENV: &str = "QLOG_REDIS_URL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
