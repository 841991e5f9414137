use std::time::Duration;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, QLogError>;

/// Errors surfaced by [`QLogger`](crate::logger::QLogger) and its parts.
///
/// None of these are ever logged through the pipeline that produced them.
#[derive(thiserror::Error, Debug)]
pub enum QLogError {
    /// Required configuration is missing or malformed. Raised at
    /// construction and never recovered.
    #[error("config item {0}")]
    Configuration(String),

    /// A caller passed a malformed argument. Logger state is unchanged.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A sink refused the formatted record.
    #[error("sink write failed: {0}")]
    SinkWrite(#[from] SinkError),

    /// The record could not be serialized.
    #[error("failed to format record: {0}")]
    Format(#[source] serde_json::Error),
}

/// Failure of a single sink write.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("list store error: {0}")]
    Store(String),

    #[error("list store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("formatted payload is not a JSON object: {0}")]
    Decode(#[source] serde_json::Error),
}
