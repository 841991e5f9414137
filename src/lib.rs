//! Request-scoped structured logger.
//!
//! A [`QLogger`] enriches every record with identities, a session, timing
//! and memory usage, formats it once as a flat JSON object and fans it out
//! to an in-memory stash and/or a bounded remote list.

pub mod level;
pub mod record;
pub mod processor;
pub mod memory;
pub mod formatter;
pub mod handler;
pub mod stash;
pub mod store;
pub mod remote;
pub mod group;
pub mod logger;
pub mod channel;
pub mod session;
pub mod config;
pub mod env;
pub mod error;
pub mod autolog;
pub mod diagnostics;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use channel::Channel;
pub use config::{FanOut, LogTo, QLogConfig};
pub use error::{QLogError, SinkError};
pub use level::Level;
pub use logger::{LogOutcome, QLogger};
pub use stash::StashedRecord;
pub use store::{ListStore, MemoryListStore};
