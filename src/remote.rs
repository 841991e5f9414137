use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::SinkError;
use crate::handler::Handler;
use crate::level::Level;
use crate::store::ListStore;

/// Sink that appends formatted records to a bounded list in an external
/// [`ListStore`].
///
/// After every write the list holds at most `size` entries, the newest
/// ones, in push order. With several writers sharing a queue, the last
/// writer's `size` is the one that applies.
pub struct RemoteHandler {
    store: Arc<dyn ListStore>,
    queue_name: String,
    size: usize,
    level: Level,
    timeout: Duration,
}

impl RemoteHandler {
    /// **Parameters**
    /// - `store`: shared list store the queue lives in.
    /// - `queue_name`: key of the list.
    /// - `size`: maximum number of entries kept.
    /// - `timeout`: bound on a single store round trip. A timed-out write
    ///   may still have been stored.
    pub fn new(
        store: Arc<dyn ListStore>,
        queue_name: impl Into<String>,
        size: usize,
        timeout: Duration,
    ) -> Self {
        RemoteHandler {
            store,
            queue_name: queue_name.into(),
            size,
            level: Level::Debug,
            timeout,
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

#[async_trait]
impl Handler for RemoteHandler {
    fn level(&self) -> Level {
        self.level
    }

    async fn write(&mut self, formatted: &str) -> Result<(), SinkError> {
        let push = self.store.push_capped(&self.queue_name, formatted, self.size);
        match timeout(self.timeout, push).await {
            Ok(Ok(())) => {
                debug!(queue = %self.queue_name, size = self.size, "pushed record to remote queue");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(queue = %self.queue_name, error = %e, "remote queue rejected record");
                Err(e)
            }
            Err(_) => {
                warn!(queue = %self.queue_name, timeout = ?self.timeout, "remote queue timed out");
                Err(SinkError::Timeout(self.timeout))
            }
        }
    }
}
