use async_trait::async_trait;

use crate::error::SinkError;
use crate::level::Level;

/// Destination for formatted records.
///
/// Handlers receive the already-formatted payload so that every sink in a
/// group stores the exact same bytes. They are driven by the
/// [`HandlerGroup`](crate::group::HandlerGroup) from inside the emitting
/// call and own whatever state they need, hence `&mut self`.
#[async_trait]
pub trait Handler: Send {
    /// Lowest severity this handler accepts.
    ///
    /// Default implementation accepts everything.
    fn level(&self) -> Level {
        Level::Debug
    }

    /// Whether a record of `level` should be written at all.
    fn is_handling(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Store one formatted record.
    ///
    /// **Returns**
    /// - `Ok(())` once the payload is stored.
    /// - `Err(..)` if the destination rejected it. The error is returned
    ///   to the emitting caller; nothing retries it.
    async fn write(&mut self, formatted: &str) -> Result<(), SinkError>;
}
