use tracing::{debug, warn};

use crate::config::{FanOut, LogTo};
use crate::error::SinkError;
use crate::handler::Handler;
use crate::level::Level;
use crate::remote::RemoteHandler;
use crate::stash::StashHandler;

/// Fans one formatted record out to the sinks selected at construction.
///
/// Sinks are always written in the same order: stash, then remote. The
/// payload is formatted once by the caller and handed to each sink as is.
pub struct HandlerGroup {
    stash: StashHandler,
    remote: RemoteHandler,
    log_to: LogTo,
    fan_out: FanOut,
}

impl HandlerGroup {
    pub fn new(stash: StashHandler, remote: RemoteHandler, log_to: LogTo, fan_out: FanOut) -> Self {
        HandlerGroup {
            stash,
            remote,
            log_to,
            fan_out,
        }
    }

    pub fn log_to(&self) -> LogTo {
        self.log_to
    }

    pub fn fan_out(&self) -> FanOut {
        self.fan_out
    }

    pub fn stash(&self) -> &StashHandler {
        &self.stash
    }

    pub fn stash_mut(&mut self) -> &mut StashHandler {
        &mut self.stash
    }

    pub fn remote(&self) -> &RemoteHandler {
        &self.remote
    }

    fn active(&mut self) -> Vec<&mut dyn Handler> {
        let mut handlers: Vec<&mut dyn Handler> = Vec::with_capacity(2);
        if self.log_to.includes_stash() {
            handlers.push(&mut self.stash);
        }
        if self.log_to.includes_remote() {
            handlers.push(&mut self.remote);
        }
        handlers
    }

    /// Deliver `formatted` to every selected sink handling `level`.
    ///
    /// **Returns**
    /// - `Ok(())` if every write succeeded.
    /// - `Err(..)` with the first failure. Under [`FanOut::FailFast`] the
    ///   remaining sinks are skipped; under [`FanOut::BestEffort`] they are
    ///   still written.
    pub async fn dispatch(&mut self, level: Level, formatted: &str) -> Result<(), SinkError> {
        let fan_out = self.fan_out;
        let mut first_err: Option<SinkError> = None;

        for handler in self.active() {
            if !handler.is_handling(level) {
                continue;
            }
            if let Err(e) = handler.write(formatted).await {
                match fan_out {
                    FanOut::FailFast => return Err(e),
                    FanOut::BestEffort => {
                        warn!(error = %e, "sink write failed, continuing with remaining sinks");
                        first_err.get_or_insert(e);
                    }
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                debug!(log_to = ?self.log_to, severity = %level, "record dispatched");
                Ok(())
            }
        }
    }
}
