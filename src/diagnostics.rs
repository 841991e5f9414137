use tracing_subscriber::filter::{EnvFilter, ParseError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Settings for the subscriber that prints this crate's own diagnostics
/// (logger creation, dispatch, remote failures).
///
/// These diagnostics go through `tracing`, never through a
/// [`QLogger`](crate::logger::QLogger).
///
/// **Fields**
/// - `filter`: `EnvFilter` directive, e.g. `"qlog=debug"`.
/// - `to_stderr`: print to stderr instead of stdout.
#[derive(Clone, Debug)]
pub struct DiagnosticsConfig {
    pub filter: String,
    pub to_stderr: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            filter: "qlog=info".to_string(),
            to_stderr: true,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DiagnosticsError {
    #[error("invalid diagnostics filter: {0}")]
    Filter(#[from] ParseError),

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install a global `tracing` subscriber for the crate's diagnostics.
///
/// Hosts that already run their own subscriber should skip this; calling
/// it then returns [`DiagnosticsError::AlreadyInstalled`] and changes
/// nothing.
pub fn init_diagnostics(config: &DiagnosticsConfig) -> Result<(), DiagnosticsError> {
    let filter = EnvFilter::try_new(&config.filter)?;

    // The writer changes the layer type, so each branch builds its own
    // subscriber.
    if config.to_stderr {
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let subscriber = Registry::default().with(filter).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(filter).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}
