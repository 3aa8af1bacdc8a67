//! Log filtering that can be changed while the service runs.
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Directives used when `RUST_LOG` isn't set.
pub const DEFAULT_DIRECTIVES: &str = "zonewarden=info,tower_http=info";

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// A filter applying this level to the service and its HTTP layers.
    #[must_use]
    pub fn filter(self) -> EnvFilter {
        let level = self.as_str();
        EnvFilter::new(format!("zonewarden={level},tower_http={level}"))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reloadable filter layer installed at the bottom of the subscriber.
pub type FilterLayer = reload::Layer<EnvFilter, Registry>;

/// A handle to the installed filter.
#[derive(Clone, Debug)]
pub struct LogFilter {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogFilter {
    /// Wrap `initial` in a reloadable layer. The layer must be installed, or at least kept
    /// alive, for [`LogFilter::set_level`] to succeed.
    #[must_use]
    pub fn new(initial: EnvFilter) -> (Self, FilterLayer) {
        let (layer, handle) = reload::Layer::new(initial);
        (Self { handle }, layer)
    }

    /// # Errors
    ///
    /// Returns [`Error::LogFilter`] if the filter layer has been dropped.
    pub fn set_level(&self, level: LogLevel) -> Result<(), Error> {
        self.handle.reload(level.filter())?;
        Ok(())
    }
}
