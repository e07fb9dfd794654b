//! Log levels and `tracing` subscriber setup shared by the QLF binaries.
//!
//! Library crates only emit `tracing` events; installing a subscriber is left
//! to the binaries, which call [`init`] once at startup.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Verbosity threshold for diagnostic output on stderr.
///
/// Parses case-insensitively and also accepts the aliases `warning` and
/// `critical` used by older tool invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum LogLevel {
    /// Everything, including per-bit tracing.
    Trace,
    /// Per-feature detail.
    Debug,
    /// Load, build and conversion milestones.
    Info,
    /// Recoverable oddities only.
    #[default]
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Returns the `EnvFilter` directive for this level.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

/// Error returned when parsing an unknown log level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}' (expected trace, debug, info, warn or error)")]
pub struct ParseLogLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" | "critical" => Ok(LogLevel::Error),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ParseLogLevelError;

    fn try_from(value: String) -> Result<Self, <LogLevel as TryFrom<String>>::Error> {
        value.parse()
    }
}

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `level` when it is set. Calling this more
/// than once is harmless; later calls leave the first subscriber in place.
pub fn init(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
