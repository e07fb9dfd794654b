//! Command-line front ends of the QLF FASM tools.
//!
//! Each binary parses its [`args`], then calls the matching `run`:
//!
//! - `qlf_fasm` → [`convert::run`]
//! - `qlf_fasm_db_builder` → [`build::run`]
//! - `qlf_fasm_default` → [`default::run`]
//!
//! Every failure surfaces as a [`CliError`]; the binaries print it as
//! `error: <message>` and exit with status 1.

#![warn(missing_docs)]

pub mod args;
pub mod build;
pub mod convert;
pub mod default;
pub mod error;

pub use error::CliError;

use qlf_common::LogLevel;
use qlf_config::ToolConfig;

/// Picks the log level: the flag, else the configuration, else `warn`.
pub fn log_level(flag: Option<LogLevel>, config: &ToolConfig) -> LogLevel {
    flag.or(config.log.level).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_precedence() {
        let config = qlf_config::load_config_from_str("[log]\nlevel = \"info\"\n").unwrap();
        assert_eq!(log_level(Some(LogLevel::Error), &config), LogLevel::Error);
        assert_eq!(log_level(None, &config), LogLevel::Info);
        assert_eq!(log_level(None, &ToolConfig::default()), LogLevel::Warn);
    }
}
