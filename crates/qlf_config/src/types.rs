//! Configuration types deserialized from `qlf_fasm.toml`.

use qlf_bitstream::Layout;
use qlf_common::LogLevel;
use serde::Deserialize;
use std::path::PathBuf;

/// The whole configuration file. Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Defaults for `qlf_fasm` conversions.
    pub convert: ConvertConfig,
    /// Diagnostic output settings.
    pub log: LogConfig,
}

/// The `[convert]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Database root directory, relative to the configuration file.
    pub db_root: Option<PathBuf>,
    /// Device to select under the database root.
    pub device: Option<String>,
    /// Binary image layout.
    pub layout: Option<Layout>,
    /// Emit zero-valued features when disassembling.
    pub unset_features: bool,
    /// Also write a force-bit listing when disassembling.
    pub force_bit: bool,
}

/// The `[log]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Verbosity threshold.
    pub level: Option<LogLevel>,
}
