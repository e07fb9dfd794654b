//! Configuration file discovery and loading.

use crate::error::ConfigError;
use crate::types::ToolConfig;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "qlf_fasm.toml";

/// Loads a configuration file.
///
/// A relative `db_root` is resolved against the file's directory.
pub fn load_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = load_config_from_str(&content)?;
    if let Some(root) = config.convert.db_root.take() {
        let base = path.parent().unwrap_or(Path::new(""));
        config.convert.db_root = Some(base.join(root));
    }
    Ok(config)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ToolConfig, ConfigError> {
    let config: ToolConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Finds the configuration to use.
///
/// An explicit path must exist. Otherwise `qlf_fasm.toml` in `dir` is used
/// if present, and the built-in defaults if not.
pub fn discover_config(explicit: Option<&Path>, dir: &Path) -> Result<ToolConfig, ConfigError> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let candidate: PathBuf = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                load_config(&candidate)
            } else {
                Ok(ToolConfig::default())
            }
        }
    }
}

fn validate_config(config: &ToolConfig) -> Result<(), ConfigError> {
    if config.convert.device.as_deref().is_some_and(str::is_empty) {
        return Err(ConfigError::ValidationError(
            "convert.device must not be empty".to_string(),
        ));
    }
    if config
        .convert
        .db_root
        .as_deref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "convert.db_root must not be empty".to_string(),
        ));
    }
    Ok(())
}
