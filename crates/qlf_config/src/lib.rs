//! Optional `qlf_fasm.toml` configuration.
//!
//! ```toml
//! [convert]
//! db_root = "database"
//! device = "qlf_k4n8"
//! layout = "packed-binary"
//! unset_features = false
//! force_bit = false
//!
//! [log]
//! level = "info"
//! ```
//!
//! Command-line flags always take precedence over values loaded here.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{discover_config, load_config, load_config_from_str, CONFIG_FILE};
pub use types::{ConvertConfig, LogConfig, ToolConfig};
