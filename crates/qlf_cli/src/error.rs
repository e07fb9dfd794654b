//! The single error type reported by the command-line tools.

use std::path::PathBuf;

/// Any failure of a command-line tool.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Loading the configuration file failed.
    #[error(transparent)]
    Config(#[from] qlf_config::ConfigError),

    /// Loading, building or saving a feature database failed.
    #[error(transparent)]
    Database(#[from] qlf_db::DatabaseError),

    /// The FASM input is malformed.
    #[error(transparent)]
    Parse(#[from] qlf_fasm::ParseError),

    /// An assignment or image does not fit the database.
    #[error(transparent)]
    Lookup(#[from] qlf_asm::LookupError),

    /// A bitstream image could not be decoded.
    #[error(transparent)]
    Encoding(#[from] qlf_bitstream::EncodingError),

    /// Reading an input or writing an output failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The command line does not determine what to do.
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_error_is_transparent() {
        let err = CliError::from(qlf_asm::LookupError::NoMatch("FF".to_string()));
        assert_eq!(err.to_string(), "no feature matches 'FF'");
    }

    #[test]
    fn io_error_names_path() {
        let err = CliError::io(
            "out.bit",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "out.bit: denied");
    }
}
