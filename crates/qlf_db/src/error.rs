//! Error types for loading, validating and building feature databases.

use std::path::PathBuf;

/// Errors raised while loading, validating or building a feature database.
///
/// Every variant means the database (or the description it is built from) is
/// unusable; conversions abort before producing output.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// An I/O error occurred while reading or writing database files.
    #[error("database I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A JSON document (manifest or description) could not be parsed.
    #[error("failed to parse {path}: {reason}")]
    Json {
        /// The file being parsed.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A line of a feature table is malformed.
    #[error("{path}:{line}: {reason}")]
    Malformed {
        /// The feature table path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// The manifest or binary table was written by an incompatible version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The offending file.
        path: PathBuf,
        /// The version this build understands.
        expected: u32,
        /// The version found in the file.
        actual: u32,
    },

    /// The feature table does not match the checksum recorded in the manifest.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The feature table path.
        path: PathBuf,
        /// The checksum recorded in the manifest.
        expected: String,
        /// The checksum computed from the file.
        actual: String,
    },

    /// A bincode encode or decode failure.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },

    /// The zone table is empty or inconsistent.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A feature name is not a dotted FASM identifier.
    #[error("invalid feature name '{0}'")]
    InvalidName(String),

    /// Two features share one name.
    #[error("duplicate feature '{0}'")]
    DuplicateFeature(String),

    /// A feature has no bits.
    #[error("feature '{0}' has no bits")]
    EmptyFeature(String),

    /// A feature bit lies outside the device geometry.
    #[error("feature '{name}' bit {position} at {address} is outside the device geometry")]
    AddressOutOfRange {
        /// The feature name.
        name: String,
        /// The bit position within the feature.
        position: u32,
        /// The offending address, formatted as `zone:word:bit`.
        address: String,
    },

    /// One configuration bit is claimed by two feature bits.
    #[error("bit {address} is claimed by both {first} and {second}")]
    DuplicateBitClaim {
        /// The contested address, formatted as `zone:word:bit`.
        address: String,
        /// The first claimant, formatted as `name[position]`.
        first: String,
        /// The second claimant, formatted as `name[position]`.
        second: String,
    },

    /// A description cell references an address that cannot be resolved.
    #[error("unresolvable address for '{name}': {reason}")]
    UnresolvedAddress {
        /// The full feature name of the cell.
        name: String,
        /// Why resolution failed.
        reason: String,
    },

    /// One feature name is defined with incompatible widths.
    #[error("feature '{name}' has conflicting definitions: {reason}")]
    ConflictingWidth {
        /// The feature name.
        name: String,
        /// Description of the conflict.
        reason: String,
    },

    /// The bitstream-definition description is structurally invalid.
    #[error("invalid description: {0}")]
    Description(String),

    /// The requested device has no database under the root.
    #[error("no database for device '{device}' under {root}")]
    UnknownDevice {
        /// The database root.
        root: PathBuf,
        /// The requested device name.
        device: String,
    },

    /// No device was named and the root does not identify exactly one.
    #[error("database root {root} holds {count} devices; select one with --device ({available})")]
    AmbiguousRoot {
        /// The database root.
        root: PathBuf,
        /// Number of devices found.
        count: usize,
        /// Comma-separated device names.
        available: String,
    },
}

/// Failure to parse a `zone:word:bit` address against a geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The text does not have three `:`-separated parts.
    #[error("invalid address '{text}': expected 'zone:word:bit'")]
    Malformed {
        /// The address text.
        text: String,
    },
    /// The zone name is not in the geometry.
    #[error("unknown zone '{zone}' in address '{text}'")]
    UnknownZone {
        /// The zone name.
        zone: String,
        /// The address text.
        text: String,
    },
    /// The word offset is not a `u32`.
    #[error("invalid word offset in '{text}': {source}")]
    InvalidWord {
        /// The address text.
        text: String,
        /// The integer parse failure.
        source: std::num::ParseIntError,
    },
    /// The bit index is not a `u8`.
    #[error("invalid bit index in '{text}': {source}")]
    InvalidBit {
        /// The address text.
        text: String,
        /// The integer parse failure.
        source: std::num::ParseIntError,
    },
    /// The word or bit lies outside the zone.
    #[error("address '{text}' is outside zone '{zone}'")]
    OutOfZone {
        /// The zone name.
        zone: String,
        /// The address text.
        text: String,
    },
}

impl DatabaseError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatabaseError::Io {
            path: path.into(),
            source,
        }
    }
}
