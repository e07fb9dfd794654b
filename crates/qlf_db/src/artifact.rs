//! Binary form of the feature table (`features.bin`).
//!
//! The table is a bincode payload preceded by a validated header: a 4-byte
//! little-endian header length, the bincode-encoded [`TableHeader`], then the
//! payload. Every validation failure is reported as a [`DatabaseError`].

use crate::error::DatabaseError;
use crate::feature::Feature;
use qlf_common::ContentHash;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Magic bytes identifying a binary feature table.
pub const TABLE_MAGIC: [u8; 4] = *b"QLFD";

/// Current binary table format version.
pub const TABLE_FORMAT_VERSION: u32 = 1;

/// Header prepended to every binary feature table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableHeader {
    /// Magic bytes: must be `b"QLFD"`.
    pub magic: [u8; 4],
    /// Table format version.
    pub format_version: u32,
    /// Version of the tool that wrote the table.
    pub tool_version: String,
    /// Content hash of the payload.
    pub checksum: ContentHash,
}

/// Encodes features as a binary table.
///
/// # Errors
///
/// Returns [`DatabaseError::Serialization`] if bincode fails to encode.
pub fn encode_table(features: &[Feature]) -> Result<Vec<u8>, DatabaseError> {
    let config = bincode::config::standard();
    let payload = bincode::serde::encode_to_vec(features, config).map_err(|e| {
        DatabaseError::Serialization {
            reason: e.to_string(),
        }
    })?;

    let header = TableHeader {
        magic: TABLE_MAGIC,
        format_version: TABLE_FORMAT_VERSION,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes =
        bincode::serde::encode_to_vec(&header, config).map_err(|e| DatabaseError::Serialization {
            reason: e.to_string(),
        })?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Decodes a binary table, validating magic, version and payload checksum.
///
/// `path` is only used to label errors.
///
/// # Errors
///
/// - [`DatabaseError::Malformed`] if the data is truncated or the magic is wrong
/// - [`DatabaseError::VersionMismatch`] for an unknown format version
/// - [`DatabaseError::ChecksumMismatch`] if the payload does not match its hash
/// - [`DatabaseError::Serialization`] if bincode fails to decode
pub fn decode_table(raw: &[u8], path: &Path) -> Result<Vec<Feature>, DatabaseError> {
    let malformed = |reason: &str| DatabaseError::Malformed {
        path: path.to_path_buf(),
        line: 0,
        reason: reason.to_string(),
    };

    let Some(len_bytes) = raw.get(..4) else {
        return Err(malformed("truncated table header"));
    };
    let mut len = [0u8; 4];
    len.copy_from_slice(len_bytes);
    let header_len = u32::from_le_bytes(len) as usize;
    let Some(header_bytes) = raw.get(4..4 + header_len) else {
        return Err(malformed("truncated table header"));
    };

    let config = bincode::config::standard();
    let header: TableHeader = bincode::serde::decode_from_slice(header_bytes, config)
        .map_err(|e| DatabaseError::Serialization {
            reason: e.to_string(),
        })?
        .0;

    if header.magic != TABLE_MAGIC {
        return Err(malformed("not a binary feature table"));
    }
    if header.format_version != TABLE_FORMAT_VERSION {
        return Err(DatabaseError::VersionMismatch {
            path: path.to_path_buf(),
            expected: TABLE_FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let payload = &raw[4 + header_len..];
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(DatabaseError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let features: Vec<Feature> = bincode::serde::decode_from_slice(payload, config)
        .map_err(|e| DatabaseError::Serialization {
            reason: e.to_string(),
        })?
        .0;
    Ok(features)
}
