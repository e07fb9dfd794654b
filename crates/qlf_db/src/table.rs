//! Text form of the feature table (`features.db`).
//!
//! One feature per line, sorted by name. The width column is redundant with
//! the number of addresses and is checked on load, so a truncated or
//! hand-edited line is caught early.
//!
//! # Format
//!
//! ```text
//! # qlf_fasm feature table
//! # device: qlf_k4n8
//! fpga_top.grid_clb_1_.FF_EN 1 r0:7:3
//! fpga_top.grid_clb_1_.LUT_INIT 4 r0:0:0 r0:0:1 r0:0:2 r0:0:3
//! ```
//!
//! Addresses are listed least significant bit first.

use crate::error::DatabaseError;
use crate::feature::Feature;
use crate::geometry::DeviceGeometry;
use std::fmt::Write as _;
use std::path::Path;

/// Renders features as a text table.
///
/// Features are written in the order given; callers pass the name-sorted
/// list held by a [`FeatureDatabase`](crate::FeatureDatabase).
pub fn write_table(device: &str, geometry: &DeviceGeometry, features: &[Feature]) -> String {
    let mut out = String::new();
    out.push_str("# qlf_fasm feature table\n");
    let _ = writeln!(out, "# device: {device}");
    let _ = writeln!(out, "# features: {}", features.len());
    for feature in features {
        out.push_str(feature.name());
        let _ = write!(out, " {}", feature.width());
        for addr in feature.bits() {
            out.push(' ');
            out.push_str(&geometry.format_address(*addr));
        }
        out.push('\n');
    }
    out
}

/// Parses a text table against a geometry.
///
/// Blank lines and `#` comments are skipped. `path` is only used to label
/// errors.
///
/// # Errors
///
/// Returns [`DatabaseError::Malformed`] with the 1-based line number if a
/// line lacks a width, the width is not a positive integer, the address
/// count differs from the width, or an address does not parse against the
/// geometry.
pub fn parse_table(
    content: &str,
    geometry: &DeviceGeometry,
    path: &Path,
) -> Result<Vec<Feature>, DatabaseError> {
    let malformed = |line: usize, reason: String| DatabaseError::Malformed {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut features = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            continue;
        };
        let width = parts
            .next()
            .ok_or_else(|| malformed(line_no, format!("feature '{name}' has no width")))?;
        let width: u32 = width
            .parse()
            .ok()
            .filter(|w| *w > 0)
            .ok_or_else(|| malformed(line_no, format!("invalid width '{width}' for '{name}'")))?;

        let bits = parts
            .map(|spec| geometry.parse_address(spec))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| malformed(line_no, e.to_string()))?;

        if bits.len() as u32 != width {
            return Err(malformed(
                line_no,
                format!(
                    "feature '{name}' declares width {width} but lists {} addresses",
                    bits.len()
                ),
            ));
        }

        features.push(Feature::new(name, bits));
    }

    Ok(features)
}
