//! FASM text codec.
//!
//! FASM is a line-oriented feature-assignment format: each line names one
//! configuration feature, optionally a bit range, and optionally a Verilog-style
//! literal.
//!
//! ```text
//! # comment
//! fpga_top.grid_clb_1_.FF_EN
//! fpga_top.grid_clb_1_.LUT_INIT[3:0] = 4'b1010
//! fpga_top.grid_clb_1_.LUT_INIT[7:4] = 'hc  { note = "upper half" }
//! ```
//!
//! Parsing is split into a [`lexer`] with line/column tracking, a line
//! [`parser`] producing sized [`Fragment`]s, and [`coalesce`], which merges
//! ranged fragments into one [`FasmAssignment`] per feature. The [`writer`]
//! does the inverse.

#![warn(missing_docs)]

pub mod assignment;
pub mod coalesce;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod value;
pub mod writer;

pub use assignment::{Annotation, BitRange, FasmAssignment, FasmLine, Fragment};
pub use coalesce::coalesce;
pub use error::{ParseError, ParseErrorKind};
pub use parser::parse;
pub use value::{FeatureValue, Radix, ValueError, MAX_FEATURE_WIDTH};
pub use writer::{format_assignment, write_fasm, write_force_bit};

/// Parses FASM source and coalesces it into assignments sorted by name.
///
/// See [`coalesce`] for how `declared_width` is used.
///
/// # Errors
///
/// Returns the first [`ParseError`] from parsing or coalescing.
pub fn parse_assignments<F>(source: &str, declared_width: F) -> Result<Vec<FasmAssignment>, ParseError>
where
    F: Fn(&str) -> Option<u32>,
{
    let lines = parse(source)?;
    let assignments = coalesce(&lines, declared_width)?;
    tracing::debug!(
        lines = lines.len(),
        assignments = assignments.len(),
        "parsed FASM"
    );
    Ok(assignments)
}
