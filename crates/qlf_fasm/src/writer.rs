//! FASM and force-bit text output.

use crate::assignment::FasmAssignment;
use std::fmt::Write as _;

/// Widest value written in binary; wider values are written in hex.
pub const MAX_BINARY_WIDTH: u32 = 16;

/// Formats one assignment as a FASM line (without newline).
///
/// A width-1 value-1 assignment is written as the bare name. Other width-1
/// values are written as `name = 1'b0`. Wider values use the full range,
/// `name[W-1:0] = W'b...` up to [`MAX_BINARY_WIDTH`] bits and `W'h...` above.
pub fn format_assignment(assignment: &FasmAssignment) -> String {
    let width = assignment.width();
    let value = &assignment.value;
    if width == 1 {
        if value.bit(0) {
            assignment.name.clone()
        } else {
            format!("{} = 1'b0", assignment.name)
        }
    } else {
        format!(
            "{}[{}:0] = {}",
            assignment.name,
            width - 1,
            format_literal(assignment)
        )
    }
}

fn format_literal(assignment: &FasmAssignment) -> String {
    let width = assignment.width();
    if width <= MAX_BINARY_WIDTH {
        format!("{width}'b{}", assignment.value.to_binary_string())
    } else {
        format!("{width}'h{}", assignment.value.to_hex_string())
    }
}

/// Writes assignments as FASM text, one line each, in the given order.
pub fn write_fasm(assignments: &[FasmAssignment]) -> String {
    let mut out = String::new();
    for assignment in assignments {
        out.push_str(&format_assignment(assignment));
        out.push('\n');
    }
    out
}

/// Writes a simulator force-bit listing, one `force` statement per assignment.
///
/// ```text
/// force fpga_top.grid_clb_1_.FF_EN=1'b1;
/// force fpga_top.grid_clb_1_.LUT_INIT[3:0]=4'b1010;
/// ```
pub fn write_force_bit(assignments: &[FasmAssignment]) -> String {
    let mut out = String::new();
    for assignment in assignments {
        let width = assignment.width();
        let _ = if width == 1 {
            writeln!(
                out,
                "force {}=1'b{};",
                assignment.name,
                u8::from(assignment.value.bit(0))
            )
        } else {
            writeln!(
                out,
                "force {}[{}:0]={}'b{};",
                assignment.name,
                width - 1,
                width,
                assignment.value.to_binary_string()
            )
        };
    }
    out
}
