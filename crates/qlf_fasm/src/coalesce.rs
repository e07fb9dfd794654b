//! Merging ranged fragments into whole-feature assignments.
//!
//! A feature may be set by several lines, each covering some of its bits
//! (`X[1:0] = 2'b10`, `X[3] = 1`). Coalescing groups fragments by name and
//! builds one [`FasmAssignment`] per feature, so the assembler only ever sees
//! complete values.

use crate::assignment::{BitRange, FasmAssignment, FasmLine, Fragment};
use crate::error::{ParseError, ParseErrorKind};
use crate::value::FeatureValue;
use std::collections::BTreeMap;
use tracing::debug;

/// Coalesces parsed lines into assignments sorted by feature name.
///
/// `declared_width` supplies the width a feature has in the database, or
/// `None` for unknown features. A feature set by a single unranged line keeps
/// that line's width unchanged, so width mismatches are reported by the
/// assembler against the declared width. An unknown feature is passed through
/// as its first fragment, leaving the assembler to report it by name and line.
/// Every other feature is merged into one value of the declared width;
/// unassigned bits are 0.
///
/// # Errors
///
/// Returns a [`ParseError`] at the offending fragment if a bit index is at or
/// beyond the declared width, or a bit is assigned by two fragments.
pub fn coalesce<F>(lines: &[FasmLine], declared_width: F) -> Result<Vec<FasmAssignment>, ParseError>
where
    F: Fn(&str) -> Option<u32>,
{
    let mut groups: BTreeMap<&str, Vec<(&FasmLine, &Fragment)>> = BTreeMap::new();
    for line in lines {
        if let Some(fragment) = &line.fragment {
            groups
                .entry(fragment.name.as_str())
                .or_default()
                .push((line, fragment));
        }
    }

    let mut assignments = Vec::with_capacity(groups.len());
    for (name, fragments) in groups {
        let (first_line, first) = fragments[0];
        if fragments.len() == 1 && first.range.is_none() {
            assignments.push(
                FasmAssignment::new(name, first.value.clone()).with_line(first_line.line),
            );
            continue;
        }

        let Some(width) = declared_width(name) else {
            assignments.push(
                FasmAssignment::new(name, first.value.clone()).with_line(first_line.line),
            );
            continue;
        };
        let spans: Vec<BitRange> = fragments
            .iter()
            .map(|(_, f)| span_of(f))
            .collect();

        let mut value = FeatureValue::zero(width);
        let mut assigned = vec![false; width as usize];
        for ((line, fragment), span) in fragments.iter().zip(&spans) {
            let error = |kind| ParseError::new(line.line, fragment.column, line.text.clone(), kind);
            if span.hi >= width {
                return Err(error(ParseErrorKind::IndexOutOfRange {
                    name: name.to_string(),
                    index: span.hi,
                    width,
                }));
            }
            for offset in 0..span.width() {
                let index = span.lo + offset;
                if std::mem::replace(&mut assigned[index as usize], true) {
                    return Err(error(ParseErrorKind::DuplicateBit {
                        name: name.to_string(),
                        index,
                    }));
                }
                value.set_bit(index, fragment.value.bit(offset));
            }
        }

        debug!(
            feature = name,
            fragments = fragments.len(),
            width,
            "coalesced ranged fragments"
        );
        assignments.push(FasmAssignment::new(name, value).with_line(first_line.line));
    }

    Ok(assignments)
}

/// The bits a fragment covers; an unranged fragment covers `[width-1:0]`.
fn span_of(fragment: &Fragment) -> BitRange {
    fragment.range.unwrap_or(BitRange {
        hi: fragment.value.width() - 1,
        lo: 0,
    })
}
