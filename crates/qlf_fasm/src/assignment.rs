//! Parsed FASM lines and canonical feature assignments.

use crate::value::FeatureValue;
use std::fmt;

/// An inclusive bit range `[hi:lo]`; `[n]` is `[n:n]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    /// Most significant index.
    pub hi: u32,
    /// Least significant index.
    pub lo: u32,
}

impl BitRange {
    /// Returns the number of bits covered.
    ///
    /// Parsed ranges always have `lo <= hi < MAX_FEATURE_WIDTH`.
    ///
    /// [`MAX_FEATURE_WIDTH`]: crate::value::MAX_FEATURE_WIDTH
    pub fn width(&self) -> u32 {
        self.hi - self.lo + 1
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hi == self.lo {
            write!(f, "[{}]", self.hi)
        } else {
            write!(f, "[{}:{}]", self.hi, self.lo)
        }
    }
}

/// One line's contribution to a feature, before coalescing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Full dotted feature name.
    pub name: String,
    /// Bit range, if the line addressed one.
    pub range: Option<BitRange>,
    /// The value, already sized to the fragment's target width.
    pub value: FeatureValue,
    /// 1-based column of the feature name.
    pub column: usize,
}

/// A `{key = "value"}` annotation. Annotations are kept but carry no bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation key.
    pub key: String,
    /// Unquoted annotation value.
    pub value: String,
}

/// A non-blank FASM line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FasmLine {
    /// 1-based line number.
    pub line: usize,
    /// The raw line text.
    pub text: String,
    /// The feature set on this line, if any.
    pub fragment: Option<Fragment>,
    /// Annotations attached to the line.
    pub annotations: Vec<Annotation>,
}

/// A canonical feature assignment: one feature, its complete value.
///
/// Equality compares name and value only; `line` is provenance.
#[derive(Debug, Clone)]
pub struct FasmAssignment {
    /// Full dotted feature name.
    pub name: String,
    /// The value; its width is the assignment width.
    pub value: FeatureValue,
    /// Source line of the first fragment, if parsed from text.
    pub line: Option<usize>,
}

impl FasmAssignment {
    /// Creates a synthesized assignment.
    pub fn new(name: impl Into<String>, value: FeatureValue) -> Self {
        Self {
            name: name.into(),
            value,
            line: None,
        }
    }

    /// Attaches a source line.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Returns the assignment width.
    pub fn width(&self) -> u32 {
        self.value.width()
    }
}

impl PartialEq for FasmAssignment {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl Eq for FasmAssignment {}
