//! FASM parse errors.

use crate::value::ValueError;

/// What went wrong on a FASM line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// A byte that starts no token.
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    /// A string literal runs to the end of the line.
    #[error("unterminated string")]
    UnterminatedString,
    /// The token stream does not match the line grammar.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// What the parser wanted.
        expected: &'static str,
        /// The token it got.
        found: String,
    },
    /// A number or based literal is malformed.
    #[error("invalid literal '{literal}': {reason}")]
    InvalidLiteral {
        /// The literal text.
        literal: String,
        /// Why it is invalid.
        reason: String,
    },
    /// A bit range with `hi < lo`.
    #[error("invalid range [{hi}:{lo}]")]
    InvalidRange {
        /// Upper index.
        hi: u32,
        /// Lower index.
        lo: u32,
    },
    /// A bit index or literal width at or beyond [`MAX_FEATURE_WIDTH`].
    ///
    /// [`MAX_FEATURE_WIDTH`]: crate::value::MAX_FEATURE_WIDTH
    #[error("{what} {value} exceeds the feature width limit of {limit} bits")]
    WidthLimit {
        /// `"bit index"` or `"literal width"`.
        what: &'static str,
        /// The offending number.
        value: u32,
        /// The limit it broke.
        limit: u32,
    },
    /// A sized literal whose width differs from the bit range it is assigned to.
    #[error("literal width {literal} does not match range width {range}")]
    LiteralWidthMismatch {
        /// Width of the bit range.
        range: u32,
        /// Explicit width of the literal.
        literal: u32,
    },
    /// The literal value does not fit its target width.
    #[error(transparent)]
    Value(#[from] ValueError),
    /// A bit index at or beyond the declared feature width.
    #[error("bit index {index} is outside feature '{name}' of width {width}")]
    IndexOutOfRange {
        /// The feature name.
        name: String,
        /// The offending index.
        index: u32,
        /// The declared width.
        width: u32,
    },
    /// One bit of a feature assigned by two fragments.
    #[error("bit {index} of feature '{name}' is assigned more than once")]
    DuplicateBit {
        /// The feature name.
        name: String,
        /// The repeated index.
        index: u32,
    },
}

/// A FASM syntax or value error, localized to a line and column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {kind}\n    {text}")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column of the offending token.
    pub column: usize,
    /// The full text of the offending line.
    pub text: String,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Creates a parse error.
    pub fn new(line: usize, column: usize, text: impl Into<String>, kind: ParseErrorKind) -> Self {
        Self {
            line,
            column,
            text: text.into(),
            kind,
        }
    }
}
