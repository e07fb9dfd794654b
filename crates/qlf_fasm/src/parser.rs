//! Line-oriented FASM parser.
//!
//! Grammar, one statement per line:
//!
//! ```text
//! line       := [ feature ] [ annotations ] [ comment ]
//! feature    := name [ range ] [ '=' literal ]
//! name       := ident ( '.' ident )*
//! range      := '[' number ']' | '[' number ':' number ']'
//! literal    := number | [ number ] "'" radix digits
//! annotations:= '{' [ ident '=' string ( ',' ident '=' string )* ] '}'
//! ```
//!
//! Each feature becomes a [`Fragment`] whose value is already sized to its
//! target width: the range width if ranged, else the literal's explicit width,
//! else 1. A bare name means value 1.

use crate::assignment::{Annotation, BitRange, FasmLine, Fragment};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{lex, LineIndex, Token, TokenKind};
use crate::value::{FeatureValue, Radix, MAX_FEATURE_WIDTH};

/// Parses FASM source into its non-blank lines.
///
/// Blank and comment-only lines are dropped. Lines carrying only annotations
/// are kept with no fragment.
///
/// # Errors
///
/// Returns the first [`ParseError`] in the source.
pub fn parse(source: &str) -> Result<Vec<FasmLine>, ParseError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        lines: LineIndex::new(source),
        tokens,
        pos: 0,
    };
    parser.parse_lines()
}

/// A literal before it is sized to its target.
struct Literal<'a> {
    token: Token<'a>,
    width: Option<u32>,
    radix: Radix,
    digits: &'a str,
}

struct Parser<'a> {
    lines: LineIndex<'a>,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Token<'a> {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, token: Token<'_>, kind: ParseErrorKind) -> ParseError {
        ParseError::new(token.line, token.column, self.lines.line(token.line), kind)
    }

    fn unexpected(&self, token: Token<'_>, expected: &'static str) -> ParseError {
        let found = match token.kind {
            TokenKind::Ident | TokenKind::Number | TokenKind::Based | TokenKind::Str => {
                format!("'{}'", token.text)
            }
            kind => kind.describe().to_string(),
        };
        self.error_at(token, ParseErrorKind::UnexpectedToken { expected, found })
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token<'a>, ParseError> {
        let token = self.peek();
        if token.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(token, expected))
        }
    }

    fn parse_lines(&mut self) -> Result<Vec<FasmLine>, ParseError> {
        let mut lines = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Eof => return Ok(lines),
                TokenKind::Newline => {
                    self.advance();
                }
                _ => {
                    if let Some(line) = self.parse_line()? {
                        lines.push(line);
                    }
                }
            }
        }
    }

    fn parse_line(&mut self) -> Result<Option<FasmLine>, ParseError> {
        let line = self.peek().line;

        let fragment = if self.peek().kind == TokenKind::Ident {
            Some(self.parse_fragment()?)
        } else {
            None
        };
        let annotations = if self.peek().kind == TokenKind::LBrace {
            self.parse_annotations()?
        } else {
            Vec::new()
        };
        if self.peek().kind == TokenKind::Comment {
            self.advance();
        }

        let end = self.peek();
        match end.kind {
            TokenKind::Newline => {
                self.advance();
            }
            TokenKind::Eof => {}
            _ => return Err(self.unexpected(end, "end of line")),
        }

        if fragment.is_none() && annotations.is_empty() {
            return Ok(None);
        }
        Ok(Some(FasmLine {
            line,
            text: self.lines.line(line).to_string(),
            fragment,
            annotations,
        }))
    }

    fn parse_fragment(&mut self) -> Result<Fragment, ParseError> {
        let first = self.expect(TokenKind::Ident, "feature name")?;
        let mut name = first.text.to_string();
        while self.peek().kind == TokenKind::Dot {
            self.advance();
            let segment = self.expect(TokenKind::Ident, "identifier after '.'")?;
            name.push('.');
            name.push_str(segment.text);
        }

        let range = if self.peek().kind == TokenKind::LBracket {
            Some(self.parse_range()?)
        } else {
            None
        };

        let literal = if self.peek().kind == TokenKind::Equals {
            self.advance();
            Some(self.parse_literal()?)
        } else {
            None
        };

        let value = self.size_value(range, literal)?;
        Ok(Fragment {
            name,
            range,
            value,
            column: first.column,
        })
    }

    fn parse_range(&mut self) -> Result<BitRange, ParseError> {
        let open = self.expect(TokenKind::LBracket, "'['")?;
        let hi = self.parse_index()?;
        let lo = if self.peek().kind == TokenKind::Colon {
            self.advance();
            self.parse_index()?
        } else {
            hi
        };
        self.expect(TokenKind::RBracket, "']'")?;
        if hi < lo {
            return Err(self.error_at(open, ParseErrorKind::InvalidRange { hi, lo }));
        }
        Ok(BitRange { hi, lo })
    }

    fn parse_index(&mut self) -> Result<u32, ParseError> {
        let token = self.expect(TokenKind::Number, "bit index")?;
        let Some(index) = parse_decimal(token.text) else {
            return Err(self.error_at(
                token,
                ParseErrorKind::InvalidLiteral {
                    literal: token.text.to_string(),
                    reason: "index does not fit in 32 bits".to_string(),
                },
            ));
        };
        // Keeps `hi - lo + 1` and `hi + 1` in range for every accepted range.
        if index >= MAX_FEATURE_WIDTH {
            return Err(self.error_at(
                token,
                ParseErrorKind::WidthLimit {
                    what: "bit index",
                    value: index,
                    limit: MAX_FEATURE_WIDTH,
                },
            ));
        }
        Ok(index)
    }

    fn parse_literal(&mut self) -> Result<Literal<'a>, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Literal {
                    token,
                    width: None,
                    radix: Radix::Decimal,
                    digits: token.text,
                })
            }
            TokenKind::Based => {
                self.advance();
                let invalid = |reason: &str| {
                    self.error_at(
                        token,
                        ParseErrorKind::InvalidLiteral {
                            literal: token.text.to_string(),
                            reason: reason.to_string(),
                        },
                    )
                };
                let Some((width, rest)) = token.text.split_once('\'') else {
                    return Err(invalid("missing radix"));
                };
                let width = if width.is_empty() {
                    None
                } else {
                    match parse_decimal(width) {
                        Some(0) => return Err(invalid("width must be positive")),
                        Some(w) if w > MAX_FEATURE_WIDTH => {
                            return Err(self.error_at(
                                token,
                                ParseErrorKind::WidthLimit {
                                    what: "literal width",
                                    value: w,
                                    limit: MAX_FEATURE_WIDTH,
                                },
                            ));
                        }
                        Some(w) => Some(w),
                        None => return Err(invalid("width does not fit in 32 bits")),
                    }
                };
                let Some(radix) = rest.bytes().next().and_then(Radix::from_letter) else {
                    return Err(invalid("expected radix 'b', 'o', 'd' or 'h'"));
                };
                Ok(Literal {
                    token,
                    width,
                    radix,
                    digits: &rest[1..],
                })
            }
            _ => Err(self.unexpected(token, "literal")),
        }
    }

    fn size_value(
        &self,
        range: Option<BitRange>,
        literal: Option<Literal<'_>>,
    ) -> Result<FeatureValue, ParseError> {
        let Some(literal) = literal else {
            let width = range.map_or(1, |r| r.width());
            return Ok(FeatureValue::from_u64(1, width).unwrap_or_else(|| FeatureValue::zero(width)));
        };

        let target = match (range.map(|r| r.width()), literal.width) {
            (Some(range), Some(lit)) if range != lit => {
                return Err(self.error_at(
                    literal.token,
                    ParseErrorKind::LiteralWidthMismatch {
                        range,
                        literal: lit,
                    },
                ));
            }
            (Some(range), _) => range,
            (None, Some(lit)) => lit,
            (None, None) => 1,
        };

        FeatureValue::parse_digits(literal.radix, literal.digits, target)
            .map_err(|e| self.error_at(literal.token, e.into()))
    }

    fn parse_annotations(&mut self) -> Result<Vec<Annotation>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut annotations = Vec::new();
        if self.peek().kind != TokenKind::RBrace {
            loop {
                let key = self.expect(TokenKind::Ident, "annotation name")?;
                self.expect(TokenKind::Equals, "'='")?;
                let value = self.expect(TokenKind::Str, "quoted annotation value")?;
                annotations.push(Annotation {
                    key: key.text.to_string(),
                    value: unquote(value.text),
                });
                if self.peek().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(annotations)
    }
}

fn parse_decimal(text: &str) -> Option<u32> {
    text.chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .parse()
        .ok()
}

fn unquote(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> Fragment {
        let lines = parse(source).unwrap();
        assert_eq!(lines.len(), 1);
        lines[0].fragment.clone().unwrap()
    }

    #[test]
    fn bare_name_is_one() {
        let f = single("A.B\n");
        assert_eq!(f.name, "A.B");
        assert_eq!(f.range, None);
        assert_eq!(f.value.width(), 1);
        assert_eq!(f.value.to_u64(), Some(1));
    }

    #[test]
    fn ranged_sized_literal() {
        let f = single("X[3:0] = 4'b1010");
        assert_eq!(f.range, Some(BitRange { hi: 3, lo: 0 }));
        assert_eq!(f.value.to_binary_string(), "1010");
    }

    #[test]
    fn unsized_literal_takes_range_width() {
        let f = single("X[7:4] = 'hA");
        assert_eq!(f.value.width(), 4);
        assert_eq!(f.value.to_u64(), Some(10));

        let f = single("X[7:0] = 200");
        assert_eq!(f.value.width(), 8);
        assert_eq!(f.value.to_u64(), Some(200));
    }

    #[test]
    fn sized_literal_without_range_keeps_its_width() {
        let f = single("X = 8'd5");
        assert_eq!(f.value.width(), 8);
        assert_eq!(f.value.to_u64(), Some(5));
    }

    #[test]
    fn single_bit_index() {
        let f = single("X[2] = 1'b0");
        assert_eq!(f.range, Some(BitRange { hi: 2, lo: 2 }));
        assert!(f.value.is_zero());
    }

    #[test]
    fn bare_ranged_name_is_one() {
        let f = single("X[2]");
        assert_eq!(f.value.to_u64(), Some(1));
    }

    #[test]
    fn blank_and_comment_lines_dropped() {
        let lines = parse("# header\n\nA.B # set\n   \nC.D\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, 3);
        assert_eq!(lines[0].text, "A.B # set");
        assert_eq!(lines[1].line, 5);
    }

    #[test]
    fn annotations_are_kept() {
        let lines = parse("A.B { loc = \"X1Y2\", note = \"a\\\"b\" }\n{ k = \"v\" }\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].annotations.len(), 2);
        assert_eq!(lines[0].annotations[1].value, "a\"b");
        assert!(lines[1].fragment.is_none());
        assert_eq!(lines[1].annotations[0].key, "k");
    }

    #[test]
    fn value_too_wide_is_localized() {
        let err = parse("A\nX[1:0] = 7\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 10);
        assert_eq!(err.text, "X[1:0] = 7");
        assert!(matches!(err.kind, ParseErrorKind::Value(_)));
    }

    #[test]
    fn unsized_decimal_defaults_to_one_bit() {
        assert!(parse("X = 1").is_ok());
        assert!(parse("X = 2").is_err());
    }

    #[test]
    fn literal_width_must_match_range() {
        let err = parse("X[3:0] = 8'd5").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::LiteralWidthMismatch {
                range: 4,
                literal: 8
            }
        );
    }

    #[test]
    fn malformed_literals() {
        assert!(matches!(
            parse("X = 4'q1").unwrap_err().kind,
            ParseErrorKind::InvalidLiteral { .. }
        ));
        assert!(matches!(
            parse("X = 0'b0").unwrap_err().kind,
            ParseErrorKind::InvalidLiteral { .. }
        ));
        assert!(matches!(
            parse("X = 4'b10x1").unwrap_err().kind,
            ParseErrorKind::Value(_)
        ));
    }

    #[test]
    fn inverted_range() {
        let err = parse("X[0:3] = 4'b1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidRange { hi: 0, lo: 3 });
        assert_eq!(err.column, 2);
    }

    #[test]
    fn grammar_errors() {
        let err = parse("A.B.\n").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                expected: "identifier after '.'",
                ..
            }
        ));

        let err = parse("A B\n").unwrap_err();
        assert_eq!(err.column, 3);
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                expected: "end of line",
                ..
            }
        ));

        assert!(parse("A =\n").is_err());
        assert!(parse("= 1\n").is_err());
        assert!(parse("A[1\n").is_err());
    }

    #[test]
    fn huge_indices_are_rejected_at_the_index() {
        let err = parse("X[4294967295:0] = 1\n").unwrap_err();
        assert_eq!((err.line, err.column), (1, 3));
        assert_eq!(
            err.kind,
            ParseErrorKind::WidthLimit {
                what: "bit index",
                value: u32::MAX,
                limit: MAX_FEATURE_WIDTH
            }
        );

        let err = parse("Z[4294967295] = 1\n").unwrap_err();
        assert_eq!(err.column, 3);
        assert!(matches!(err.kind, ParseErrorKind::WidthLimit { .. }));

        let err = parse("Z[4294967296]\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidLiteral { .. }));
    }

    #[test]
    fn huge_literal_width_is_rejected() {
        let err = parse("X = 4000000000'h1\n").unwrap_err();
        assert_eq!(err.column, 5);
        assert!(matches!(
            err.kind,
            ParseErrorKind::WidthLimit {
                what: "literal width",
                ..
            }
        ));
    }

    #[test]
    fn widest_range_is_accepted() {
        let hi = MAX_FEATURE_WIDTH - 1;
        let f = single(&format!("X[{hi}:0] = 1"));
        assert_eq!(f.value.width(), MAX_FEATURE_WIDTH);
    }

    #[test]
    fn large_sources_parse_in_linear_time() {
        let source: String = (0..50_000)
            .map(|i| format!("fpga_top.grid_clb_{i}_.LUT_INIT[3:0] = 4'b1010\n"))
            .collect();
        let start = std::time::Instant::now();
        let lines = parse(&source).unwrap();
        assert_eq!(lines.len(), 50_000);
        assert_eq!(lines[49_999].text, "fpga_top.grid_clb_49999_.LUT_INIT[3:0] = 4'b1010");
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
    }
}
