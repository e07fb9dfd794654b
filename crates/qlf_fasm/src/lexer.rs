//! Lexical analyzer for FASM source text.
//!
//! Produces [`Token`]s carrying their source text and 1-based line/column.
//! Newlines are significant in FASM and are emitted as tokens; other
//! whitespace is skipped. Comments run from `#` to the end of the line and are
//! kept as [`TokenKind::Comment`] tokens so the parser can check they only
//! appear at the end of a line.

use crate::error::{ParseError, ParseErrorKind};

/// Kinds of FASM tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier segment: `[A-Za-z_][A-Za-z0-9_]*`.
    Ident,
    /// `.`
    Dot,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `:`
    Colon,
    /// `=`
    Equals,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// Unsized decimal number.
    Number,
    /// Based literal such as `4'b1010` or `'hff`.
    Based,
    /// Double-quoted string, quotes included in the token text.
    Str,
    /// `#` comment.
    Comment,
    /// End of a line.
    Newline,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Human-readable description used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::Dot => "'.'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Equals => "'='",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Number => "number",
            TokenKind::Based => "based literal",
            TokenKind::Str => "string",
            TokenKind::Comment => "comment",
            TokenKind::Newline => "end of line",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// The token kind.
    pub kind: TokenKind,
    /// The exact source text of the token.
    pub text: &'a str,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column (in characters).
    pub column: usize,
}

/// Lexes FASM source into tokens ending with [`TokenKind::Eof`].
///
/// # Errors
///
/// Returns a [`ParseError`] for a character that starts no token or an
/// unterminated string.
pub fn lex(source: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        line: 1,
        column: 1,
    };
    lexer.lex_all()
}

/// Byte offsets of line starts, for slicing a line's text in O(1).
#[derive(Debug, Clone)]
pub(crate) struct LineIndex<'a> {
    source: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        LineIndex { source, starts }
    }

    /// Returns the text of a 1-based line, without its terminator.
    pub(crate) fn line(&self, line: usize) -> &'a str {
        let Some(&start) = line.checked_sub(1).and_then(|i| self.starts.get(i)) else {
            return "";
        };
        let end = self
            .starts
            .get(line)
            .map_or(self.source.len(), |&next| next - 1);
        self.source[start..end].trim_end_matches('\r')
    }
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn lex_all(&mut self) -> Result<Vec<Token<'a>>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_blanks();
            if self.pos >= self.bytes.len() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    text: "",
                    line: self.line,
                    column: self.column,
                });
                return Ok(tokens);
            }
            tokens.push(self.next_token()?);
        }
    }

    fn peek(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.pos];
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if b & 0xC0 != 0x80 {
            // Count characters, not UTF-8 continuation bytes.
            self.column += 1;
        }
        b
    }

    fn skip_blanks(&mut self) {
        while self.pos < self.bytes.len() {
            match self.peek() {
                b' ' | b'\t' | b'\r' => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn error(&self, line: usize, column: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(line, column, LineIndex::new(self.source).line(line), kind)
    }

    fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let b = self.peek();

        let kind = match b {
            b'\n' => {
                self.advance();
                TokenKind::Newline
            }
            b'#' => {
                while self.pos < self.bytes.len() && self.peek() != b'\n' {
                    self.advance();
                }
                TokenKind::Comment
            }
            b'"' => {
                self.advance();
                loop {
                    if self.pos >= self.bytes.len() || self.peek() == b'\n' {
                        return Err(self.error(line, column, ParseErrorKind::UnterminatedString));
                    }
                    match self.advance() {
                        b'\\' => {
                            if self.pos < self.bytes.len() && self.peek() != b'\n' {
                                self.advance();
                            }
                        }
                        b'"' => break,
                        _ => {}
                    }
                }
                TokenKind::Str
            }
            b'\'' => {
                self.lex_base_and_digits();
                TokenKind::Based
            }
            b'0'..=b'9' => {
                while self.peek().is_ascii_digit() || self.peek() == b'_' {
                    self.advance();
                }
                if self.peek() == b'\'' {
                    self.lex_base_and_digits();
                    TokenKind::Based
                } else {
                    TokenKind::Number
                }
            }
            b if is_ident_start(b) => {
                while is_ident_char(self.peek()) {
                    self.advance();
                }
                TokenKind::Ident
            }
            b'.' | b'[' | b']' | b':' | b'=' | b'{' | b'}' | b',' => {
                self.advance();
                match b {
                    b'.' => TokenKind::Dot,
                    b'[' => TokenKind::LBracket,
                    b']' => TokenKind::RBracket,
                    b':' => TokenKind::Colon,
                    b'=' => TokenKind::Equals,
                    b'{' => TokenKind::LBrace,
                    b'}' => TokenKind::RBrace,
                    _ => TokenKind::Comma,
                }
            }
            _ => {
                let c = self.source[start..].chars().next().unwrap_or('\0');
                return Err(self.error(line, column, ParseErrorKind::UnexpectedCharacter(c)));
            }
        };

        Ok(Token {
            kind,
            text: &self.source[start..self.pos],
            line,
            column,
        })
    }

    /// Consumes `'`, the radix letter and the digit run of a based literal.
    ///
    /// Digits are validated later against the radix; here any alphanumeric
    /// run is taken so that `4'b10x1` reports the bad digit rather than a
    /// stray identifier.
    fn lex_base_and_digits(&mut self) {
        self.advance();
        if self.peek().is_ascii_alphabetic() {
            self.advance();
        }
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_feature_assignment() {
        assert_eq!(
            kinds("A.B[3:0] = 4'b1010\n"),
            vec![
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::LBracket,
                TokenKind::Number,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::RBracket,
                TokenKind::Equals,
                TokenKind::Based,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn based_literal_text() {
        let tokens = lex("X = 16'hDEAD_beef 'b1").unwrap();
        assert_eq!(tokens[2].text, "16'hDEAD_beef");
        assert_eq!(tokens[3].kind, TokenKind::Based);
        assert_eq!(tokens[3].text, "'b1");
    }

    #[test]
    fn tracks_lines_and_columns() {
        let tokens = lex("A\n  B = 1 # note\n").unwrap();
        let b = tokens[2];
        assert_eq!((b.text, b.line, b.column), ("B", 2, 3));
        let comment = tokens[5];
        assert_eq!(comment.kind, TokenKind::Comment);
        assert_eq!(comment.text, "# note");
        assert_eq!(comment.column, 9);
    }

    #[test]
    fn annotations_and_strings() {
        let tokens = lex(r#"{ key = "a \"b\"" }"#).unwrap();
        assert_eq!(tokens[3].kind, TokenKind::Str);
        assert_eq!(tokens[3].text, r#""a \"b\"""#);
    }

    #[test]
    fn unterminated_string() {
        let err = lex("A { k = \"open\nB").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!((err.line, err.column), (1, 9));
    }

    #[test]
    fn unexpected_character() {
        let err = lex("A\nB @").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter('@'));
        assert_eq!((err.line, err.column), (2, 3));
        assert_eq!(err.text, "B @");
    }

    #[test]
    fn crlf_line_endings() {
        let tokens = lex("A\r\nB\r\n").unwrap();
        assert_eq!(tokens[2].text, "B");
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn line_index_slices_lines() {
        let index = LineIndex::new("A\r\n\nB.C = 1\nD");
        assert_eq!(index.line(1), "A");
        assert_eq!(index.line(2), "");
        assert_eq!(index.line(3), "B.C = 1");
        assert_eq!(index.line(4), "D");
        assert_eq!(index.line(5), "");
        assert_eq!(index.line(0), "");
    }
}
