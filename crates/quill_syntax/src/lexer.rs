//! Streaming tokenizer for quill source text.
//!
//! The lexer walks the source buffer byte by byte, skipping whitespace and
//! `//` line comments, and hands out one [`Token`] at a time. Malformed
//! input fails with a [`SyntaxError`] whose span covers the exact
//! offending bytes.
//!
//! Operators are matched greedily: the longest run of operator characters
//! is scanned first, then shortened one character at a time until the run
//! matches a known spelling (`>=!` backs off to `>=`). Numeric literals
//! accept one optional `.` and one optional `i`/`u`/`f` suffix; a second
//! separator or a conflicting suffix is a [`MalformedLiteral`] error.
//!
//! Every token's lexeme is the exact source slice (string quotes
//! included), so the emitted stream plus the skipped whitespace
//! reconstructs the input unchanged.
//!
//! [`MalformedLiteral`]: SyntaxErrorKind::MalformedLiteral

use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::token::{Token, TokenKind, KEYWORDS, OPERATORS};
use quill_base::{Interner, Span};

const CHAR_ESCAPES: &[char] = &['\'', '"', '?', '\\', 'a', 'b', 'f', 'n', 'r', 't', 'v', '0'];

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenizes the whole buffer, discarding comments.
    pub fn tokenize(source: &'a str, interner: &mut Interner) -> Result<Vec<Token>, SyntaxError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token(interner)? {
            if token.kind != TokenKind::Comment {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }

    fn eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && matches!(self.peek(), b' ' | b'\t' | b'\r' | b'\n') {
            self.pos += 1;
        }
    }

    fn is_identifier_start(c: u8) -> bool {
        c.is_ascii_alphabetic() || c == b'_'
    }

    fn is_identifier_continue(c: u8) -> bool {
        c.is_ascii_alphanumeric() || c == b'_'
    }

    fn is_operator_char(c: u8) -> bool {
        matches!(
            c,
            b'=' | b'+' | b'-' | b'*' | b'/' | b'%' | b'<' | b'>' | b'!' | b'&' | b'|' | b'^'
        )
    }

    /// Produces the next token, or `None` at end of input.
    pub fn next_token(&mut self, interner: &mut Interner) -> Result<Option<Token>, SyntaxError> {
        self.skip_whitespace();
        if self.eof() {
            return Ok(None);
        }

        let begin = self.pos;
        let first = self.peek();

        let kind = if Self::is_identifier_start(first) {
            self.pos += 1;
            while !self.eof() && Self::is_identifier_continue(self.peek()) {
                self.pos += 1;
            }
            let text = &self.source[begin..self.pos];
            KEYWORDS.get(text).copied().unwrap_or(TokenKind::Identifier)
        } else if first.is_ascii_digit() {
            self.scan_number(begin)?
        } else {
            match first {
                b'\'' => self.scan_char(begin)?,
                b'"' => self.scan_string(begin)?,
                b',' => self.single(TokenKind::Comma),
                b';' => self.single(TokenKind::EndStatement),
                b'{' => self.single(TokenKind::OpenScope),
                b'}' => self.single(TokenKind::CloseScope),
                b':' => self.single(TokenKind::Colon),
                b'(' => self.single(TokenKind::OpenParen),
                b')' => self.single(TokenKind::CloseParen),
                b'[' => self.single(TokenKind::OpenSubscript),
                b']' => self.single(TokenKind::CloseSubscript),
                b'.' => self.single(TokenKind::MemberAccess),
                b'/' if self.pos + 1 < self.bytes.len() && self.bytes[self.pos + 1] == b'/' => {
                    while !self.eof() && self.peek() != b'\n' {
                        self.pos += 1;
                    }
                    TokenKind::Comment
                }
                _ => self.scan_operator(begin)?,
            }
        };

        let span = Span::new(begin, self.pos);
        let lexeme = interner.intern(&self.source[begin..self.pos]);
        Ok(Some(Token::new(kind, lexeme, span)))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn scan_number(&mut self, begin: usize) -> Result<TokenKind, SyntaxError> {
        let mut force_float = false;
        let mut force_integer = false;
        let mut found_decimal = false;

        while !self.eof() {
            match self.peek() {
                c if c.is_ascii_digit() => {}
                c @ (b'i' | b'u') => {
                    if force_integer || force_float || found_decimal {
                        return Err(self.literal_error(c as char, begin));
                    }
                    force_integer = true;
                }
                b'f' => {
                    if force_float || force_integer {
                        return Err(self.literal_error('f', begin));
                    }
                    force_float = true;
                }
                b'.' => {
                    if found_decimal || force_integer || force_float {
                        return Err(self.literal_error('.', begin));
                    }
                    found_decimal = true;
                }
                _ => break,
            }
            self.pos += 1;
        }

        Ok(if force_float || found_decimal {
            TokenKind::Float
        } else {
            TokenKind::Digits
        })
    }

    fn literal_error(&self, offender: char, begin: usize) -> SyntaxError {
        SyntaxError::new(
            SyntaxErrorKind::MalformedLiteral { offender },
            Span::new(begin, self.pos + 1),
        )
    }

    fn scan_char(&mut self, begin: usize) -> Result<TokenKind, SyntaxError> {
        self.pos += 1; // opening '
        if self.eof() {
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnterminatedChar,
                Span::new(begin, self.pos),
            ));
        }
        if self.peek() == b'\\' {
            self.pos += 1;
            let escape = self.peek_char().ok_or_else(|| {
                SyntaxError::new(SyntaxErrorKind::UnterminatedChar, Span::new(begin, self.pos))
            })?;
            if !CHAR_ESCAPES.contains(&escape) {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::InvalidEscape { escape },
                    Span::new(self.pos - 1, self.pos + escape.len_utf8()),
                ));
            }
            self.advance_char();
        } else {
            self.advance_char();
        }
        if self.eof() || self.peek() != b'\'' {
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnterminatedChar,
                Span::new(begin, self.pos),
            ));
        }
        self.pos += 1; // closing '
        Ok(TokenKind::Char)
    }

    fn scan_string(&mut self, begin: usize) -> Result<TokenKind, SyntaxError> {
        self.pos += 1; // opening "
        while !self.eof() && self.peek() != b'"' {
            if self.peek() == b'\\' {
                self.pos += 1;
                if self.eof() {
                    break;
                }
            }
            self.advance_char();
        }
        if self.eof() {
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnterminatedString,
                Span::new(begin, self.pos),
            ));
        }
        self.pos += 1; // closing "
        Ok(TokenKind::Str)
    }

    fn scan_operator(&mut self, begin: usize) -> Result<TokenKind, SyntaxError> {
        let mut end = self.pos;
        while end < self.bytes.len() && Self::is_operator_char(self.bytes[end]) {
            end += 1;
        }
        let scanned_end = end;
        while end > begin {
            if let Some(&kind) = OPERATORS.get(&self.source[begin..end]) {
                self.pos = end;
                return Ok(kind);
            }
            end -= 1;
        }
        // A stray non-operator character ends up here too; report the
        // whole character, not its first byte.
        let reported_end = if scanned_end > begin {
            scanned_end
        } else {
            begin + self.peek_char().map(char::len_utf8).unwrap_or(1)
        };
        Err(SyntaxError::new(
            SyntaxErrorKind::UnknownOperator {
                spelling: self.source[begin..reported_end].to_string(),
            },
            Span::new(begin, reported_end),
        ))
    }
}
