//! Lexical, syntactic, and semantic diagnostics.
//!
//! Every error carries the byte span of the offending token, which is
//! enough to recover the file position and render a caret underneath the
//! source line. Rendering lives in [`SyntaxError::display_with_source`];
//! the driver decides where the text goes.

use crate::token::TokenKind;
use quill_base::{error, Span, Style};

#[derive(Debug, Clone)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Renders the error with its source line and a caret underline:
    ///
    /// ```text
    /// error: expected ';', found '}'
    ///    3 | int x = 1
    ///      |          ^
    /// ```
    pub fn display_with_source(&self, source: &str) -> String {
        let (line_num, _, line_content) = error::line_context(source, self.span);
        let caret = error::underline(source, self.span);

        format!(
            "{}: {}\n{} {} {}\n     {} {}",
            Style::bold_red("error"),
            self.kind,
            Style::blue(&format!("{:4}", line_num)),
            Style::blue("|"),
            line_content,
            Style::blue("|"),
            Style::red(&caret),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxErrorKind {
    // Lexical
    UnterminatedString,
    UnterminatedChar,
    InvalidEscape { escape: char },
    MalformedLiteral { offender: char },
    UnknownOperator { spelling: String },

    // Syntactic
    UnexpectedToken { expected: String, found: TokenKind },
    UnmatchedBrace { opened_line: usize },
    UnmatchedParen,
    UnmatchedBracket,
    ExpectedIdentifier { found: TokenKind },
    ExpectedType { name: String },

    // Semantic
    Redeclaration { name: String },
    UndeclaredName { name: String },
    UnknownMember { member: String, type_name: String },
    TypeMismatch { expected: String, found: String },
    NoMatchingOverload { name: String },
    NotAssignable,
    SubscriptNonArray { type_name: String },
}

impl std::fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use SyntaxErrorKind::*;
        match self {
            UnterminatedString => write!(f, "unterminated string literal"),
            UnterminatedChar => write!(f, "unterminated character literal"),
            InvalidEscape { escape } => write!(f, "unknown escape sequence '\\{}'", escape),
            MalformedLiteral { offender } => {
                write!(f, "unexpected supernumerary '{}' in numeric literal", offender)
            }
            UnknownOperator { spelling } => write!(f, "no matching operator for '{}'", spelling),
            UnexpectedToken { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            UnmatchedBrace { opened_line } => {
                write!(f, "unmatched '{{' opened on line {}", opened_line)
            }
            UnmatchedParen => write!(f, "unmatched '('"),
            UnmatchedBracket => write!(f, "unmatched '['"),
            ExpectedIdentifier { found } => write!(f, "expected identifier, found {}", found),
            ExpectedType { name } => write!(f, "'{}' does not name a type", name),
            Redeclaration { name } => write!(f, "'{}' is already declared in this scope", name),
            UndeclaredName { name } => write!(f, "'{}' has not been declared", name),
            UnknownMember { member, type_name } => {
                write!(f, "type '{}' has no member '{}'", type_name, member)
            }
            TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected '{}', found '{}'", expected, found)
            }
            NoMatchingOverload { name } => {
                write!(f, "no matching overload for call to '{}'", name)
            }
            NotAssignable => write!(f, "expression is not assignable"),
            SubscriptNonArray { type_name } => {
                write!(f, "subscript on non-array type '{}'", type_name)
            }
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.kind, self.span.start, self.span.end)
    }
}

impl std::error::Error for SyntaxError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_source_underlines_offender() {
        let source = "int x = oops;";
        let err = SyntaxError::new(
            SyntaxErrorKind::UndeclaredName {
                name: "oops".into(),
            },
            Span::new(8, 12),
        );
        let rendered = err.display_with_source(source);
        assert!(rendered.contains("oops"));
        assert!(rendered.contains("^^^^"));
        assert!(rendered.contains("\x1b["));
    }

    #[test]
    fn display_names_the_kind() {
        let err = SyntaxError::new(SyntaxErrorKind::UnmatchedParen, Span::new(0, 1));
        assert!(err.to_string().contains("unmatched '('"));
    }
}
