//! Errors with source locations and caret-rendering helpers.
//!
//! [`SpannedError`] is the generic "message at location" error used where a
//! dedicated kind enum would be overkill. The free functions at the bottom
//! ([`line_context`], [`line_column`], [`underline`]) are shared by every
//! diagnostic renderer in the workspace: given a source buffer and a span
//! they recover the enclosing line, the 1-based line/column, and a caret
//! underline of the offending range.

use crate::span::Span;
use std::fmt;

/// An error annotated with its source location.
#[derive(Debug, Clone)]
pub struct SpannedError {
    pub message: String,
    pub span: Span,
}

impl SpannedError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for SpannedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for SpannedError {}

pub type Result<T> = std::result::Result<T, SpannedError>;

/// Returns `(line_number, line_start, line_text)` for the line containing
/// the start of `span`. Line numbers are 1-based.
pub fn line_context(source: &str, span: Span) -> (usize, usize, &str) {
    let mut line_num = 1;
    let mut line_start = 0;

    for (i, c) in source.char_indices() {
        if i >= span.start {
            break;
        }
        if c == '\n' {
            line_num += 1;
            line_start = i + 1;
        }
    }

    let line_end = source[line_start..]
        .find('\n')
        .map(|off| line_start + off)
        .unwrap_or(source.len());

    (line_num, line_start, &source[line_start..line_end])
}

/// Returns the 1-based `(line, column)` of the start of `span`.
pub fn line_column(source: &str, span: Span) -> (usize, usize) {
    let (line, line_start, _) = line_context(source, span);
    (line, span.start.saturating_sub(line_start) + 1)
}

/// Builds a `^^^` underline aligned with `span` on its source line.
pub fn underline(source: &str, span: Span) -> String {
    let (_, line_start, _) = line_context(source, span);
    let col = span.start.saturating_sub(line_start);
    let len = span.len().max(1);
    format!("{}{}", " ".repeat(col), "^".repeat(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message_and_range() {
        let err = SpannedError::new("bad literal", Span::new(5, 10));
        let rendered = err.to_string();
        assert!(rendered.contains("bad literal"));
        assert!(rendered.contains("5..10"));
    }

    #[test]
    fn line_context_finds_second_line() {
        let source = "int a = 1;\nint b = ;\n";
        let (line, start, text) = line_context(source, Span::new(19, 20));
        assert_eq!(line, 2);
        assert_eq!(start, 11);
        assert_eq!(text, "int b = ;");
    }

    #[test]
    fn line_column_is_one_based() {
        let source = "abc\ndef";
        assert_eq!(line_column(source, Span::new(0, 1)), (1, 1));
        assert_eq!(line_column(source, Span::new(5, 6)), (2, 2));
    }

    #[test]
    fn underline_aligns_with_span() {
        let source = "let x = oops;";
        let caret = underline(source, Span::new(8, 12));
        assert_eq!(caret, "        ^^^^");
    }

    #[test]
    fn underline_is_never_empty() {
        let source = "x";
        assert_eq!(underline(source, Span::new(1, 1)), " ^");
    }
}
