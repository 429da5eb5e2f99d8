//! Byte-offset source location tracking.
//!
//! A [`Span`] is a contiguous byte range into source text. Every token, AST
//! node, and diagnostic carries one, so `&source[span.start..span.end]`
//! always recovers the exact spanned text. Line and column numbers are
//! derived on demand (see [`crate::error::line_context`]) rather than
//! stored per token.

/// A byte-offset range in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the first byte (inclusive).
    pub start: usize,
    /// Byte offset past the last byte (exclusive).
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering from the start of `self` to the end of `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
