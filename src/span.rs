//! # Source Spans
//!
//! A [`Span`] is a half-open byte range `[start, end)` into the original,
//! pre-trim input string. Every parse node, paren pair, and diagnostic in
//! this crate carries one, so that downstream tooling (the formatter, an
//! editor integration, the SDK) can map a node back to exactly the bytes
//! that produced it — including whitespace the parser itself discards.

/// A half-open byte range `[start, end)` into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-width span at `at`, used for errors that don't own a range
    /// of their own (e.g. "expected `>`" at end of input).
    pub fn point(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}
