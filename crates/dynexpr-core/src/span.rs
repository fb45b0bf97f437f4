//! Source location tracking for error reporting.
//!
//! Expressions are free-standing single strings, so positions are byte
//! offsets into the source text rather than line/column pairs.

use std::fmt;

/// A span of source text: starting byte offset plus length.
///
/// Every token and every error carries one of these so the host can point
/// at the offending position in the original expression string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset where the span starts (0-indexed).
    pub start: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span from a start offset and length.
    #[inline]
    pub fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// Create a zero-length span at an offset.
    #[inline]
    pub fn point(start: u32) -> Self {
        Self { start, len: 0 }
    }

    /// Byte offset one past the end of the span.
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.len
    }

    /// Merge two spans into one covering both.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span {
            start,
            len: end - start,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}+{}", self.start, self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}", self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(4, 3);
        assert_eq!(span.end(), 7);

        let point = Span::point(9);
        assert_eq!(point.len, 0);
        assert_eq!(point.end(), 9);
    }

    #[test]
    fn span_merge_covers_both() {
        let a = Span::new(2, 3);
        let b = Span::new(8, 4);
        let merged = a.merge(b);
        assert_eq!(merged.start, 2);
        assert_eq!(merged.end(), 12);

        // Order must not matter
        assert_eq!(b.merge(a), merged);
    }

    #[test]
    fn span_display() {
        assert_eq!(format!("{}", Span::new(17, 1)), "offset 17");
    }
}
