/// A cursor over source text that tracks byte position.
///
/// Provides low-level character access with peek/advance semantics.
/// Expressions are single-line strings, so positions are plain byte
/// offsets rather than line/column pairs.
pub struct Cursor<'src> {
    /// The source text being scanned.
    source: &'src str,
    /// Remaining source text (slice starting at current position).
    rest: &'src str,
    /// Current byte offset from start of source.
    offset: u32,
}

impl<'src> Cursor<'src> {
    /// Create a new cursor at the start of the source.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
        }
    }

    /// The full source text.
    #[inline]
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Current byte offset from start of source.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Check if we've reached the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.rest.is_empty()
    }

    /// Peek at the current character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Check if the current character satisfies a predicate.
    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Consume the current character and advance.
    #[inline]
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.rest.chars().next()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;
        Some(ch)
    }

    /// Consume if the current character matches.
    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate matches.
    ///
    /// Returns the consumed slice.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset as usize;
        while self.check(&f) {
            self.advance();
        }
        &self.source[start..self.offset as usize]
    }

    /// Get a slice of source from a starting offset to current position.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }

    /// Rewind to a previously observed offset.
    ///
    /// `offset` must lie on a char boundary, which holds for any offset
    /// previously returned by [`Cursor::offset`].
    pub fn rewind(&mut self, offset: u32) {
        self.rest = &self.source[offset as usize..];
        self.offset = offset;
    }
}

/// Check if a character can start an identifier.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
