//! Main lexer implementation.
//!
//! The [`Lexer`] converts expression text into a stream of [`Token`]s
//! using direct dispatch on the first character. Tokens are produced one
//! at a time; the parser keeps a single token of lookahead.

use dynexpr_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind};

/// Lexer for expression source text.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer over the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// The full source text.
    pub fn source(&self) -> &'src str {
        self.cursor.source()
    }

    /// Current byte offset, for checkpoint/rewind.
    pub fn offset(&self) -> u32 {
        self.cursor.offset()
    }

    /// Rewind to a previously observed offset.
    pub fn rewind(&mut self, offset: u32) {
        self.cursor.rewind(offset);
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        if self.cursor.is_eof() {
            return Ok(Token::new(
                TokenKind::Eof,
                "",
                Span::point(self.cursor.offset()),
            ));
        }

        let start = self.cursor.offset();
        // Dispatch on the first character. `peek` cannot fail after the
        // EOF check above.
        let first = match self.cursor.peek() {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::Eof, "", Span::point(start))),
        };

        match first {
            '"' => self.scan_string(start),
            '\'' => self.scan_char(start),
            c if c.is_ascii_digit() => self.scan_number(start),
            c if is_ident_start(c) || c == '@' => self.scan_identifier(start),
            _ => self.scan_operator(start),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.cursor.check(|c| c.is_whitespace()) {
            self.cursor.advance();
        }
    }

    fn make(&self, kind: TokenKind, start: u32) -> Token {
        let text = self.cursor.slice_from(start);
        Token::new(kind, text, Span::new(start, self.cursor.offset() - start))
    }

    // =========================================
    // Identifiers
    // =========================================

    /// Scan an identifier, stripping a leading `@` escape.
    ///
    /// The escape lets reserved words be used as plain names; the parser
    /// never sees the `@`, only the unescaped text.
    fn scan_identifier(&mut self, start: u32) -> Result<Token, LexError> {
        let escaped = self.cursor.eat('@');
        if escaped && !self.cursor.check(is_ident_start) {
            return Err(LexError::UnexpectedChar {
                ch: '@',
                span: Span::point(start),
            });
        }
        let name_start = self.cursor.offset();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice_from(name_start);
        let tok = Token::new(
            TokenKind::Identifier,
            text,
            Span::new(start, self.cursor.offset() - start),
        );
        Ok(if escaped { tok.with_escape() } else { tok })
    }

    // =========================================
    // Numbers
    // =========================================

    /// Scan an integer or real literal.
    ///
    /// A fraction (`.` followed by a digit), an exponent, or a trailing
    /// `F`/`f`/`M`/`m` suffix turns the literal real. The suffix stays in
    /// the token text; the parser interprets it.
    fn scan_number(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let mut real = false;

        if self.cursor.peek() == Some('.')
            && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            real = true;
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let after_sign = match self.cursor.peek_nth(1) {
                Some('+' | '-') => self.cursor.peek_nth(2),
                other => other,
            };
            if after_sign.is_some_and(|c| c.is_ascii_digit()) {
                real = true;
                self.cursor.advance();
                if matches!(self.cursor.peek(), Some('+' | '-')) {
                    self.cursor.advance();
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
        }

        if matches!(self.cursor.peek(), Some('F' | 'f' | 'M' | 'm')) {
            real = true;
            self.cursor.advance();
        }

        let kind = if real {
            TokenKind::RealLiteral
        } else {
            TokenKind::IntLiteral
        };
        Ok(self.make(kind, start))
    }

    // =========================================
    // String and character literals
    // =========================================

    fn scan_string(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.advance();
        let mut decoded = String::new();
        loop {
            match self.cursor.advance() {
                None => {
                    return Err(LexError::UnterminatedString {
                        span: Span::new(start, self.cursor.offset() - start),
                    });
                }
                Some('"') => break,
                Some('\\') => decoded.push(self.decode_escape(start)?),
                Some(c) => decoded.push(c),
            }
        }
        Ok(Token::new(
            TokenKind::StringLiteral,
            decoded,
            Span::new(start, self.cursor.offset() - start),
        ))
    }

    fn scan_char(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.advance();
        let mut decoded = String::new();
        loop {
            match self.cursor.advance() {
                None => {
                    return Err(LexError::UnterminatedChar {
                        span: Span::new(start, self.cursor.offset() - start),
                    });
                }
                Some('\'') => break,
                Some('\\') => decoded.push(self.decode_escape(start)?),
                Some(c) => decoded.push(c),
            }
        }
        let span = Span::new(start, self.cursor.offset() - start);
        if decoded.chars().count() != 1 {
            return Err(LexError::InvalidCharLiteral { span });
        }
        Ok(Token::new(TokenKind::CharLiteral, decoded, span))
    }

    /// Decode the character after a backslash.
    fn decode_escape(&mut self, literal_start: u32) -> Result<char, LexError> {
        let pos = self.cursor.offset();
        match self.cursor.advance() {
            Some('\'') => Ok('\''),
            Some('"') => Ok('"'),
            Some('\\') => Ok('\\'),
            Some('0') => Ok('\0'),
            Some('a') => Ok('\x07'),
            Some('b') => Ok('\x08'),
            Some('f') => Ok('\x0c'),
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('v') => Ok('\x0b'),
            Some(other) => Err(LexError::InvalidEscape {
                ch: other,
                span: Span::new(pos.saturating_sub(1), 2),
            }),
            None => Err(LexError::UnterminatedString {
                span: Span::new(literal_start, self.cursor.offset() - literal_start),
            }),
        }
    }

    // =========================================
    // Operators and punctuation
    // =========================================

    fn scan_operator(&mut self, start: u32) -> Result<Token, LexError> {
        let ch = match self.cursor.advance() {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::Eof, "", Span::point(start))),
        };
        let kind = match ch {
            '!' => {
                if self.cursor.eat('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '%' => TokenKind::Percent,
            '&' => {
                if self.cursor.eat('&') {
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Amp
                }
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '*' => TokenKind::Star,
            '+' => TokenKind::Plus,
            ',' => TokenKind::Comma,
            '-' => TokenKind::Minus,
            '.' => TokenKind::Dot,
            '/' => TokenKind::Slash,
            ':' => TokenKind::Colon,
            '<' => {
                if self.cursor.eat('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '=' => {
                if self.cursor.eat('=') {
                    TokenKind::EqEq
                } else if self.cursor.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Eq
                }
            }
            '>' => {
                if self.cursor.eat('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '?' => TokenKind::Question,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '|' => {
                if self.cursor.eat('|') {
                    TokenKind::PipePipe
                } else {
                    TokenKind::Pipe
                }
            }
            other => {
                return Err(LexError::UnexpectedChar {
                    ch: other,
                    span: Span::point(start),
                });
            }
        };
        Ok(self.make(kind, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            if tok.kind == TokenKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    fn one(src: &str) -> Token {
        Lexer::new(src).next_token().unwrap()
    }

    #[test]
    fn punctuation_two_char_forms() {
        assert_eq!(
            kinds("== != <= >= && || =>"),
            vec![
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Arrow,
            ]
        );
        assert_eq!(kinds("= ="), vec![TokenKind::Eq, TokenKind::Eq]);
    }

    #[test]
    fn numbers_classify_int_vs_real() {
        assert_eq!(one("42").kind, TokenKind::IntLiteral);
        assert_eq!(one("4.5").kind, TokenKind::RealLiteral);
        assert_eq!(one("1e10").kind, TokenKind::RealLiteral);
        assert_eq!(one("1.5e-3").kind, TokenKind::RealLiteral);
        assert_eq!(one("2F").kind, TokenKind::RealLiteral);
        assert_eq!(one("2m").kind, TokenKind::RealLiteral);
        assert_eq!(one("2F").text, "2F");
    }

    #[test]
    fn dot_after_int_without_digit_is_member_access() {
        assert_eq!(
            kinds("1.ToString"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::Dot,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn string_escapes_decode() {
        let tok = one(r#""a\tb\"c\\""#);
        assert_eq!(tok.kind, TokenKind::StringLiteral);
        assert_eq!(tok.text, "a\tb\"c\\");
    }

    #[test]
    fn string_invalid_escape_fails() {
        let err = Lexer::new(r#""\q""#).next_token().unwrap_err();
        assert!(matches!(err, LexError::InvalidEscape { ch: 'q', .. }));
    }

    #[test]
    fn unterminated_string_fails() {
        let err = Lexer::new("\"abc").next_token().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn char_literal_must_be_single() {
        assert_eq!(one("'x'").text, "x");
        assert_eq!(one(r"'\n'").text, "\n");
        let err = Lexer::new("'ab'").next_token().unwrap_err();
        assert!(matches!(err, LexError::InvalidCharLiteral { .. }));
    }

    #[test]
    fn at_escape_strips_prefix() {
        let tok = one("@new");
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text, "new");
        assert_eq!(tok.span, Span::new(0, 4));
        assert!(tok.escaped);
        assert!(!one("new").escaped);
    }

    #[test]
    fn unexpected_char_reports_position() {
        let err = Lexer::new("a # b").next_token();
        assert!(err.is_ok());
        let mut lexer = Lexer::new("#");
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.span(), Span::point(0));
    }

    #[test]
    fn spans_track_offsets() {
        let mut lexer = Lexer::new("a + bb");
        assert_eq!(lexer.next_token().unwrap().span, Span::new(0, 1));
        assert_eq!(lexer.next_token().unwrap().span, Span::new(2, 1));
        assert_eq!(lexer.next_token().unwrap().span, Span::new(4, 2));
    }
}
