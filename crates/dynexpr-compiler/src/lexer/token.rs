//! Token types produced by the lexer.

use dynexpr_core::Span;

/// The classification of a lexeme.
///
/// Reserved words (`true`, `false`, `null`, `new`, `typeof`, `is`, `as`)
/// are lexed as plain identifiers; the parser decides their meaning,
/// which keeps the `@` identifier escape trivial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    /// Digit run with no fractional part, exponent, or suffix.
    IntLiteral,
    /// A literal with a fraction, exponent, or a `F`/`f`/`M`/`m` suffix.
    /// The suffix character, when present, is the last char of the text.
    RealLiteral,
    /// Decoded string content (escapes already resolved).
    StringLiteral,
    /// Decoded single character.
    CharLiteral,

    Bang,
    Percent,
    Amp,
    AmpAmp,
    LParen,
    RParen,
    Star,
    Plus,
    Comma,
    Minus,
    Dot,
    Slash,
    Colon,
    Lt,
    LtEq,
    Eq,
    EqEq,
    BangEq,
    Gt,
    GtEq,
    Question,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Pipe,
    PipePipe,
    /// `=>`, introducing a lambda body.
    Arrow,

    Eof,
}

impl TokenKind {
    /// Human-readable description for error messages.
    pub fn description(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::RealLiteral => "real literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::CharLiteral => "character literal",
            TokenKind::Bang => "'!'",
            TokenKind::Percent => "'%'",
            TokenKind::Amp => "'&'",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Star => "'*'",
            TokenKind::Plus => "'+'",
            TokenKind::Comma => "','",
            TokenKind::Minus => "'-'",
            TokenKind::Dot => "'.'",
            TokenKind::Slash => "'/'",
            TokenKind::Colon => "':'",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Eq => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::BangEq => "'!='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::Question => "'?'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Pipe => "'|'",
            TokenKind::PipePipe => "'||'",
            TokenKind::Arrow => "'=>'",
            TokenKind::Eof => "end of input",
        }
    }
}

/// One classified lexeme.
///
/// `text` holds the decoded form: string/char literals have their escapes
/// resolved and quotes stripped, and `@`-escaped identifiers have the
/// `@` stripped. Numeric literal text keeps its suffix character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    /// Identifier written with the `@` escape; never a reserved word.
    pub escaped: bool,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            escaped: false,
        }
    }

    /// Mark this identifier as `@`-escaped.
    pub fn with_escape(mut self) -> Self {
        self.escaped = true;
        self
    }

    /// Whether this token is the given reserved word. An `@`-escaped
    /// identifier is always a plain name.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && !self.escaped && self.text == word
    }
}
