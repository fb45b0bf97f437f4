//! Unified error types for every phase of expression processing.
//!
//! ```text
//! ExprError (top-level wrapper)
//! ├── LexError          - tokenization failures
//! ├── ParseError        - parsing + static resolution failures
//! ├── RegistrationError - host type registration failures
//! └── RuntimeError      - invocation failures
//! ```
//!
//! Every failure is reported synchronously at the point of detection; a
//! failed compile produces no partial artifact and a failed invoke
//! produces no partial result. Errors that arise inside source text carry
//! the [`Span`] of the offending position.

use thiserror::Error;

use crate::span::Span;

// ============================================================================
// Lexer errors
// ============================================================================

/// Errors during tokenization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// An unrecognized character was encountered.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A string literal reached end of input before its closing quote.
    #[error("unterminated string literal at {span}")]
    UnterminatedString { span: Span },

    /// A char literal reached end of input before its closing quote.
    #[error("unterminated character literal at {span}")]
    UnterminatedChar { span: Span },

    /// A char literal did not decode to exactly one character.
    #[error("character literal must contain exactly one character at {span}")]
    InvalidCharLiteral { span: Span },

    /// A backslash escape outside the supported table.
    #[error("invalid escape sequence '\\{ch}' at {span}")]
    InvalidEscape { ch: char, span: Span },

    /// A numeric literal could not be parsed under its implied style.
    #[error("invalid numeric literal at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    /// The span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedChar { span } => *span,
            LexError::InvalidCharLiteral { span } => *span,
            LexError::InvalidEscape { span, .. } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse / resolution errors
// ============================================================================

/// Categories of compile-time failure.
///
/// Parsing and static resolution happen in a single pass, so member
/// lookup, overload resolution, and conversion failures all surface as
/// parse errors carrying the position of the construct that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was required but something else was found.
    ExpectedToken,
    /// An expression was expected.
    ExpectedExpression,
    /// Unexpected end of input.
    UnexpectedEof,
    /// A name did not resolve to a variable, type, or constant.
    UnknownIdentifier,
    /// A member name did not resolve on the target type.
    UnknownMember,
    /// No candidate survived the applicability test.
    NoApplicableMethod,
    /// No constructor on the named type matched the arguments.
    NoApplicableConstructor,
    /// No indexer on the target type matched the arguments.
    NoApplicableIndexer,
    /// More than one candidate tied for best.
    AmbiguousCall,
    /// The assignment operator is disabled in settings.
    AssignmentDisabled,
    /// The assignment target is not a writable slot or member.
    NotAssignable,
    /// Two formal parameters share a name.
    DuplicateParameter,
    /// A required implicit or explicit conversion does not exist.
    TypeConversion,
    /// The branches of a conditional cannot be reconciled.
    IncompatibleBranches,
    /// A generic type argument could not be bound.
    UnresolvedTypeArgument,
    /// A literal failed to parse under its implied style.
    InvalidLiteral,
    /// The reflection guard rejected a reflective construct.
    ReflectionNotAllowed,
    /// Internal invariant violation.
    Internal,
}

impl ParseErrorKind {
    /// Short human-readable name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::UnexpectedEof => "unexpected end of input",
            ParseErrorKind::UnknownIdentifier => "unknown identifier",
            ParseErrorKind::UnknownMember => "unknown member",
            ParseErrorKind::NoApplicableMethod => "no applicable method",
            ParseErrorKind::NoApplicableConstructor => "no applicable constructor",
            ParseErrorKind::NoApplicableIndexer => "no applicable indexer",
            ParseErrorKind::AmbiguousCall => "ambiguous invocation",
            ParseErrorKind::AssignmentDisabled => "assignment operator disabled",
            ParseErrorKind::NotAssignable => "not assignable",
            ParseErrorKind::DuplicateParameter => "duplicate parameter",
            ParseErrorKind::TypeConversion => "type conversion failure",
            ParseErrorKind::IncompatibleBranches => "incompatible conditional branches",
            ParseErrorKind::UnresolvedTypeArgument => "unresolved type argument",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::ReflectionNotAllowed => "reflection not allowed",
            ParseErrorKind::Internal => "internal error",
        }
    }
}

/// A compile-time failure with its kind, position, and message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {message} at {span}", kind.as_str())]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// The span where this error occurred.
    pub fn span(&self) -> Span {
        self.span
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        let span = err.span();
        ParseError::new(ParseErrorKind::InvalidLiteral, span, err.to_string())
    }
}

// ============================================================================
// Registration errors
// ============================================================================

/// Errors while building the host type registry or symbol environment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A type with this name is already registered.
    #[error("type '{name}' is already registered")]
    DuplicateType { name: String },

    /// A member with this name is already declared on the type.
    #[error("member '{member}' is already declared on '{type_name}'")]
    DuplicateMember { type_name: String, member: String },

    /// A variable or constant with this name is already bound.
    #[error("symbol '{name}' is already bound in the environment")]
    DuplicateSymbol { name: String },

    /// A referenced base type or interface is not registered.
    #[error("unknown base type or interface '{name}'")]
    UnknownBaseType { name: String },
}

// ============================================================================
// Runtime errors
// ============================================================================

/// Errors during invocation of a compiled expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// The argument bindings do not match the formal parameter list.
    #[error("expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    /// An argument's value does not fit the declared parameter type.
    #[error("argument '{name}' has an incompatible value")]
    ArgumentType { name: String },

    /// A named binding does not match any formal parameter.
    #[error("no parameter named '{name}'")]
    UnknownParameter { name: String },

    /// Member access or invocation through a null reference.
    #[error("null reference in {context}")]
    NullReference { context: String },

    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivideByZero,

    /// A checked cast failed at runtime.
    #[error("invalid cast from {from} to {to}")]
    InvalidCast { from: String, to: String },

    /// An index was outside the bounds of an array.
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: i64, len: usize },

    /// A host callable reported a failure.
    #[error("host error: {message}")]
    Host { message: String },
}

// ============================================================================
// Top-level wrapper
// ============================================================================

/// Any failure the engine can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ExprError {
    /// The source span, for errors that carry one.
    pub fn span(&self) -> Option<Span> {
        match self {
            ExprError::Lex(e) => Some(e.span()),
            ExprError::Parse(e) => Some(e.span()),
            _ => None,
        }
    }
}
