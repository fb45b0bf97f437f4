//! The recursive-descent parser.
//!
//! Parsing and static resolution are one pass: the parser consumes
//! tokens left to right and queries the context, resolver, and
//! conversion rules as it descends, so every [`Expr`] node is fully
//! typed the moment it is built. One token of lookahead suffices;
//! the lambda-parameter-list and cast disambiguations use an explicit
//! checkpoint/rewind of the lexer.
//!
//! The `impl Parser` blocks are spread over this module's files:
//! operator precedence levels in `operators.rs`, primary and postfix
//! forms in `primary.rs`, overload resolution in `overload.rs`, and
//! lambda realization in `lambda.rs`.

mod operators;
mod primary;

use std::cell::Cell;
use std::rc::Rc;

use dynexpr_core::{
    DataType, ParseError, ParseErrorKind, Span, Value, primitives,
};

use crate::context::ExpressionContext;
use crate::conversion::{accepts_null, assignable_from, is_compatible};
use crate::expr::Expr;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::resolver::BindingFlags;

/// A name visible inside a lambda body: name, frame slot, type.
pub(crate) type ScopeVar = (String, usize, DataType);

/// Parser state for one expression text.
pub struct Parser<'src, 'ctx> {
    lexer: Lexer<'src>,
    pub(crate) current: Token,
    pub(crate) ctx: &'ctx ExpressionContext,
    /// Lambda parameters in scope, innermost last.
    pub(crate) scope: Vec<ScopeVar>,
    /// Next free frame slot, shared with nested lambda-body parsers.
    pub(crate) slots: Rc<Cell<usize>>,
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    /// Create a parser over `source` with the context's variables
    /// occupying the first frame slots.
    pub fn new(source: &'src str, ctx: &'ctx ExpressionContext) -> Result<Self, ParseError> {
        let slots = Rc::new(Cell::new(ctx.variables().len()));
        Self::with_scope(source, ctx, Vec::new(), slots)
    }

    /// Create a nested parser (used to realize lambda bodies) with an
    /// explicit scope and a shared slot counter.
    pub(crate) fn with_scope(
        source: &'src str,
        ctx: &'ctx ExpressionContext,
        scope: Vec<ScopeVar>,
        slots: Rc<Cell<usize>>,
    ) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            ctx,
            scope,
            slots,
        })
    }

    /// Parse a complete expression and require end of input.
    pub fn parse_full(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.expect_eof()?;
        // A bare type value is metadata access, gated like `typeof`.
        if !self.ctx.settings().allow_reflection
            && matches!(expr.ty(), DataType::Simple(h) if h == primitives::TYPE)
        {
            return Err(ParseError::new(
                ParseErrorKind::ReflectionNotAllowed,
                Span::new(0, self.source().len() as u32),
                "type values are disabled",
            ));
        }
        Ok(expr)
    }

    /// Total frame slots allocated so far.
    pub fn slot_count(&self) -> usize {
        self.slots.get()
    }

    // =========================================
    // Token plumbing
    // =========================================

    /// Advance, returning the consumed token.
    pub(crate) fn bump(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        if self.at(kind) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Require a specific token kind.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            self.bump()
        } else {
            Err(self.unexpected(kind.description()))
        }
    }

    pub(crate) fn expect_eof(&mut self) -> Result<(), ParseError> {
        if self.at(TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    pub(crate) fn unexpected(&self, wanted: &str) -> ParseError {
        let kind = if self.at(TokenKind::Eof) {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::ExpectedToken
        };
        ParseError::new(
            kind,
            self.current.span,
            format!(
                "expected {wanted}, found {}",
                self.current.kind.description()
            ),
        )
    }

    /// Save lexer position plus current token for backtracking.
    pub(crate) fn checkpoint(&self) -> (u32, Token) {
        (self.lexer.offset(), self.current.clone())
    }

    pub(crate) fn rewind(&mut self, mark: (u32, Token)) {
        self.lexer.rewind(mark.0);
        self.current = mark.1;
    }

    pub(crate) fn source(&self) -> &'src str {
        self.lexer.source()
    }

    // =========================================
    // Context shortcuts
    // =========================================

    pub(crate) fn ignore_case(&self) -> bool {
        !self.ctx.settings().case_sensitive
    }

    pub(crate) fn instance_flags(&self) -> BindingFlags {
        let mut flags = BindingFlags::INSTANCE;
        if self.ignore_case() {
            flags |= BindingFlags::IGNORE_CASE;
        }
        flags
    }

    pub(crate) fn static_flags(&self) -> BindingFlags {
        let mut flags = BindingFlags::STATIC;
        if self.ignore_case() {
            flags |= BindingFlags::IGNORE_CASE;
        }
        flags
    }

    /// Allocate a fresh frame slot.
    pub(crate) fn alloc_slot(&self) -> usize {
        let slot = self.slots.get();
        self.slots.set(slot + 1);
        slot
    }

    /// Look up a name in the lambda scope, innermost first.
    pub(crate) fn scope_lookup(&self, name: &str) -> Option<&ScopeVar> {
        let ignore_case = self.ignore_case();
        self.scope.iter().rev().find(|(n, _, _)| {
            if ignore_case {
                n.eq_ignore_ascii_case(name)
            } else {
                n == name
            }
        })
    }

    // =========================================
    // Promotion
    // =========================================

    /// Insert whatever conversion makes `expr` usable where `target` is
    /// expected, or fail.
    ///
    /// Reference widenings pass through without a node; value
    /// conversions (and any conversion when `exact` is requested) get a
    /// [`Expr::Convert`] node. A null literal is retyped in place, and
    /// an unbound lambda meeting a fully concrete function type is
    /// realized here, which is the one-way transition out of the
    /// unbound state.
    pub(crate) fn promote(
        &mut self,
        expr: Expr,
        target: &DataType,
        exact: bool,
        span: Span,
    ) -> Result<Expr, ParseError> {
        let source = expr.ty();
        // A type value may only be consumed by casts, static access, and
        // `is`/`as`, none of which promote it; any other use is metadata
        // access and falls under the reflection setting.
        if !self.ctx.settings().allow_reflection
            && matches!(source, DataType::Simple(h) if h == primitives::TYPE)
        {
            return Err(ParseError::new(
                ParseErrorKind::ReflectionNotAllowed,
                span,
                "type values are disabled",
            ));
        }
        if source == *target {
            return Ok(expr);
        }

        if expr.is_null_literal() {
            if accepts_null(self.ctx.registry(), target) {
                return Ok(Expr::Literal {
                    value: Value::Null,
                    ty: target.clone(),
                });
            }
            return Err(self.conversion_error(&source, target, span));
        }

        if expr.is_unbound_lambda() {
            if matches!(target, DataType::Function { .. }) && !target.contains_placeholder() {
                return self.realize_lambda(&expr, target, span);
            }
            return Err(ParseError::new(
                ParseErrorKind::TypeConversion,
                span,
                "lambda literal requires a concrete function type",
            ));
        }

        let registry = self.ctx.registry();
        if matches!(target, DataType::Generic(_, _))
            && !target.contains_placeholder()
            && assignable_from(registry, target, &source)
        {
            return Ok(expr);
        }

        if is_compatible(registry, &source, target) {
            let needs_node = exact
                || registry.is_value_type(target)
                || matches!(target, DataType::Nullable(_));
            if needs_node {
                return Ok(Expr::Convert {
                    operand: Box::new(expr),
                    target: target.clone(),
                    checked: false,
                });
            }
            return Ok(expr);
        }

        Err(self.conversion_error(&source, target, span))
    }

    pub(crate) fn conversion_error(
        &self,
        source: &DataType,
        target: &DataType,
        span: Span,
    ) -> ParseError {
        let registry = self.ctx.registry();
        ParseError::new(
            ParseErrorKind::TypeConversion,
            span,
            format!(
                "no conversion from '{}' to '{}'",
                registry.type_name(source),
                registry.type_name(target)
            ),
        )
    }

    // =========================================
    // Literal typing
    // =========================================

    /// Type an integer literal: the smallest of int, uint, long, ulong
    /// that holds the value. A leading minus parses as long, narrowed to
    /// int when it fits.
    pub(crate) fn typed_int_literal(
        &self,
        text: &str,
        span: Span,
        negative: bool,
    ) -> Result<Expr, ParseError> {
        let invalid = || {
            ParseError::new(
                ParseErrorKind::InvalidLiteral,
                span,
                format!("integer literal '{text}' out of range"),
            )
        };
        if negative {
            let signed: i64 = format!("-{text}").parse().map_err(|_| invalid())?;
            if let Ok(narrow) = i32::try_from(signed) {
                Ok(Expr::literal(Value::I32(narrow)))
            } else {
                Ok(Expr::literal(Value::I64(signed)))
            }
        } else {
            let wide: u64 = text.parse().map_err(|_| invalid())?;
            if let Ok(v) = i32::try_from(wide) {
                Ok(Expr::literal(Value::I32(v)))
            } else if let Ok(v) = u32::try_from(wide) {
                Ok(Expr::literal(Value::U32(v)))
            } else if let Ok(v) = i64::try_from(wide) {
                Ok(Expr::literal(Value::I64(v)))
            } else {
                Ok(Expr::literal(Value::U64(wide)))
            }
        }
    }

    /// Type a real literal by its suffix: `F`/`f` single precision,
    /// `M`/`m` decimal, none double precision.
    pub(crate) fn typed_real_literal(
        &self,
        text: &str,
        span: Span,
        negative: bool,
    ) -> Result<Expr, ParseError> {
        let invalid = |style: &str| {
            ParseError::new(
                ParseErrorKind::InvalidLiteral,
                span,
                format!("invalid {style} literal '{text}'"),
            )
        };
        let (digits, suffix) = match text.chars().last() {
            Some(c @ ('F' | 'f' | 'M' | 'm')) => (&text[..text.len() - 1], Some(c)),
            _ => (text, None),
        };
        let sign = if negative { -1.0 } else { 1.0 };
        match suffix {
            Some('F' | 'f') => {
                let v: f32 = digits.parse().map_err(|_| invalid("float"))?;
                Ok(Expr::literal(Value::F32(v * sign as f32)))
            }
            Some(_) => {
                let v: f64 = digits.parse().map_err(|_| invalid("decimal"))?;
                Ok(Expr::literal(Value::Decimal(v * sign)))
            }
            None => {
                let v: f64 = digits.parse().map_err(|_| invalid("double"))?;
                Ok(Expr::literal(Value::F64(v * sign)))
            }
        }
    }

    /// The nominal hash behind a receiver type, after stripping a
    /// nullable wrapper.
    pub(crate) fn receiver_hash(&self, ty: &DataType) -> Option<dynexpr_core::TypeHash> {
        match ty.non_nullable() {
            DataType::Simple(h) => Some(*h),
            DataType::Generic(h, _) => Some(*h),
            // Arrays and functions dispatch through object's members.
            DataType::Array(_) | DataType::Function { .. } => Some(primitives::OBJECT),
            _ => None,
        }
    }
}
