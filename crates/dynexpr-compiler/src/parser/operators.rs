//! Operator precedence levels.
//!
//! Each binary level is a left-associative loop: parse one
//! higher-precedence operand, then combine while the current token
//! matches this level's operators. Lowest binding first: assignment,
//! conditional, `||`, `&&`, comparison, `is`/`as`, additive,
//! multiplicative, unary.

use dynexpr_core::{DataType, NumericKind, ParseError, ParseErrorKind, Span};

use crate::context::AssignmentOperators;
use crate::conversion::{accepts_null, assignable_from, widens};
use crate::expr::{AssignTarget, BinaryOp, Expr, UnaryOp};
use crate::lexer::TokenKind;

use super::Parser;

impl<'src, 'ctx> Parser<'src, 'ctx> {
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    // =========================================
    // Assignment
    // =========================================

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_conditional()?;
        if !self.at(TokenKind::Eq) {
            return Ok(left);
        }

        let op_span = self.current.span;
        if !self
            .ctx
            .settings()
            .assignment_operators
            .contains(AssignmentOperators::ASSIGN)
        {
            return Err(ParseError::new(
                ParseErrorKind::AssignmentDisabled,
                op_span,
                "operator '='",
            ));
        }
        self.bump()?;

        let (target, target_ty) = match left {
            Expr::Variable { slot, ty } => (AssignTarget::Slot(slot), ty),
            Expr::Field { target, field } if field.setter.is_some() => {
                let ty = field.ty.clone();
                (AssignTarget::Field { target, field }, ty)
            }
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::NotAssignable,
                    op_span,
                    "left side of '=' is not a writable variable or member",
                ));
            }
        };

        // Right-associative: a = b = c assigns c to both.
        let value = self.parse_assignment()?;
        let value = self.promote(value, &target_ty, false, op_span)?;
        Ok(Expr::Assign {
            target,
            value: Box::new(value),
            ty: target_ty,
        })
    }

    // =========================================
    // Conditional
    // =========================================

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let test = self.parse_logical_or()?;
        if !self.at(TokenKind::Question) {
            return Ok(test);
        }
        let q_span = self.current.span;
        if !test.ty().is_bool() {
            return Err(ParseError::new(
                ParseErrorKind::TypeConversion,
                q_span,
                "conditional test must be bool",
            ));
        }
        self.bump()?;
        let then_branch = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        let else_branch = self.parse_conditional()?;
        self.reconcile_branches(test, then_branch, else_branch, q_span)
    }

    /// Unify the two branch types: identical types pass through, a
    /// single promotable direction promotes, anything else fails.
    fn reconcile_branches(
        &mut self,
        test: Expr,
        then_branch: Expr,
        else_branch: Expr,
        span: Span,
    ) -> Result<Expr, ParseError> {
        let t_then = then_branch.ty();
        let t_else = else_branch.ty();

        let (then_branch, else_branch, ty) = if t_then == t_else {
            (then_branch, else_branch, t_then)
        } else {
            let then_to_else = self.promote(then_branch.clone(), &t_else, false, span);
            let else_to_then = self.promote(else_branch.clone(), &t_then, false, span);
            match (then_to_else, else_to_then) {
                (Ok(promoted), Err(_)) => (promoted, else_branch, t_else),
                (Err(_), Ok(promoted)) => (then_branch, promoted, t_then),
                _ => {
                    let registry = self.ctx.registry();
                    return Err(ParseError::new(
                        ParseErrorKind::IncompatibleBranches,
                        span,
                        format!(
                            "conditional branches have incompatible types '{}' and '{}'",
                            registry.type_name(&t_then),
                            registry.type_name(&t_else)
                        ),
                    ));
                }
            }
        };

        Ok(Expr::Conditional {
            test: Box::new(test),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            ty,
        })
    }

    // =========================================
    // Logical operators
    // =========================================

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.at(TokenKind::PipePipe) {
            let span = self.current.span;
            self.bump()?;
            let right = self.parse_logical_and()?;
            left = self.logical_node(BinaryOp::Or, left, right, span)?;
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        while self.at(TokenKind::AmpAmp) {
            let span = self.current.span;
            self.bump()?;
            let right = self.parse_comparison()?;
            left = self.logical_node(BinaryOp::And, left, right, span)?;
        }
        Ok(left)
    }

    fn logical_node(
        &self,
        op: BinaryOp,
        left: Expr,
        right: Expr,
        span: Span,
    ) -> Result<Expr, ParseError> {
        if !left.ty().is_bool() || !right.ty().is_bool() {
            return Err(ParseError::new(
                ParseErrorKind::TypeConversion,
                span,
                "logical operator requires bool operands",
            ));
        }
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty: DataType::BOOL,
        })
    }

    // =========================================
    // Comparison
    // =========================================

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_type_test()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => return Ok(left),
            };
            let span = self.current.span;
            self.bump()?;
            let right = self.parse_type_test()?;
            left = self.comparison_node(op, left, right, span)?;
        }
    }

    fn comparison_node(
        &mut self,
        op: BinaryOp,
        left: Expr,
        right: Expr,
        span: Span,
    ) -> Result<Expr, ParseError> {
        let lt = left.ty();
        let rt = right.ty();
        let equality = matches!(op, BinaryOp::Eq | BinaryOp::Ne);

        // Textual comparisons lower into an ordinal comparison in the
        // evaluator rather than native ordering.
        if lt.is_textual() && rt.is_textual() {
            return Ok(self.bool_binary(op, left, right));
        }

        if let (Some(lk), Some(rk)) = (lt.numeric_kind(), rt.numeric_kind()) {
            let common = self.common_numeric(lk, rk, span)?;
            let target = DataType::Simple(common.type_hash());
            let left = self.promote(left, &target, true, span)?;
            let right = self.promote(right, &target, true, span)?;
            return Ok(self.bool_binary(op, left, right));
        }

        if equality {
            let registry = self.ctx.registry();
            if left.is_null_literal() && accepts_null(registry, &rt) {
                let left = self.promote(left, &rt, false, span)?;
                return Ok(self.bool_binary(op, left, right));
            }
            if right.is_null_literal() && accepts_null(registry, &lt) {
                let right = self.promote(right, &lt, false, span)?;
                return Ok(self.bool_binary(op, left, right));
            }
            if lt == rt
                || assignable_from(registry, &lt, &rt)
                || assignable_from(registry, &rt, &lt)
            {
                return Ok(self.bool_binary(op, left, right));
            }
        }

        Err(self.conversion_error(&lt, &rt, span))
    }

    fn bool_binary(&self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty: DataType::BOOL,
        }
    }

    // =========================================
    // Type tests
    // =========================================

    fn parse_type_test(&mut self) -> Result<Expr, ParseError> {
        let mut operand = self.parse_additive()?;
        loop {
            let as_cast = if self.current.is_keyword("is") {
                false
            } else if self.current.is_keyword("as") {
                true
            } else {
                return Ok(operand);
            };
            let span = self.current.span;
            self.bump()?;
            let target = self.parse_type_reference(true)?;
            let ty = if as_cast {
                if !accepts_null(self.ctx.registry(), &target) {
                    return Err(ParseError::new(
                        ParseErrorKind::TypeConversion,
                        span,
                        "'as' requires a reference or nullable target type",
                    ));
                }
                target.clone()
            } else {
                DataType::BOOL
            };
            operand = Expr::TypeTest {
                operand: Box::new(operand),
                target,
                as_cast,
                ty,
            };
        }
    }

    // =========================================
    // Arithmetic
    // =========================================

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            let span = self.current.span;
            self.bump()?;
            let right = self.parse_multiplicative()?;
            // `+` with a textual operand is concatenation, never
            // numeric addition.
            if op == BinaryOp::Add && (left.ty().is_textual() || right.ty().is_textual()) {
                left = Expr::Binary {
                    op: BinaryOp::Concat,
                    left: Box::new(left),
                    right: Box::new(right),
                    ty: DataType::STRING,
                };
            } else {
                left = self.numeric_binary(op, left, right, span)?;
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(left),
            };
            let span = self.current.span;
            self.bump()?;
            let right = self.parse_unary()?;
            left = self.numeric_binary(op, left, right, span)?;
        }
    }

    fn numeric_binary(
        &mut self,
        op: BinaryOp,
        left: Expr,
        right: Expr,
        span: Span,
    ) -> Result<Expr, ParseError> {
        let lt = left.ty();
        let rt = right.ty();
        let (Some(lk), Some(rk)) = (lt.numeric_kind(), rt.numeric_kind()) else {
            return Err(ParseError::new(
                ParseErrorKind::TypeConversion,
                span,
                format!(
                    "arithmetic operator requires numeric operands, got '{}' and '{}'",
                    self.ctx.registry().type_name(&lt),
                    self.ctx.registry().type_name(&rt)
                ),
            ));
        };
        let common = self.common_numeric(lk, rk, span)?;
        let target = DataType::Simple(common.type_hash());
        let left = self.promote(left, &target, true, span)?;
        let right = self.promote(right, &target, true, span)?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty: target,
        })
    }

    /// The widening target both operand kinds convert to, if any.
    fn common_numeric(
        &self,
        lk: NumericKind,
        rk: NumericKind,
        span: Span,
    ) -> Result<NumericKind, ParseError> {
        if widens(lk, rk) {
            Ok(rk)
        } else if widens(rk, lk) {
            Ok(lk)
        } else {
            Err(ParseError::new(
                ParseErrorKind::TypeConversion,
                span,
                "operand types have no common numeric type",
            ))
        }
    }

    // =========================================
    // Unary
    // =========================================

    pub(crate) fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.current.kind {
            TokenKind::Minus => {
                let span = self.current.span;
                self.bump()?;
                // A minus directly prefixing a numeric literal folds
                // into the literal so the signed typing rule applies.
                if self.at(TokenKind::IntLiteral) {
                    let tok = self.bump()?;
                    let lit = self.typed_int_literal(&tok.text, tok.span.merge(span), true)?;
                    return self.parse_postfix(lit);
                }
                if self.at(TokenKind::RealLiteral) {
                    let tok = self.bump()?;
                    let lit = self.typed_real_literal(&tok.text, tok.span.merge(span), true)?;
                    return self.parse_postfix(lit);
                }
                let operand = self.parse_unary()?;
                self.negate_node(operand, span)
            }
            TokenKind::Plus => {
                let span = self.current.span;
                self.bump()?;
                let operand = self.parse_unary()?;
                if operand.ty().numeric_kind().is_none() {
                    return Err(ParseError::new(
                        ParseErrorKind::TypeConversion,
                        span,
                        "unary '+' requires a numeric operand",
                    ));
                }
                Ok(operand)
            }
            TokenKind::Bang => {
                let span = self.current.span;
                self.bump()?;
                let operand = self.parse_unary()?;
                if !operand.ty().is_bool() {
                    return Err(ParseError::new(
                        ParseErrorKind::TypeConversion,
                        span,
                        "unary '!' requires a bool operand",
                    ));
                }
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    ty: DataType::BOOL,
                })
            }
            _ => {
                let primary = self.parse_primary()?;
                self.parse_postfix(primary)
            }
        }
    }

    /// Build a negation node, widening unsigned operands into the
    /// signed kind that holds them. `ulong` has no such kind and fails.
    fn negate_node(&mut self, operand: Expr, span: Span) -> Result<Expr, ParseError> {
        let Some(kind) = operand.ty().numeric_kind() else {
            return Err(ParseError::new(
                ParseErrorKind::TypeConversion,
                span,
                "unary '-' requires a numeric operand",
            ));
        };
        let result_kind = match kind {
            NumericKind::U8 => NumericKind::I16,
            NumericKind::U16 => NumericKind::I32,
            NumericKind::U32 => NumericKind::I64,
            NumericKind::U64 => {
                return Err(ParseError::new(
                    ParseErrorKind::TypeConversion,
                    span,
                    "cannot negate a ulong value",
                ));
            }
            signed => signed,
        };
        let target = DataType::Simple(result_kind.type_hash());
        let operand = self.promote(operand, &target, true, span)?;
        Ok(Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(operand),
            ty: target,
        })
    }
}
