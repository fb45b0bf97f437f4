//! Lambda realization.
//!
//! A lambda literal is captured as raw text because its parameter types
//! are unknown at the point it appears. Once overload resolution (or an
//! explicit promotion) supplies a concrete function type, the body text
//! is parsed in a child scope whose parameters carry those types. The
//! child parser shares the frame slot counter, so every parameter gets
//! a slot disjoint from the outer expression's.

use std::rc::Rc;
use std::sync::Arc;

use dynexpr_core::{DataType, ParseError, ParseErrorKind, Span};

use crate::expr::Expr;
use crate::parser::Parser;

impl<'src, 'ctx> Parser<'src, 'ctx> {
    /// Turn an unbound lambda into a typed [`Expr::Lambda`] against a
    /// concrete function type.
    pub(crate) fn realize_lambda(
        &mut self,
        unbound: &Expr,
        target: &DataType,
        span: Span,
    ) -> Result<Expr, ParseError> {
        let Expr::Unbound {
            params,
            body,
            captured_scope,
            ..
        } = unbound
        else {
            return Err(ParseError::new(
                ParseErrorKind::Internal,
                span,
                "realization target is not a lambda literal",
            ));
        };
        let DataType::Function {
            params: param_tys,
            ret,
        } = target
        else {
            return Err(ParseError::new(
                ParseErrorKind::TypeConversion,
                span,
                "lambda literal requires a concrete function type",
            ));
        };
        if params.len() != param_tys.len() {
            return Err(ParseError::new(
                ParseErrorKind::TypeConversion,
                span,
                format!(
                    "lambda takes {} parameters, target takes {}",
                    params.len(),
                    param_tys.len()
                ),
            ));
        }

        let mut scope = captured_scope.clone();
        let mut param_slots = Vec::with_capacity(params.len());
        for (name, ty) in params.iter().zip(param_tys) {
            let slot = self.alloc_slot();
            param_slots.push(slot);
            scope.push((name.clone(), slot, ty.clone()));
        }

        let mut inner = Parser::with_scope(body, self.ctx, scope, Rc::clone(&self.slots))?;
        let parsed = inner.parse_full()?;
        let parsed = inner.promote(parsed, ret, false, span)?;

        Ok(Expr::Lambda {
            param_slots,
            body: Arc::new(parsed),
            ty: target.clone(),
        })
    }
}
