//! Primary expressions and the postfix loop.
//!
//! Primary parsing handles literals, identifiers (variables, constants,
//! type names, and the `new`/`typeof`/`true`/`false`/`null` reserved
//! words), parenthesized expressions with cast detection, and lambda
//! literals. The postfix loop then applies `.member`, `[args]`, and
//! `(args)` left to right until none match.

use dynexpr_core::{
    DataType, ParseError, ParseErrorKind, Span, TypeHash, Value, primitives,
};

use crate::expr::Expr;
use crate::lexer::TokenKind;

use super::Parser;

impl<'src, 'ctx> Parser<'src, 'ctx> {
    pub(crate) fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current.kind {
            TokenKind::IntLiteral => {
                let tok = self.bump()?;
                self.typed_int_literal(&tok.text, tok.span, false)
            }
            TokenKind::RealLiteral => {
                let tok = self.bump()?;
                self.typed_real_literal(&tok.text, tok.span, false)
            }
            TokenKind::StringLiteral => {
                let tok = self.bump()?;
                Ok(Expr::literal(Value::Str(tok.text)))
            }
            TokenKind::CharLiteral => {
                let tok = self.bump()?;
                let ch = tok.text.chars().next().ok_or_else(|| {
                    ParseError::new(ParseErrorKind::Internal, tok.span, "empty char literal")
                })?;
                Ok(Expr::literal(Value::Char(ch)))
            }
            TokenKind::LParen => self.parse_paren_or_lambda(),
            TokenKind::Identifier => self.parse_identifier(),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                self.current.span,
                format!("expected expression, found {}", self.current.kind.description()),
            )),
        }
    }

    // =========================================
    // Identifiers and reserved words
    // =========================================

    fn parse_identifier(&mut self) -> Result<Expr, ParseError> {
        if !self.current.escaped {
            match self.current.text.as_str() {
                "true" => {
                    self.bump()?;
                    return Ok(Expr::literal(Value::Bool(true)));
                }
                "false" => {
                    self.bump()?;
                    return Ok(Expr::literal(Value::Bool(false)));
                }
                "null" => {
                    self.bump()?;
                    return Ok(Expr::literal(Value::Null));
                }
                "new" => return self.parse_new(),
                "typeof" => return self.parse_typeof(),
                _ => {}
            }
        }

        let tok = self.bump()?;

        // A bare name directly followed by `=>` is a one-parameter
        // lambda literal.
        if self.at(TokenKind::Arrow) {
            self.bump()?;
            return self.parse_unbound_lambda(vec![(tok.text, tok.span)]);
        }

        if let Some((_, slot, ty)) = self.scope_lookup(&tok.text) {
            return Ok(Expr::Variable {
                slot: *slot,
                ty: ty.clone(),
            });
        }
        if let Some(var) = self.ctx.variable(&tok.text) {
            return Ok(Expr::Variable {
                slot: var.slot,
                ty: var.ty.clone(),
            });
        }
        if let Some(value) = self.ctx.constant(&tok.text) {
            return Ok(Expr::literal(value.clone()));
        }
        if let Some(entry) = self
            .ctx
            .registry()
            .get_by_name(&tok.text, self.ignore_case())
        {
            return Ok(Expr::literal(Value::Type(DataType::Simple(entry.hash))));
        }

        Err(ParseError::new(
            ParseErrorKind::UnknownIdentifier,
            tok.span,
            format!("name '{}'", tok.text),
        ))
    }

    // =========================================
    // Parentheses, casts, lambda parameter lists
    // =========================================

    fn parse_paren_or_lambda(&mut self) -> Result<Expr, ParseError> {
        // `(a, b) => ...` and `() => ...` need more than one token of
        // lookahead; scan the parameter-list shape and rewind on a miss.
        if let Some(params) = self.try_lambda_params()? {
            return self.parse_unbound_lambda(params);
        }

        self.expect(TokenKind::LParen)?;
        let inner = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        // Cast detection: a parenthesized type reference followed by
        // something that starts a primary is a checked conversion.
        if let Some(target) = inner.as_type_literal().cloned()
            && self.starts_primary()
        {
            let span = self.current.span;
            let operand = self.parse_unary()?;
            return Ok(Expr::Convert {
                operand: Box::new(operand),
                target: self.concrete_cast_target(target, span)?,
                checked: true,
            });
        }

        Ok(inner)
    }

    /// If the tokens ahead form `(name, name, ...) =>`, consume through
    /// the arrow and return the parameter names. Otherwise rewind.
    fn try_lambda_params(&mut self) -> Result<Option<Vec<(String, Span)>>, ParseError> {
        let mark = self.checkpoint();
        let mut scan = || -> Result<Option<Vec<(String, Span)>>, ParseError> {
            self.expect(TokenKind::LParen)?;
            let mut params = Vec::new();
            if !self.at(TokenKind::RParen) {
                loop {
                    if !self.at(TokenKind::Identifier) {
                        return Ok(None);
                    }
                    let tok = self.bump()?;
                    params.push((tok.text, tok.span));
                    if !self.eat(TokenKind::Comma)? {
                        break;
                    }
                }
            }
            if !self.eat(TokenKind::RParen)? {
                return Ok(None);
            }
            if !self.eat(TokenKind::Arrow)? {
                return Ok(None);
            }
            Ok(Some(params))
        };
        match scan() {
            Ok(Some(params)) => Ok(Some(params)),
            Ok(None) => {
                self.rewind(mark);
                Ok(None)
            }
            Err(_) => {
                self.rewind(mark);
                Ok(None)
            }
        }
    }

    fn starts_primary(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Identifier
                | TokenKind::IntLiteral
                | TokenKind::RealLiteral
                | TokenKind::StringLiteral
                | TokenKind::CharLiteral
                | TokenKind::LParen
                | TokenKind::Bang
                | TokenKind::Plus
                | TokenKind::Minus
        )
    }

    /// A cast target must name a real type; the `<type>` pseudo-types
    /// never cast.
    fn concrete_cast_target(
        &self,
        target: DataType,
        span: Span,
    ) -> Result<DataType, ParseError> {
        match &target {
            DataType::Simple(h) if *h == primitives::NULL || *h == primitives::TYPE => Err(
                ParseError::new(ParseErrorKind::TypeConversion, span, "invalid cast target"),
            ),
            _ => Ok(target),
        }
    }

    // =========================================
    // Lambda literals (unbound state)
    // =========================================

    /// Capture a lambda body as raw text. The parameter types are not
    /// yet known, so the body cannot be parsed here; overload resolution
    /// realizes it once the target function type is concrete.
    fn parse_unbound_lambda(
        &mut self,
        params: Vec<(String, Span)>,
    ) -> Result<Expr, ParseError> {
        for (i, (name, span)) in params.iter().enumerate() {
            if params[..i].iter().any(|(other, _)| other == name) {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateParameter,
                    *span,
                    format!("parameter '{name}'"),
                ));
            }
        }

        let start = self.current.span.start;
        let mut end = start;
        let mut depth = 0u32;
        // Conditionals inside the body keep their `:`; only an unpaired
        // colon ends the capture.
        let mut conditionals = 0u32;
        loop {
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Question if depth == 0 => conditionals += 1,
                TokenKind::Comma if depth == 0 => break,
                TokenKind::Colon if depth == 0 => {
                    if conditionals == 0 {
                        break;
                    }
                    conditionals -= 1;
                }
                _ => {}
            }
            end = self.current.span.end();
            self.bump()?;
        }
        if end == start {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                Span::point(start),
                "lambda body is empty",
            ));
        }

        let body = self.source()[start as usize..end as usize].to_string();
        let arity = params.len() as u8;
        Ok(Expr::Unbound {
            params: params.into_iter().map(|(name, _)| name).collect(),
            body,
            captured_scope: self.scope.clone(),
            ty: DataType::UnboundLambda { arity },
        })
    }

    // =========================================
    // new / typeof
    // =========================================

    /// `new Type(args)` or `new Type[] { items }`.
    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        self.bump()?;
        let name_tok = self.expect(TokenKind::Identifier)?;
        let Some(entry) = self
            .ctx
            .registry()
            .get_by_name(&name_tok.text, self.ignore_case())
        else {
            return Err(ParseError::new(
                ParseErrorKind::UnknownIdentifier,
                name_tok.span,
                format!("type '{}'", name_tok.text),
            ));
        };
        let hash = entry.hash;
        let type_name = entry.name.clone();
        let constructors = entry.constructors.clone();

        if self.eat(TokenKind::LBracket)? {
            self.expect(TokenKind::RBracket)?;
            let elem = DataType::Simple(hash);
            self.expect(TokenKind::LBrace)?;
            let mut items = Vec::new();
            if !self.at(TokenKind::RBrace) {
                loop {
                    let span = self.current.span;
                    let item = self.parse_expression()?;
                    items.push(self.promote(item, &elem, false, span)?);
                    if !self.eat(TokenKind::Comma)? {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBrace)?;
            return Ok(Expr::NewArray { elem, items });
        }

        let span = self.current.span;
        self.expect(TokenKind::LParen)?;
        let args = self.parse_argument_list()?;
        let candidates = self.resolve_candidates(&constructors, &args, span)?;
        if candidates.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::NoApplicableConstructor,
                span,
                format!("type '{type_name}'"),
            ));
        }
        let best = self.pick_best(candidates, span, &format!("constructor of '{type_name}'"))?;
        Ok(Expr::Call {
            target: None,
            method: best.method,
            args: best.args,
            ty: DataType::Simple(hash),
        })
    }

    /// `typeof(Type)`, guarded by the reflection setting.
    fn parse_typeof(&mut self) -> Result<Expr, ParseError> {
        let kw_span = self.current.span;
        self.bump()?;
        if !self.ctx.settings().allow_reflection {
            return Err(ParseError::new(
                ParseErrorKind::ReflectionNotAllowed,
                kw_span,
                "'typeof' is disabled",
            ));
        }
        self.expect(TokenKind::LParen)?;
        let ty = self.parse_type_reference(true)?;
        self.expect(TokenKind::RParen)?;
        Ok(Expr::literal(Value::Type(ty)))
    }

    // =========================================
    // Type references
    // =========================================

    /// A nominal type name with optional `[]` and (when unambiguous)
    /// `?` suffixes.
    pub(crate) fn parse_type_reference(
        &mut self,
        allow_suffixes: bool,
    ) -> Result<DataType, ParseError> {
        let tok = self.expect(TokenKind::Identifier)?;
        let Some(entry) = self
            .ctx
            .registry()
            .get_by_name(&tok.text, self.ignore_case())
        else {
            return Err(ParseError::new(
                ParseErrorKind::UnknownIdentifier,
                tok.span,
                format!("type '{}'", tok.text),
            ));
        };
        let mut ty = DataType::Simple(entry.hash);

        if !allow_suffixes {
            return Ok(ty);
        }
        loop {
            if self.at(TokenKind::Question) {
                // `x is int ? a : b` keeps `?` for the conditional; a
                // nullable suffix only applies when no expression can
                // follow.
                let mark = self.checkpoint();
                self.bump()?;
                if self.starts_primary() {
                    self.rewind(mark);
                    break;
                }
                ty = DataType::nullable(ty);
            } else if self.at(TokenKind::LBracket) {
                self.bump()?;
                self.expect(TokenKind::RBracket)?;
                ty = DataType::array(ty);
            } else {
                break;
            }
        }
        Ok(ty)
    }

    // =========================================
    // Postfix loop
    // =========================================

    pub(crate) fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        loop {
            if self.at(TokenKind::Dot) {
                self.bump()?;
                let name_tok = self.expect(TokenKind::Identifier)?;
                expr = self.parse_member(expr, &name_tok.text, name_tok.span)?;
            } else if self.at(TokenKind::LBracket) {
                let span = self.current.span;
                self.bump()?;
                let mut args = Vec::new();
                loop {
                    args.push(self.parse_expression()?);
                    if !self.eat(TokenKind::Comma)? {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket)?;
                expr = self.parse_index(expr, args, span)?;
            } else if self.at(TokenKind::LParen) && expr.as_type_literal().is_none() {
                let span = self.current.span;
                self.bump()?;
                let args = self.parse_argument_list()?;
                expr = self.parse_invoke_value(expr, args, span)?;
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated arguments up to a closing paren, which is
    /// consumed.
    pub(crate) fn parse_argument_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    // =========================================
    // Member access
    // =========================================

    fn parse_member(&mut self, target: Expr, name: &str, span: Span) -> Result<Expr, ParseError> {
        // Type literal receiver: static member access.
        if let Some(dt) = target.as_type_literal().cloned() {
            let DataType::Simple(hash) = dt else {
                return Err(ParseError::new(
                    ParseErrorKind::UnknownMember,
                    span,
                    format!("member '{name}'"),
                ));
            };
            return self.parse_static_member(hash, name, span);
        }

        let target_ty = target.ty();

        // Arrays expose only their length directly.
        if matches!(target_ty.non_nullable(), DataType::Array(_)) {
            let length = if self.ignore_case() {
                name.eq_ignore_ascii_case("Length")
            } else {
                name == "Length"
            };
            if length {
                return Ok(Expr::ArrayLength {
                    target: Box::new(target),
                });
            }
        }

        if self.at(TokenKind::LParen) {
            self.bump()?;
            let args = self.parse_argument_list()?;
            return self.resolve_method_call(target, name, args, span);
        }

        let Some(hash) = self.receiver_hash(&target_ty) else {
            return Err(ParseError::new(
                ParseErrorKind::UnknownMember,
                span,
                format!(
                    "member '{name}' on '{}'",
                    self.ctx.registry().type_name(&target_ty)
                ),
            ));
        };
        let field = self
            .ctx
            .resolver()
            .find_field(self.ctx.registry(), hash, name, self.instance_flags());
        match field {
            Some(field) => Ok(Expr::Field {
                target: Some(Box::new(target)),
                field,
            }),
            None => Err(ParseError::new(
                ParseErrorKind::UnknownMember,
                span,
                format!(
                    "member '{name}' on '{}'",
                    self.ctx.registry().type_name(&target_ty)
                ),
            )),
        }
    }

    fn parse_static_member(
        &mut self,
        hash: TypeHash,
        name: &str,
        span: Span,
    ) -> Result<Expr, ParseError> {
        if self.at(TokenKind::LParen) {
            self.bump()?;
            let args = self.parse_argument_list()?;
            let levels =
                self.ctx
                    .resolver()
                    .member_levels(self.ctx.registry(), hash, name, self.static_flags());
            for level in levels.iter() {
                let candidates = self.resolve_candidates(&level.methods, &args, span)?;
                if !candidates.is_empty() {
                    let best = self.pick_best(candidates, span, name)?;
                    let ty = best.method.ret.clone();
                    return Ok(Expr::Call {
                        target: None,
                        method: best.method,
                        args: best.args,
                        ty,
                    });
                }
            }
            return Err(ParseError::new(
                ParseErrorKind::NoApplicableMethod,
                span,
                format!("static method '{name}'"),
            ));
        }

        let field = self
            .ctx
            .resolver()
            .find_field(self.ctx.registry(), hash, name, self.static_flags());
        match field {
            Some(field) => Ok(Expr::Field {
                target: None,
                field,
            }),
            None => Err(ParseError::new(
                ParseErrorKind::UnknownMember,
                span,
                format!("static member '{name}'"),
            )),
        }
    }

    /// Level-by-level instance method resolution. The first level with
    /// any applicable candidate wins; extension functions are consulted
    /// only when no declared member matches.
    fn resolve_method_call(
        &mut self,
        target: Expr,
        name: &str,
        args: Vec<Expr>,
        span: Span,
    ) -> Result<Expr, ParseError> {
        let target_ty = target.ty();
        if let Some(hash) = self.receiver_hash(&target_ty) {
            let levels = self.ctx.resolver().member_levels(
                self.ctx.registry(),
                hash,
                name,
                self.instance_flags(),
            );
            for level in levels.iter() {
                let candidates = self.resolve_candidates(&level.methods, &args, span)?;
                if !candidates.is_empty() {
                    let best = self.pick_best(candidates, span, name)?;
                    let ty = best.method.ret.clone();
                    return Ok(Expr::Call {
                        target: Some(Box::new(target)),
                        method: best.method,
                        args: best.args,
                        ty,
                    });
                }
            }
        }

        // Extension functions: the receiver becomes the first argument.
        let extensions: Vec<_> = self
            .ctx
            .extension_candidates(name)
            .into_iter()
            .cloned()
            .collect();
        if !extensions.is_empty() {
            let mut ext_args = Vec::with_capacity(args.len() + 1);
            ext_args.push(target);
            ext_args.extend(args);
            let candidates = self.resolve_candidates(&extensions, &ext_args, span)?;
            if !candidates.is_empty() {
                let best = self.pick_best(candidates, span, name)?;
                let ty = best.method.ret.clone();
                return Ok(Expr::Call {
                    target: None,
                    method: best.method,
                    args: best.args,
                    ty,
                });
            }
        }

        Err(ParseError::new(
            ParseErrorKind::NoApplicableMethod,
            span,
            format!(
                "method '{name}' on '{}'",
                self.ctx.registry().type_name(&target_ty)
            ),
        ))
    }

    // =========================================
    // Indexing and value invocation
    // =========================================

    fn parse_index(
        &mut self,
        target: Expr,
        mut args: Vec<Expr>,
        span: Span,
    ) -> Result<Expr, ParseError> {
        let target_ty = target.ty();

        if let DataType::Array(elem) = target_ty.non_nullable() {
            if args.len() != 1 {
                return Err(ParseError::new(
                    ParseErrorKind::NoApplicableIndexer,
                    span,
                    "arrays take exactly one index",
                ));
            }
            let index = args.remove(0);
            let index =
                self.promote(index, &DataType::Simple(primitives::INT32), true, span)?;
            let elem = (**elem).clone();
            return Ok(Expr::ArrayIndex {
                target: Box::new(target),
                index: Box::new(index),
                ty: elem,
            });
        }

        let Some(hash) = self.receiver_hash(&target_ty) else {
            return Err(ParseError::new(
                ParseErrorKind::NoApplicableIndexer,
                span,
                format!("type '{}'", self.ctx.registry().type_name(&target_ty)),
            ));
        };
        let levels = self
            .ctx
            .resolver()
            .indexer_levels(self.ctx.registry(), hash);
        let mut applicable = Vec::new();
        for level in &levels {
            applicable = self.resolve_candidates(&level.methods, &args, span)?;
            if !applicable.is_empty() {
                break;
            }
        }
        if applicable.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::NoApplicableIndexer,
                span,
                format!("type '{}'", self.ctx.registry().type_name(&target_ty)),
            ));
        }
        let best = self.pick_best_indexer(applicable, span)?;
        let ty = best.method.ret.clone();
        Ok(Expr::Index {
            target: Box::new(target),
            method: best.method,
            args: best.args,
            ty,
        })
    }

    /// `(args)` applied to a function-typed value.
    fn parse_invoke_value(
        &mut self,
        target: Expr,
        args: Vec<Expr>,
        span: Span,
    ) -> Result<Expr, ParseError> {
        let target_ty = target.ty();
        let DataType::Function { params, ret } = &target_ty else {
            return Err(ParseError::new(
                ParseErrorKind::NoApplicableMethod,
                span,
                format!(
                    "value of type '{}' is not callable",
                    self.ctx.registry().type_name(&target_ty)
                ),
            ));
        };
        if args.len() != params.len() {
            return Err(ParseError::new(
                ParseErrorKind::NoApplicableMethod,
                span,
                format!("expected {} arguments, got {}", params.len(), args.len()),
            ));
        }
        let params = params.clone();
        let ret = (**ret).clone();
        let mut promoted = Vec::with_capacity(args.len());
        for (arg, param) in args.into_iter().zip(&params) {
            promoted.push(self.promote(arg, param, false, span)?);
        }
        Ok(Expr::InvokeFn {
            target: Box::new(target),
            args: promoted,
            ty: ret,
        })
    }
}
