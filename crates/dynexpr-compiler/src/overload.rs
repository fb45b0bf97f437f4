//! Overload resolution.
//!
//! Applicability filtering and best-candidate selection over a set of
//! method (or constructor, or indexer) definitions. Each definition is
//! screened against the actual arguments; survivors carry their fully
//! promoted argument list, so the winning candidate plugs straight into
//! a call node. Generic definitions are screened with deferred
//! promotion: placeholder parameters are matched after type arguments
//! have been inferred from the concrete positions.

use dynexpr_core::{DataType, MethodDef, ParseError, ParseErrorKind, Span, TypeHash};

use crate::conversion::{Better, assignable_from, compare_conversions};
use crate::expr::Expr;
use crate::infer::{Bindings, substitute, unify};
use crate::parser::Parser;

/// An applicable method with its arguments fully promoted.
pub struct Candidate {
    /// The definition, with type arguments substituted when generic.
    pub method: MethodDef,
    /// Final arguments: promoted, defaults appended, variadic tail
    /// packed.
    pub args: Vec<Expr>,
    /// Parameter type each original argument converts to.
    matched: Vec<DataType>,
    /// Static type of each original argument.
    sources: Vec<DataType>,
    used_variadic: bool,
    is_generic: bool,
    fixed: usize,
    declaring: TypeHash,
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    /// Screen every definition against `args`, keeping the applicable
    /// ones.
    pub(crate) fn resolve_candidates(
        &mut self,
        methods: &[MethodDef],
        args: &[Expr],
        span: Span,
    ) -> Result<Vec<Candidate>, ParseError> {
        let mut out = Vec::new();
        for method in methods {
            if let Some(candidate) = self.try_candidate(method, args, span)? {
                out.push(candidate);
            }
        }
        Ok(out)
    }

    /// Applicability check for one definition. `Ok(None)` means the
    /// definition simply does not fit these arguments.
    fn try_candidate(
        &mut self,
        method: &MethodDef,
        args: &[Expr],
        span: Span,
    ) -> Result<Option<Candidate>, ParseError> {
        let fixed = method.fixed_param_count();
        let tail = method.has_params_tail();
        if args.len() < method.required_param_count() {
            return Ok(None);
        }
        if !tail && args.len() > method.params.len() {
            return Ok(None);
        }
        if method.params.iter().any(|p| p.is_out) {
            return Ok(None);
        }

        let sources: Vec<DataType> = args.iter().map(|a| a.ty()).collect();
        let mut matched: Vec<DataType> = Vec::with_capacity(args.len());
        // None marks a deferred (placeholder-typed) position.
        let mut promoted: Vec<Option<Expr>> = Vec::with_capacity(args.len());
        let mut used_variadic = false;

        let tail_elem = if tail {
            match &method.params[fixed].ty {
                DataType::Array(elem) => Some((**elem).clone()),
                _ => return Ok(None),
            }
        } else {
            None
        };

        for (i, arg) in args.iter().enumerate() {
            let declared = if i < fixed {
                method.params[i].ty.clone()
            } else {
                // A single trailing argument may satisfy the variadic
                // parameter directly as an array.
                let elem = tail_elem.clone().unwrap_or(DataType::OBJECT);
                if i == fixed && args.len() == fixed + 1 {
                    let array_ty = method.params[fixed].ty.clone();
                    if let Some(expr) = self.try_promote(arg, &array_ty, span) {
                        matched.push(array_ty);
                        promoted.push(Some(expr));
                        continue;
                    }
                }
                used_variadic = true;
                elem
            };

            if declared.contains_placeholder() {
                // An unbound lambda gives a bare placeholder nothing to
                // infer from.
                if arg.is_unbound_lambda() && declared.is_bare_placeholder() {
                    return Ok(None);
                }
                matched.push(declared);
                promoted.push(None);
                continue;
            }

            match self.try_promote(arg, &declared, span) {
                Some(expr) => {
                    matched.push(declared);
                    promoted.push(Some(expr));
                }
                None => return Ok(None),
            }
        }

        let mut concrete = method.clone();
        if method.is_generic() {
            let registry = self.ctx.registry().clone();
            let mut bindings: Bindings = vec![None; method.type_params as usize];
            for (declared, source) in matched.iter().zip(&sources) {
                if !unify(&registry, declared, source, &mut bindings) {
                    return Ok(None);
                }
            }
            for param in &mut concrete.params {
                match substitute(&param.ty, &bindings) {
                    Some(ty) => param.ty = ty,
                    None => return Ok(None),
                }
            }
            match substitute(&method.ret, &bindings) {
                Some(ret) => concrete.ret = ret,
                None => return Ok(None),
            }

            // Re-match the deferred positions against the now concrete
            // parameter types.
            for i in 0..matched.len() {
                if promoted[i].is_some() {
                    continue;
                }
                let Some(ty) = substitute(&matched[i], &bindings) else {
                    return Ok(None);
                };
                match self.try_promote(&args[i], &ty, span) {
                    Some(expr) => {
                        matched[i] = ty;
                        promoted[i] = Some(expr);
                    }
                    None => return Ok(None),
                }
            }
        }

        let mut resolved: Vec<Expr> = Vec::with_capacity(promoted.len());
        for expr in promoted {
            resolved.push(expr.ok_or_else(|| {
                ParseError::new(ParseErrorKind::Internal, span, "unresolved argument")
            })?);
        }
        let tail_args: Vec<Expr> = resolved.split_off(fixed.min(resolved.len()));

        // Assemble the final argument list: fixed positions, then
        // defaults, then the packed tail.
        let mut final_args = resolved;
        for param in concrete.params.iter().take(fixed).skip(args.len()) {
            match &param.default {
                Some(value) => {
                    if param.ty.contains_placeholder() {
                        // A defaulted type parameter that inference never
                        // bound cannot be filled in.
                        return Err(ParseError::new(
                            ParseErrorKind::UnresolvedTypeArgument,
                            span,
                            format!("parameter '{}'", param.name),
                        ));
                    }
                    final_args.push(Expr::Literal {
                        value: value.clone(),
                        ty: param.ty.clone(),
                    });
                }
                None => return Ok(None),
            }
        }
        if tail {
            let elem = match &concrete.params[fixed].ty {
                DataType::Array(elem) => (**elem).clone(),
                _ => return Ok(None),
            };
            if used_variadic || tail_args.is_empty() {
                final_args.push(Expr::NewArray {
                    elem,
                    items: tail_args,
                });
            } else {
                // Direct array pass.
                final_args.extend(tail_args);
            }
        }

        Ok(Some(Candidate {
            declaring: concrete.declaring,
            is_generic: method.is_generic(),
            method: concrete,
            args: final_args,
            matched,
            sources,
            used_variadic,
            fixed,
        }))
    }

    /// Promotion as a filter: a failed conversion disqualifies rather
    /// than reports.
    fn try_promote(&mut self, arg: &Expr, target: &DataType, span: Span) -> Option<Expr> {
        self.promote(arg.clone(), target, false, span).ok()
    }

    /// Reduce applicable candidates to a single winner or an ambiguity
    /// error.
    pub(crate) fn pick_best(
        &self,
        candidates: Vec<Candidate>,
        span: Span,
        what: &str,
    ) -> Result<Candidate, ParseError> {
        self.pick_from(candidates, span, what, false)
    }

    pub(crate) fn pick_best_indexer(
        &self,
        candidates: Vec<Candidate>,
        span: Span,
    ) -> Result<Candidate, ParseError> {
        self.pick_from(candidates, span, "indexer", true)
    }

    fn pick_from(
        &self,
        mut candidates: Vec<Candidate>,
        span: Span,
        what: &str,
        indexer: bool,
    ) -> Result<Candidate, ParseError> {
        let registry = self.ctx.registry();
        let survivors = find_best(registry, &candidates, indexer);
        if survivors.len() == 1 {
            return Ok(candidates.swap_remove(survivors[0]));
        }
        Err(ParseError::new(
            ParseErrorKind::AmbiguousCall,
            span,
            format!("'{what}' has {} equally good overloads", survivors.len()),
        ))
    }
}

/// Indices of candidates not dominated by any other candidate.
pub fn find_best(
    registry: &dynexpr_registry::SymbolRegistry,
    candidates: &[Candidate],
    indexer: bool,
) -> Vec<usize> {
    (0..candidates.len())
        .filter(|&i| {
            !(0..candidates.len()).any(|j| {
                j != i && better(registry, &candidates[j], &candidates[i], indexer)
            })
        })
        .collect()
}

/// Whether `c1` beats `c2`. Argument conversions dominate; the
/// remaining rules only break ties between conversion-equal candidates.
fn better(
    registry: &dynexpr_registry::SymbolRegistry,
    c1: &Candidate,
    c2: &Candidate,
    indexer: bool,
) -> bool {
    let mut wins1 = 0usize;
    let mut wins2 = 0usize;
    for ((source, t1), t2) in c1.sources.iter().zip(&c1.matched).zip(&c2.matched) {
        match compare_conversions(registry, source, t1, t2) {
            Better::T1 => wins1 += 1,
            Better::T2 => wins2 += 1,
            Better::Neutral => {}
        }
    }
    if wins2 > 0 {
        return false;
    }
    if wins1 > 0 {
        return true;
    }

    if c1.is_generic != c2.is_generic {
        return !c1.is_generic;
    }
    if c1.used_variadic != c2.used_variadic {
        return !c1.used_variadic;
    }
    if c1.used_variadic && c1.fixed != c2.fixed {
        return c1.fixed > c2.fixed;
    }
    if indexer && c1.declaring != c2.declaring {
        let d1 = DataType::Simple(c1.declaring);
        let d2 = DataType::Simple(c2.declaring);
        return assignable_from(registry, &d2, &d1);
    }
    false
}
