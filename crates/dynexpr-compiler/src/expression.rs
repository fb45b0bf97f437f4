//! Compilation entry point and the finished expression.
//!
//! [`compile`] runs the parser once and freezes the result into a
//! [`CompiledExpression`]: an immutable, thread-safe artifact that can
//! be invoked any number of times without touching the context again.

use std::fmt;
use std::sync::Arc;

use dynexpr_core::{DataType, ExprError, RuntimeError, Value};
use dynexpr_registry::SymbolRegistry;

use crate::context::{ExpressionContext, Variable};
use crate::conversion::{accepts_null, is_compatible};
use crate::eval::{convert_value, eval};
use crate::expr::Expr;
use crate::parser::Parser;

/// A compiled, reusable expression.
///
/// Holds the typed tree, the parameter list it was compiled against,
/// and the registry it resolves runtime types through. Cloning shares
/// the tree.
#[derive(Clone)]
pub struct CompiledExpression {
    tree: Arc<Expr>,
    params: Arc<Vec<Variable>>,
    slot_count: usize,
    registry: Arc<SymbolRegistry>,
    ty: DataType,
}

impl fmt::Debug for CompiledExpression {
    // The registry is shared state, not part of the expression; leave it
    // out of the dump.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("tree", &self.tree)
            .field("params", &self.params)
            .field("slot_count", &self.slot_count)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

/// Compile `source` against a context. When `expected` is given, the
/// result is promoted to that type as a final step.
pub fn compile(
    source: &str,
    ctx: &ExpressionContext,
    expected: Option<&DataType>,
) -> Result<CompiledExpression, ExprError> {
    let mut parser = Parser::new(source, ctx)?;
    let mut tree = parser.parse_full()?;
    if let Some(target) = expected {
        let span = dynexpr_core::Span::new(0, source.len() as u32);
        tree = parser.promote(tree, target, false, span)?;
    }
    let ty = tree.ty();
    Ok(CompiledExpression {
        tree: Arc::new(tree),
        params: Arc::new(ctx.variables().to_vec()),
        slot_count: parser.slot_count(),
        registry: Arc::clone(ctx.registry()),
        ty,
    })
}

impl CompiledExpression {
    /// The static result type of this expression.
    pub fn result_type(&self) -> &DataType {
        &self.ty
    }

    /// The parameters the expression was compiled against, in slot
    /// order.
    pub fn parameters(&self) -> &[Variable] {
        &self.params
    }

    /// Evaluate with positional arguments, one per declared variable.
    ///
    /// Trailing arguments may be omitted when the corresponding
    /// variables declare defaults. Each argument is checked and
    /// converted to its variable's declared type.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        if args.len() > self.params.len() {
            return Err(RuntimeError::ArgumentCount {
                expected: self.params.len(),
                got: args.len(),
            });
        }
        let mut frame = vec![Value::Null; self.slot_count];
        for (i, param) in self.params.iter().enumerate() {
            let value = match args.get(i) {
                Some(value) => value.clone(),
                None => match &param.default {
                    Some(value) => value.clone(),
                    None => {
                        return Err(RuntimeError::ArgumentCount {
                            expected: self.params.len(),
                            got: args.len(),
                        });
                    }
                },
            };
            frame[param.slot] = self.bind_argument(param, value)?;
        }
        eval(&self.tree, &mut frame, &self.registry)
    }

    /// Evaluate with named arguments in any order.
    pub fn invoke_named(&self, args: &[(&str, Value)]) -> Result<Value, RuntimeError> {
        let mut frame = vec![Value::Null; self.slot_count];
        let mut bound = vec![false; self.params.len()];
        for (name, value) in args {
            let Some((i, param)) = self
                .params
                .iter()
                .enumerate()
                .find(|(_, p)| p.name == *name)
            else {
                return Err(RuntimeError::UnknownParameter {
                    name: (*name).to_string(),
                });
            };
            frame[param.slot] = self.bind_argument(param, value.clone())?;
            bound[i] = true;
        }
        for (i, param) in self.params.iter().enumerate() {
            if bound[i] {
                continue;
            }
            match &param.default {
                Some(value) => frame[param.slot] = self.bind_argument(param, value.clone())?,
                None => {
                    return Err(RuntimeError::ArgumentCount {
                        expected: self.params.len(),
                        got: args.len(),
                    });
                }
            }
        }
        eval(&self.tree, &mut frame, &self.registry)
    }

    /// Check an argument against its variable's declared type and
    /// convert it when a widening applies.
    fn bind_argument(&self, param: &Variable, value: Value) -> Result<Value, RuntimeError> {
        if value.is_null() {
            if accepts_null(&self.registry, &param.ty) {
                return Ok(Value::Null);
            }
            return Err(RuntimeError::ArgumentType {
                name: param.name.clone(),
            });
        }
        let runtime_ty = value.data_type();
        if runtime_ty == param.ty {
            return Ok(value);
        }
        if !is_compatible(&self.registry, &runtime_ty, &param.ty) {
            return Err(RuntimeError::ArgumentType {
                name: param.name.clone(),
            });
        }
        convert_value(value, &param.ty, false, &self.registry)
    }
}
