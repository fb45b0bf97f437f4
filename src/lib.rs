//! An embeddable expression engine.
//!
//! Compile a C-like expression against a host-supplied environment of
//! types, variables, and constants, then invoke the result with
//! argument values:
//!
//! ```
//! use std::sync::Arc;
//! use dynexpr::prelude::*;
//!
//! let registry = Arc::new(SymbolRegistry::with_primitives());
//! let mut ctx = ExpressionContext::new(registry);
//! ctx.add_variable("a", DataType::Simple(primitives::INT32)).unwrap();
//! ctx.add_variable("b", DataType::Simple(primitives::INT32)).unwrap();
//!
//! let expr = compile("(a + b) * 2", &ctx, None).unwrap();
//! let out = expr.invoke(&[Value::I32(3), Value::I32(4)]).unwrap();
//! assert_eq!(out, Value::I32(14));
//! ```
//!
//! Compilation is a single pass: the parser resolves names, members,
//! overloads, and implicit conversions while it consumes tokens, so the
//! returned [`CompiledExpression`] is fully typed and immutable. It is
//! `Send + Sync` and can be invoked concurrently.

pub use dynexpr_compiler as compiler;
pub use dynexpr_core as core;
pub use dynexpr_registry as registry;

pub use dynexpr_compiler::{
    AssignmentOperators, CompiledExpression, ContextSettings, ExpressionContext, compile,
};
pub use dynexpr_core::{
    ArrayValue, DataType, ExprError, FnValue, HostObject, NativeFn, RuntimeError, Value,
};
pub use dynexpr_registry::{SymbolRegistry, TypeBuilder};

/// Everything a typical embedding needs.
pub mod prelude {
    pub use dynexpr_compiler::{
        AssignmentOperators, CompiledExpression, ContextSettings, ExpressionContext, Variable,
        compile,
    };
    pub use dynexpr_core::{
        ArrayValue, DataType, ExprError, FieldDef, FnValue, HostObject, MethodDef, NativeFn,
        NativeResult, ParamDef, ParseError, ParseErrorKind, RuntimeError, Span, TypeHash, Value,
        primitives,
    };
    pub use dynexpr_registry::{SymbolRegistry, TypeBuilder};
}
