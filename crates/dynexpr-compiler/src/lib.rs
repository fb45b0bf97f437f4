//! Compilation pipeline: tokenizer, typed recursive-descent parser,
//! member/overload resolution, and the tree-walking evaluator.
//!
//! The parser resolves as it descends: every node of the finished tree
//! carries the type it was resolved to, and member lookup, overload
//! resolution, and implicit conversions all happen while the tokens are
//! consumed. A successful parse yields a [`CompiledExpression`], an
//! immutable artifact that can be invoked concurrently.

pub mod context;
pub mod conversion;
pub mod eval;
pub mod expr;
pub mod expression;
pub mod infer;
pub mod lexer;
pub mod overload;
pub mod parser;
pub mod resolver;

mod lambda;

pub use context::{AssignmentOperators, ContextSettings, ExpressionContext, Variable};
pub use expr::{AssignTarget, BinaryOp, Expr, UnaryOp};
pub use expression::{CompiledExpression, compile};
pub use resolver::{BindingFlags, MemberLevel, Resolver};
