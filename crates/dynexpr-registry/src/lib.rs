//! Host type registry for dynexpr.
//!
//! [`SymbolRegistry`] is the statically-registered type-descriptor table
//! that stands in for a reflection facility: it answers every "what
//! members does this nominal type have" question the resolver asks.
//! [`TypeBuilder`] is the fluent registration API hosts use to describe
//! their types.

mod registry;
mod type_builder;

pub use registry::SymbolRegistry;
pub use type_builder::TypeBuilder;
