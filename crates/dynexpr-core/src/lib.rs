//! Core types shared by every dynexpr crate.
//!
//! This crate is the leaf of the workspace: source positions ([`Span`]),
//! deterministic type identity ([`TypeHash`]), structured type references
//! ([`DataType`]), runtime values ([`Value`]), type-erased host callables
//! ([`NativeFn`]), the host-type descriptor entries the registry stores,
//! and the per-phase error hierarchy.

pub mod data_type;
pub mod entries;
pub mod error;
pub mod native_fn;
pub mod span;
pub mod type_hash;
pub mod value;

pub use data_type::{DataType, NumericKind};
pub use entries::{FieldDef, MethodDef, ParamDef, TypeEntry, TypeKind};
pub use error::{
    ExprError, LexError, ParseError, ParseErrorKind, RegistrationError, RuntimeError,
};
pub use native_fn::{NativeCallable, NativeFn, NativeResult};
pub use span::Span;
pub use type_hash::{TypeHash, primitives};
pub use value::{ArrayValue, FnValue, HostObject, Value};
