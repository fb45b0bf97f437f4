//! Fluent registration API for host types.
//!
//! ```
//! use dynexpr_core::{DataType, NativeFn, ParamDef, Value, primitives};
//! use dynexpr_registry::{SymbolRegistry, TypeBuilder};
//!
//! let mut registry = SymbolRegistry::with_primitives();
//! let int = DataType::Simple(primitives::INT32);
//!
//! TypeBuilder::class("Point")
//!     .field("X", int.clone(), NativeFn::new(|_: Option<&Value>, _: &[Value]| Ok(Value::I32(0))))
//!     .method(
//!         "Scale",
//!         vec![ParamDef::new("factor", int.clone())],
//!         int,
//!         NativeFn::new(|_: Option<&Value>, _: &[Value]| Ok(Value::I32(0))),
//!     )
//!     .register(&mut registry)
//!     .unwrap();
//! ```

use dynexpr_core::{
    DataType, FieldDef, MethodDef, NativeFn, ParamDef, RegistrationError, TypeEntry, TypeKind,
    primitives,
};

use crate::SymbolRegistry;

/// Builds a [`TypeEntry`] incrementally.
pub struct TypeBuilder {
    entry: TypeEntry,
}

impl TypeBuilder {
    /// Start a class type. Classes default to `object` as their base.
    pub fn class(name: &str) -> Self {
        let mut entry = TypeEntry::new(name, TypeKind::Class);
        entry.base = Some(primitives::OBJECT);
        Self { entry }
    }

    /// Start a value type.
    pub fn value_type(name: &str) -> Self {
        Self {
            entry: TypeEntry::new(name, TypeKind::Value),
        }
    }

    /// Start an interface type with the given generic parameter names
    /// (empty for a non-generic interface).
    pub fn interface(name: &str, generic_params: &[&str]) -> Self {
        let mut entry = TypeEntry::new(name, TypeKind::Interface);
        entry.generic_params = generic_params.iter().map(|s| s.to_string()).collect();
        Self { entry }
    }

    /// Set the base class by name hash.
    pub fn base(mut self, base: dynexpr_core::TypeHash) -> Self {
        self.entry.base = Some(base);
        self
    }

    /// Declare an implemented interface (possibly a generic instantiation).
    pub fn implements(mut self, interface: DataType) -> Self {
        self.entry.interfaces.push(interface);
        self
    }

    /// Add a read-only field/property.
    pub fn field(mut self, name: &str, ty: DataType, getter: NativeFn) -> Self {
        self.entry
            .fields
            .push(FieldDef::readonly(name, self.entry.hash, ty, getter));
        self
    }

    /// Add a writable field/property.
    pub fn writable_field(
        mut self,
        name: &str,
        ty: DataType,
        getter: NativeFn,
        setter: NativeFn,
    ) -> Self {
        self.entry.fields.push(
            FieldDef::readonly(name, self.entry.hash, ty, getter).with_setter(setter),
        );
        self
    }

    /// Add an instance method.
    pub fn method(
        mut self,
        name: &str,
        params: Vec<ParamDef>,
        ret: DataType,
        callable: NativeFn,
    ) -> Self {
        self.entry
            .methods
            .push(MethodDef::new(name, self.entry.hash, params, ret, callable));
        self
    }

    /// Add a static method.
    pub fn static_method(
        mut self,
        name: &str,
        params: Vec<ParamDef>,
        ret: DataType,
        callable: NativeFn,
    ) -> Self {
        self.entry.methods.push(
            MethodDef::new(name, self.entry.hash, params, ret, callable).static_member(),
        );
        self
    }

    /// Add a generic instance method with `type_params` type parameters;
    /// parameter and return types reference them as
    /// [`DataType::Placeholder`].
    pub fn generic_method(
        mut self,
        name: &str,
        type_params: u8,
        params: Vec<ParamDef>,
        ret: DataType,
        callable: NativeFn,
    ) -> Self {
        self.entry.methods.push(
            MethodDef::new(name, self.entry.hash, params, ret, callable).generic(type_params),
        );
        self
    }

    /// Add a default indexer.
    pub fn indexer(mut self, params: Vec<ParamDef>, ret: DataType, callable: NativeFn) -> Self {
        self.entry
            .indexers
            .push(MethodDef::new("this[]", self.entry.hash, params, ret, callable));
        self
    }

    /// Add a constructor. The return type is the type under construction.
    pub fn constructor(mut self, params: Vec<ParamDef>, callable: NativeFn) -> Self {
        let ret = DataType::Simple(self.entry.hash);
        self.entry
            .constructors
            .push(MethodDef::new(".ctor", self.entry.hash, params, ret, callable).static_member());
        self
    }

    /// Finish and hand back the entry without registering it.
    pub fn build(self) -> TypeEntry {
        self.entry
    }

    /// Finish and register the entry.
    pub fn register(self, registry: &mut SymbolRegistry) -> Result<(), RegistrationError> {
        registry.register(self.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynexpr_core::Value;

    #[test]
    fn builder_assembles_an_entry() {
        let entry = TypeBuilder::class("Player")
            .field(
                "Name",
                DataType::STRING,
                NativeFn::new(|_: Option<&Value>, _: &[Value]| Ok(Value::Str("p".into()))),
            )
            .method(
                "Greet",
                vec![],
                DataType::STRING,
                NativeFn::new(|_: Option<&Value>, _: &[Value]| Ok(Value::Str("hi".into()))),
            )
            .constructor(vec![], NativeFn::new(|_: Option<&Value>, _: &[Value]| Ok(Value::Null)))
            .build();

        assert_eq!(entry.kind, TypeKind::Class);
        assert_eq!(entry.base, Some(primitives::OBJECT));
        assert_eq!(entry.fields.len(), 1);
        assert_eq!(entry.methods.len(), 1);
        assert_eq!(entry.constructors.len(), 1);
        assert!(entry.constructors[0].is_static);
    }

    #[test]
    fn interface_carries_generic_params() {
        let entry = TypeBuilder::interface("Sequence", &["T"]).build();
        assert_eq!(entry.kind, TypeKind::Interface);
        assert_eq!(entry.generic_params, vec!["T".to_string()]);
    }
}
