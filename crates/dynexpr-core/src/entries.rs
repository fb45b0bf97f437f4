//! Host-type descriptor entries.
//!
//! These are the rows of the registry's statically-registered
//! type-descriptor table: the stand-in for a reflection facility over a
//! closed, ahead-of-time-known type set. The member/method resolver only
//! ever queries these descriptors; it never sees host types directly.

use crate::data_type::DataType;
use crate::native_fn::NativeFn;
use crate::type_hash::TypeHash;
use crate::value::Value;

/// What kind of nominal type an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A value type (primitives, char, bool, host value types).
    Value,
    /// A reference type with an optional base class.
    Class,
    /// An interface type.
    Interface,
}

/// A declared parameter of a method, constructor, or indexer.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    /// Declared type; may contain [`DataType::Placeholder`] for generic
    /// methods.
    pub ty: DataType,
    /// Default value, making the parameter optional at call sites.
    pub default: Option<Value>,
    /// Variadic tail: the declared type is an array whose element type
    /// each trailing argument is matched against.
    pub is_params: bool,
    /// Out parameter. Expressions have no out-argument support, so any
    /// candidate binding an argument to one is inapplicable.
    pub is_out: bool,
}

impl ParamDef {
    /// A plain required parameter.
    pub fn new(name: impl Into<String>, ty: DataType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            is_params: false,
            is_out: false,
        }
    }

    /// A parameter with a default value.
    pub fn with_default(name: impl Into<String>, ty: DataType, default: Value) -> Self {
        Self {
            default: Some(default),
            ..Self::new(name, ty)
        }
    }

    /// A variadic tail parameter. `ty` must be the array type.
    pub fn params_tail(name: impl Into<String>, ty: DataType) -> Self {
        Self {
            is_params: true,
            ..Self::new(name, ty)
        }
    }
}

/// A callable member: method, constructor, indexer, or extension function.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    /// The type that declares this member. [`TypeHash::EMPTY`] for free
    /// extension functions.
    pub declaring: TypeHash,
    pub params: Vec<ParamDef>,
    pub ret: DataType,
    pub is_static: bool,
    /// Number of generic type parameters (0 for non-generic members).
    pub type_params: u8,
    pub callable: NativeFn,
}

impl MethodDef {
    /// Create a non-generic instance method.
    pub fn new(
        name: impl Into<String>,
        declaring: TypeHash,
        params: Vec<ParamDef>,
        ret: DataType,
        callable: NativeFn,
    ) -> Self {
        Self {
            name: name.into(),
            declaring,
            params,
            ret,
            is_static: false,
            type_params: 0,
            callable,
        }
    }

    /// Mark this member static.
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Declare generic type parameters.
    pub fn generic(mut self, type_params: u8) -> Self {
        self.type_params = type_params;
        self
    }

    /// Whether the member is a generic method definition.
    pub fn is_generic(&self) -> bool {
        self.type_params > 0
    }

    /// Whether the last declared parameter is a variadic tail.
    pub fn has_params_tail(&self) -> bool {
        self.params.last().is_some_and(|p| p.is_params)
    }

    /// Number of parameters that must be bound by arguments: neither
    /// defaulted nor the variadic tail.
    pub fn required_param_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.default.is_none() && !p.is_params)
            .count()
    }

    /// Number of declared fixed (non-variadic) parameters.
    pub fn fixed_param_count(&self) -> usize {
        self.params.iter().filter(|p| !p.is_params).count()
    }
}

/// A field or property: a readable, optionally writable, named slot.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub declaring: TypeHash,
    pub ty: DataType,
    pub is_static: bool,
    pub getter: NativeFn,
    pub setter: Option<NativeFn>,
}

impl FieldDef {
    /// A read-only instance field.
    pub fn readonly(
        name: impl Into<String>,
        declaring: TypeHash,
        ty: DataType,
        getter: NativeFn,
    ) -> Self {
        Self {
            name: name.into(),
            declaring,
            ty,
            is_static: false,
            getter,
            setter: None,
        }
    }

    /// Attach a setter, making the field a writable assignment target.
    pub fn with_setter(mut self, setter: NativeFn) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Mark this field static.
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A registered nominal type: one row of the descriptor table.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub name: String,
    pub hash: TypeHash,
    pub kind: TypeKind,
    /// Base class, for class types.
    pub base: Option<TypeHash>,
    /// Implemented interfaces; generic instantiations allowed.
    pub interfaces: Vec<DataType>,
    /// Names of generic type parameters, for open generic interfaces.
    pub generic_params: Vec<String>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
    /// Default indexers (parameterized `this[...]` accessors).
    pub indexers: Vec<MethodDef>,
    pub constructors: Vec<MethodDef>,
}

impl TypeEntry {
    /// A bare entry with no members.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        let name = name.into();
        let hash = TypeHash::from_name(&name);
        Self {
            name,
            hash,
            kind,
            base: None,
            interfaces: Vec::new(),
            generic_params: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            indexers: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Whether this entry describes a value type.
    pub fn is_value_type(&self) -> bool {
        self.kind == TypeKind::Value
    }
}
