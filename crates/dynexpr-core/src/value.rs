//! Runtime values.
//!
//! [`Value`] is the tagged union every compiled expression produces and
//! consumes. Values are cheap to clone (arrays share their storage, host
//! objects and function values are `Arc`-backed) and `Send + Sync`, so a
//! finished expression can be invoked concurrently.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::data_type::{DataType, NumericKind};
use crate::error::RuntimeError;
use crate::type_hash::{TypeHash, primitives};

/// A host object exposed to expressions through the registry.
///
/// Host types implement this to give the engine a runtime type identity
/// and a downcast hook; their members are registered separately as native
/// callables.
pub trait HostObject: Any + Send + Sync {
    /// The hash of this object's registered nominal type.
    fn type_hash(&self) -> TypeHash;

    /// Downcast access for native member implementations.
    fn as_any(&self) -> &dyn Any;
}

/// An array value: element type plus shared storage.
#[derive(Clone)]
pub struct ArrayValue {
    /// Declared element type.
    pub elem: DataType,
    /// The items. Shared so cloning a value never copies the storage.
    pub items: Arc<Vec<Value>>,
}

impl ArrayValue {
    /// Build an array from an element type and items.
    pub fn new(elem: DataType, items: Vec<Value>) -> Self {
        Self {
            elem,
            items: Arc::new(items),
        }
    }
}

/// A realized function value: the runtime form of a lambda or delegate.
#[derive(Clone)]
pub struct FnValue {
    /// The concrete function shape (`DataType::Function`).
    pub signature: DataType,
    callable: Arc<dyn Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync>,
}

impl FnValue {
    /// Wrap a callable with its signature.
    pub fn new<F>(signature: DataType, callable: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self {
            signature,
            callable: Arc::new(callable),
        }
    }

    /// Invoke the function with already-converted argument values.
    pub fn call(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        (self.callable)(args)
    }
}

impl fmt::Debug for FnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValue")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null reference.
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Decimal fixed-point kind. The payload is approximate (see
    /// DESIGN.md); the type-system treatment is exact.
    Decimal(f64),
    Str(String),
    Array(ArrayValue),
    Object(Arc<dyn HostObject>),
    Function(FnValue),
    /// A type reference (result of `typeof`, target of casts).
    Type(DataType),
}

impl fmt::Debug for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl fmt::Debug for dyn HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({})", self.type_hash())
    }
}

impl Value {
    /// The static type of this value, as seen by the type system.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::NULL,
            Value::Bool(_) => DataType::Simple(primitives::BOOL),
            Value::Char(_) => DataType::Simple(primitives::CHAR),
            Value::I8(_) => DataType::Simple(primitives::SBYTE),
            Value::U8(_) => DataType::Simple(primitives::BYTE),
            Value::I16(_) => DataType::Simple(primitives::INT16),
            Value::U16(_) => DataType::Simple(primitives::UINT16),
            Value::I32(_) => DataType::Simple(primitives::INT32),
            Value::U32(_) => DataType::Simple(primitives::UINT32),
            Value::I64(_) => DataType::Simple(primitives::INT64),
            Value::U64(_) => DataType::Simple(primitives::UINT64),
            Value::F32(_) => DataType::Simple(primitives::FLOAT),
            Value::F64(_) => DataType::Simple(primitives::DOUBLE),
            Value::Decimal(_) => DataType::Simple(primitives::DECIMAL),
            Value::Str(_) => DataType::STRING,
            Value::Array(arr) => DataType::array(arr.elem.clone()),
            Value::Object(obj) => DataType::Simple(obj.type_hash()),
            Value::Function(fv) => fv.signature.clone(),
            Value::Type(_) => DataType::Simple(primitives::TYPE),
        }
    }

    /// The numeric kind of this value, if it is numeric.
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        Some(match self {
            Value::I8(_) => NumericKind::I8,
            Value::U8(_) => NumericKind::U8,
            Value::I16(_) => NumericKind::I16,
            Value::U16(_) => NumericKind::U16,
            Value::I32(_) => NumericKind::I32,
            Value::U32(_) => NumericKind::U32,
            Value::I64(_) => NumericKind::I64,
            Value::U64(_) => NumericKind::U64,
            Value::F32(_) => NumericKind::F32,
            Value::F64(_) => NumericKind::F64,
            Value::Decimal(_) => NumericKind::Decimal,
            _ => return None,
        })
    }

    /// Render the value the way string concatenation sees it.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Char(c) => c.to_string(),
            Value::I8(v) => v.to_string(),
            Value::U8(v) => v.to_string(),
            Value::I16(v) => v.to_string(),
            Value::U16(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::U32(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::F32(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::Decimal(v) => v.to_string(),
            Value::Str(s) => s.clone(),
            Value::Array(arr) => format!("[{} items]", arr.items.len()),
            Value::Object(obj) => format!("object({})", obj.type_hash()),
            Value::Function(_) => "function".to_string(),
            Value::Type(dt) => format!("{:?}", dt),
        }
    }

    /// Whether this value is the null reference.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Structural equality, as the `==` operator sees it.
///
/// Host objects and function values compare by identity; everything else
/// compares by content.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.elem == b.elem && *a.items == *b.items
            }
            (Value::Object(a), Value::Object(b)) => {
                Arc::ptr_eq(a, b) || std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(&a.callable, &b.callable),
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}
