//! Structured type references.
//!
//! A [`DataType`] is a borrowed view into the host's nominal type system:
//! either a plain nominal type (identified by [`TypeHash`]), or a
//! structural wrapper over one (nullable, array, generic instantiation,
//! function shape). Generic method parameters appear as
//! [`DataType::Placeholder`] until inference binds them.
//!
//! The variant set is closed and the compatibility rules over it are pure
//! functions, so the whole conversion matrix can be expressed as matches
//! over this enum (see `dynexpr-compiler::conversion`).

use crate::type_hash::{TypeHash, primitives};

/// A complete type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A nominal type: primitive, registered class, or interface.
    Simple(TypeHash),
    /// Nullable wrapper over a value type (`int?`).
    Nullable(Box<DataType>),
    /// Array with the given element type.
    Array(Box<DataType>),
    /// Instantiation of a generic nominal type, e.g. `Sequence<int>`.
    Generic(TypeHash, Vec<DataType>),
    /// A function/delegate shape: parameter types and return type.
    Function {
        params: Vec<DataType>,
        ret: Box<DataType>,
    },
    /// An unresolved generic-method type parameter, indexed by position.
    Placeholder(u8),
    /// The transient type of a lambda literal whose parameter types are
    /// not yet known. It never survives into a finished expression tree.
    UnboundLambda { arity: u8 },
}

/// The numeric kind of a primitive type, used by the widening matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Decimal,
}

impl NumericKind {
    /// Whether this kind is a signed integral type.
    pub fn is_signed_integral(self) -> bool {
        matches!(
            self,
            NumericKind::I8 | NumericKind::I16 | NumericKind::I32 | NumericKind::I64
        )
    }

    /// Whether this kind is an unsigned integral type.
    pub fn is_unsigned_integral(self) -> bool {
        matches!(
            self,
            NumericKind::U8 | NumericKind::U16 | NumericKind::U32 | NumericKind::U64
        )
    }

    /// The hash of the nominal type backing this kind.
    pub fn type_hash(self) -> TypeHash {
        match self {
            NumericKind::I8 => primitives::SBYTE,
            NumericKind::U8 => primitives::BYTE,
            NumericKind::I16 => primitives::INT16,
            NumericKind::U16 => primitives::UINT16,
            NumericKind::I32 => primitives::INT32,
            NumericKind::U32 => primitives::UINT32,
            NumericKind::I64 => primitives::INT64,
            NumericKind::U64 => primitives::UINT64,
            NumericKind::F32 => primitives::FLOAT,
            NumericKind::F64 => primitives::DOUBLE,
            NumericKind::Decimal => primitives::DECIMAL,
        }
    }

    /// Map a nominal type hash back to its numeric kind.
    pub fn from_hash(hash: TypeHash) -> Option<NumericKind> {
        Some(match hash {
            h if h == primitives::SBYTE => NumericKind::I8,
            h if h == primitives::BYTE => NumericKind::U8,
            h if h == primitives::INT16 => NumericKind::I16,
            h if h == primitives::UINT16 => NumericKind::U16,
            h if h == primitives::INT32 => NumericKind::I32,
            h if h == primitives::UINT32 => NumericKind::U32,
            h if h == primitives::INT64 => NumericKind::I64,
            h if h == primitives::UINT64 => NumericKind::U64,
            h if h == primitives::FLOAT => NumericKind::F32,
            h if h == primitives::DOUBLE => NumericKind::F64,
            h if h == primitives::DECIMAL => NumericKind::Decimal,
            _ => return None,
        })
    }
}

impl DataType {
    /// The `bool` type.
    pub const BOOL: DataType = DataType::Simple(primitives::BOOL);
    /// The `string` type.
    pub const STRING: DataType = DataType::Simple(primitives::STRING);
    /// The `object` root reference type.
    pub const OBJECT: DataType = DataType::Simple(primitives::OBJECT);
    /// The type of the `null` literal.
    pub const NULL: DataType = DataType::Simple(primitives::NULL);

    /// Shorthand for a simple nominal type.
    #[inline]
    pub fn simple(hash: TypeHash) -> DataType {
        DataType::Simple(hash)
    }

    /// An array of the given element type.
    pub fn array(elem: DataType) -> DataType {
        DataType::Array(Box::new(elem))
    }

    /// A nullable wrapper over the given value type.
    pub fn nullable(inner: DataType) -> DataType {
        DataType::Nullable(Box::new(inner))
    }

    /// A function shape.
    pub fn function(params: Vec<DataType>, ret: DataType) -> DataType {
        DataType::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// The numeric kind of this type after stripping a nullable wrapper,
    /// or `None` if it is not numeric.
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self.non_nullable() {
            DataType::Simple(hash) => NumericKind::from_hash(*hash),
            _ => None,
        }
    }

    /// Strip a nullable wrapper, if any.
    pub fn non_nullable(&self) -> &DataType {
        match self {
            DataType::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Whether this is the type of the `null` literal.
    pub fn is_null_literal(&self) -> bool {
        matches!(self, DataType::Simple(h) if *h == primitives::NULL)
    }

    /// Whether this is the textual lowering domain: `string` or `char`.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            DataType::Simple(h) if *h == primitives::STRING || *h == primitives::CHAR
        )
    }

    /// Whether this type is exactly `string`.
    pub fn is_string(&self) -> bool {
        matches!(self, DataType::Simple(h) if *h == primitives::STRING)
    }

    /// Whether this type is exactly `bool`.
    pub fn is_bool(&self) -> bool {
        matches!(self, DataType::Simple(h) if *h == primitives::BOOL)
    }

    /// Whether any part of this type is an unresolved placeholder.
    pub fn contains_placeholder(&self) -> bool {
        match self {
            DataType::Placeholder(_) => true,
            DataType::Simple(_) | DataType::UnboundLambda { .. } => false,
            DataType::Nullable(inner) | DataType::Array(inner) => inner.contains_placeholder(),
            DataType::Generic(_, args) => args.iter().any(DataType::contains_placeholder),
            DataType::Function { params, ret } => {
                params.iter().any(DataType::contains_placeholder) || ret.contains_placeholder()
            }
        }
    }

    /// Whether this is a bare, unwrapped placeholder.
    pub fn is_bare_placeholder(&self) -> bool {
        matches!(self, DataType::Placeholder(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_kind_through_nullable() {
        let plain = DataType::Simple(primitives::INT32);
        let wrapped = DataType::nullable(plain.clone());
        assert_eq!(plain.numeric_kind(), Some(NumericKind::I32));
        assert_eq!(wrapped.numeric_kind(), Some(NumericKind::I32));
        assert!(DataType::STRING.numeric_kind().is_none());
    }

    #[test]
    fn placeholder_detection_recurses() {
        let nested = DataType::array(DataType::Generic(
            TypeHash::from_name("Sequence"),
            vec![DataType::Placeholder(0)],
        ));
        assert!(nested.contains_placeholder());
        assert!(!nested.is_bare_placeholder());
        assert!(DataType::Placeholder(1).is_bare_placeholder());
    }

    #[test]
    fn textual_domain() {
        assert!(DataType::STRING.is_textual());
        assert!(DataType::Simple(primitives::CHAR).is_textual());
        assert!(!DataType::Simple(primitives::INT32).is_textual());
    }

    #[test]
    fn kind_hash_round_trip() {
        for kind in [
            NumericKind::I8,
            NumericKind::U8,
            NumericKind::I16,
            NumericKind::U16,
            NumericKind::I32,
            NumericKind::U32,
            NumericKind::I64,
            NumericKind::U64,
            NumericKind::F32,
            NumericKind::F64,
            NumericKind::Decimal,
        ] {
            assert_eq!(NumericKind::from_hash(kind.type_hash()), Some(kind));
        }
    }
}
