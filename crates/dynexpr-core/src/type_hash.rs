//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] is a 64-bit hash that uniquely identifies a nominal type.
//! Hashes are computed deterministically from names, so a type's identity
//! is stable across registrations and processes and can be referenced
//! before the type itself has been registered.
//!
//! Computation uses XXHash64 with a domain-mixing constant so that a type
//! named `foo` and some other entity named `foo` can never collide.

use std::fmt;

use xxhash_rust::const_xxh64::xxh64 as const_xxh64;

/// Domain marker mixed into every type hash.
const TYPE_DOMAIN: u64 = 0x2fac10b63a6cc57c;

/// A deterministic 64-bit hash identifying a nominal type.
///
/// The same name always produces the same hash:
///
/// ```
/// use dynexpr_core::TypeHash;
///
/// assert_eq!(TypeHash::from_name("int"), TypeHash::from_name("int"));
/// assert_ne!(TypeHash::from_name("int"), TypeHash::from_name("uint"));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a type name.
    ///
    /// `const fn`, so well-known hashes can live in constants (see
    /// [`primitives`]).
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        TypeHash(TYPE_DOMAIN ^ const_xxh64(name.as_bytes(), 0))
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Well-known hashes for the built-in types.
///
/// All are `TypeHash::from_name` of the canonical type name, evaluated at
/// compile time.
pub mod primitives {
    use super::TypeHash;

    /// `void` (absence of an expected return type).
    pub const VOID: TypeHash = TypeHash::from_name("void");
    /// `bool`.
    pub const BOOL: TypeHash = TypeHash::from_name("bool");
    /// `char` (a single UTF code point).
    pub const CHAR: TypeHash = TypeHash::from_name("char");
    /// `sbyte` (8-bit signed).
    pub const SBYTE: TypeHash = TypeHash::from_name("sbyte");
    /// `byte` (8-bit unsigned).
    pub const BYTE: TypeHash = TypeHash::from_name("byte");
    /// `short` (16-bit signed).
    pub const INT16: TypeHash = TypeHash::from_name("short");
    /// `ushort` (16-bit unsigned).
    pub const UINT16: TypeHash = TypeHash::from_name("ushort");
    /// `int` (32-bit signed).
    pub const INT32: TypeHash = TypeHash::from_name("int");
    /// `uint` (32-bit unsigned).
    pub const UINT32: TypeHash = TypeHash::from_name("uint");
    /// `long` (64-bit signed).
    pub const INT64: TypeHash = TypeHash::from_name("long");
    /// `ulong` (64-bit unsigned).
    pub const UINT64: TypeHash = TypeHash::from_name("ulong");
    /// `float` (single precision).
    pub const FLOAT: TypeHash = TypeHash::from_name("float");
    /// `double` (double precision).
    pub const DOUBLE: TypeHash = TypeHash::from_name("double");
    /// `decimal` (fixed-point).
    pub const DECIMAL: TypeHash = TypeHash::from_name("decimal");
    /// `string`. A registered reference type rather than a true primitive,
    /// but its hash is needed everywhere the textual lowering rules apply.
    pub const STRING: TypeHash = TypeHash::from_name("string");
    /// `object`, the root reference type.
    pub const OBJECT: TypeHash = TypeHash::from_name("object");
    /// The type of the `null` literal before it is promoted to a concrete
    /// nullable/reference type.
    pub const NULL: TypeHash = TypeHash::from_name("<null>");
    /// The type of a type-reference constant (result of `typeof`).
    pub const TYPE: TypeHash = TypeHash::from_name("<type>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_determinism() {
        assert_eq!(TypeHash::from_name("Player"), TypeHash::from_name("Player"));
    }

    #[test]
    fn default_is_empty() {
        assert_eq!(TypeHash::default(), TypeHash::EMPTY);
    }

    #[test]
    fn hash_uniqueness() {
        let names = [
            "bool", "char", "sbyte", "byte", "short", "ushort", "int", "uint", "long", "ulong",
            "float", "double", "decimal", "string", "object",
        ];
        for (i, a) in names.iter().enumerate() {
            for b in names.iter().skip(i + 1) {
                assert_ne!(TypeHash::from_name(a), TypeHash::from_name(b));
            }
        }
    }

    #[test]
    fn primitives_match_from_name() {
        assert_eq!(primitives::INT32, TypeHash::from_name("int"));
        assert_eq!(primitives::STRING, TypeHash::from_name("string"));
        assert_ne!(primitives::NULL, TypeHash::EMPTY);
    }
}
