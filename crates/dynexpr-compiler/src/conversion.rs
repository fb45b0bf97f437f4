//! Static type-compatibility and conversion rules.
//!
//! These are pure functions over [`DataType`]: the widening matrix for
//! numeric kinds, reference-hierarchy assignability, and the conversion
//! comparison used by overload tie-breaking. Promotion (actually
//! inserting conversion nodes) lives on the parser, since realizing a
//! lambda argument requires re-parsing its body.

use dynexpr_core::{DataType, NumericKind, TypeKind, primitives};
use dynexpr_registry::SymbolRegistry;

/// Outcome of comparing two conversion targets from one source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Better {
    T1,
    T2,
    Neutral,
}

/// Whether an implicit conversion from `source` to `target` exists.
///
/// Identity always converts; a reference/interface target accepts any
/// assignable source; otherwise both sides reduce to their non-nullable
/// numeric kind and the widening matrix decides.
pub fn is_compatible(registry: &SymbolRegistry, source: &DataType, target: &DataType) -> bool {
    if source == target {
        return true;
    }
    if source.is_null_literal() {
        return accepts_null(registry, target);
    }
    if is_reference_like(registry, target) && assignable_from(registry, target, source) {
        return true;
    }
    if let DataType::Nullable(inner) = target
        && is_compatible(registry, source, inner)
    {
        return true;
    }
    match (source.numeric_kind(), target.numeric_kind()) {
        (Some(s), Some(t)) => widens(s, t),
        _ => false,
    }
}

/// The numeric widening matrix. Identity is included.
pub fn widens(source: NumericKind, target: NumericKind) -> bool {
    use NumericKind::*;
    if source == target {
        return true;
    }
    match source {
        I8 => matches!(target, I16 | I32 | I64 | F32 | F64 | Decimal),
        U8 => matches!(target, I16 | U16 | I32 | U32 | I64 | U64 | F32 | F64 | Decimal),
        I16 => matches!(target, I32 | I64 | F32 | F64 | Decimal),
        U16 => matches!(target, I32 | U32 | I64 | U64 | F32 | F64 | Decimal),
        I32 => matches!(target, I64 | F32 | F64 | Decimal),
        U32 => matches!(target, I64 | U64 | F32 | F64 | Decimal),
        I64 => matches!(target, F32 | F64 | Decimal),
        U64 => matches!(target, F32 | F64 | Decimal),
        F32 => matches!(target, F64),
        F64 | Decimal => false,
    }
}

/// Whether `target` can hold the `null` literal.
pub fn accepts_null(registry: &SymbolRegistry, target: &DataType) -> bool {
    matches!(target, DataType::Nullable(_)) || is_reference_like(registry, target)
}

/// Whether a type is a reference shape: class, interface, array,
/// function, or generic instantiation. Nullable wrappers are value
/// shapes that merely admit null.
pub fn is_reference_like(registry: &SymbolRegistry, ty: &DataType) -> bool {
    match ty {
        DataType::Simple(hash) => match registry.get(*hash) {
            Some(entry) => entry.kind != TypeKind::Value,
            None => *hash == primitives::NULL,
        },
        DataType::Array(_) | DataType::Function { .. } | DataType::Generic(_, _) => true,
        DataType::Nullable(_) | DataType::Placeholder(_) | DataType::UnboundLambda { .. } => false,
    }
}

/// Reference-hierarchy assignability: can a value of `source`'s type be
/// bound to a slot of type `target` without conversion?
pub fn assignable_from(registry: &SymbolRegistry, target: &DataType, source: &DataType) -> bool {
    if target == source {
        return true;
    }
    // object is the root of everything.
    if matches!(target, DataType::Simple(h) if *h == primitives::OBJECT) {
        return true;
    }
    if source.is_null_literal() {
        return accepts_null(registry, target);
    }
    match source {
        DataType::Simple(hash) => {
            let Some(entry) = registry.get(*hash) else {
                return false;
            };
            if let Some(base) = entry.base
                && assignable_from(registry, target, &DataType::Simple(base))
            {
                return true;
            }
            entry
                .interfaces
                .iter()
                .any(|iface| iface == target || assignable_from(registry, target, iface))
        }
        DataType::Generic(hash, _) => {
            // An instantiation is assignable to its open interface head
            // only through an exact match, which the equality above
            // covered; fall back to the head's declared interfaces.
            let Some(entry) = registry.get(*hash) else {
                return false;
            };
            entry
                .interfaces
                .iter()
                .any(|iface| assignable_from(registry, target, iface))
        }
        _ => false,
    }
}

/// Compare two conversion targets for the same source type: which is
/// the more specific conversion? Used by overload tie-breaking.
///
/// `t1` wins when it is the exact source type, or is assignable from the
/// source while `t2` is not, or is the narrower of two inter-convertible
/// types, or is signed-integral while `t2` is unsigned-integral. All
/// rules apply symmetrically.
pub fn compare_conversions(
    registry: &SymbolRegistry,
    source: &DataType,
    t1: &DataType,
    t2: &DataType,
) -> Better {
    if t1 == t2 {
        return Better::Neutral;
    }

    let exact1 = t1 == source;
    let exact2 = t2 == source;
    if exact1 != exact2 {
        return if exact1 { Better::T1 } else { Better::T2 };
    }

    let assign1 = assignable_from(registry, t1, source);
    let assign2 = assignable_from(registry, t2, source);
    if assign1 != assign2 {
        return if assign1 { Better::T1 } else { Better::T2 };
    }

    let narrow1 = is_compatible(registry, t1, t2);
    let narrow2 = is_compatible(registry, t2, t1);
    if narrow1 != narrow2 {
        return if narrow1 { Better::T1 } else { Better::T2 };
    }

    if let (Some(k1), Some(k2)) = (t1.numeric_kind(), t2.numeric_kind()) {
        let signed1 = k1.is_signed_integral();
        let signed2 = k2.is_signed_integral();
        if signed1 && k2.is_unsigned_integral() {
            return Better::T1;
        }
        if signed2 && k1.is_unsigned_integral() {
            return Better::T2;
        }
    }

    Better::Neutral
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynexpr_core::{TypeEntry, TypeHash};

    fn int() -> DataType {
        DataType::Simple(primitives::INT32)
    }

    fn registry() -> SymbolRegistry {
        SymbolRegistry::with_primitives()
    }

    #[test]
    fn widening_matrix_spot_checks() {
        use NumericKind::*;
        assert!(widens(I8, I32));
        assert!(widens(I8, Decimal));
        assert!(!widens(I8, U8));
        assert!(widens(U8, U16));
        assert!(widens(U8, I16));
        assert!(widens(U16, I32));
        assert!(!widens(U16, I16));
        assert!(widens(I32, F32));
        assert!(!widens(I32, U32));
        assert!(widens(U32, I64));
        assert!(!widens(U32, U16));
        assert!(widens(I64, Decimal));
        assert!(!widens(I64, U64));
        assert!(widens(U64, F64));
        assert!(widens(F32, F64));
        assert!(!widens(F64, F32));
        assert!(!widens(F64, Decimal));
        assert!(!widens(Decimal, F64));
    }

    #[test]
    fn identity_and_nullable_lift() {
        let r = registry();
        assert!(is_compatible(&r, &int(), &int()));
        assert!(is_compatible(&r, &int(), &DataType::nullable(int())));
        assert!(is_compatible(
            &r,
            &int(),
            &DataType::nullable(DataType::Simple(primitives::INT64))
        ));
        // Both sides reduce to their non-nullable kind before the matrix.
        assert!(is_compatible(&r, &DataType::nullable(int()), &int()));
    }

    #[test]
    fn null_goes_to_references_and_nullables() {
        let r = registry();
        assert!(is_compatible(&r, &DataType::NULL, &DataType::STRING));
        assert!(is_compatible(&r, &DataType::NULL, &DataType::nullable(int())));
        assert!(!is_compatible(&r, &DataType::NULL, &int()));
    }

    #[test]
    fn everything_is_object() {
        let r = registry();
        assert!(is_compatible(&r, &int(), &DataType::OBJECT));
        assert!(is_compatible(&r, &DataType::STRING, &DataType::OBJECT));
        assert!(is_compatible(&r, &DataType::array(int()), &DataType::OBJECT));
    }

    #[test]
    fn interface_assignability() {
        let mut r = registry();
        let mut iface = TypeEntry::new("Sequence", TypeKind::Interface);
        iface.generic_params.push("T".into());
        let iface_hash = iface.hash;
        r.register(iface).unwrap();

        let mut list = TypeEntry::new("IntList", TypeKind::Class);
        list.base = Some(primitives::OBJECT);
        list.interfaces
            .push(DataType::Generic(iface_hash, vec![int()]));
        r.register(list).unwrap();

        let source = DataType::Simple(TypeHash::from_name("IntList"));
        let target = DataType::Generic(iface_hash, vec![int()]);
        assert!(assignable_from(&r, &target, &source));
        assert!(is_compatible(&r, &source, &target));
        assert!(!assignable_from(&r, &source, &target));
    }

    #[test]
    fn comparison_prefers_exact_then_narrow_then_signed() {
        let r = registry();
        let long = DataType::Simple(primitives::INT64);
        let ulong = DataType::Simple(primitives::UINT64);
        let double = DataType::Simple(primitives::DOUBLE);

        assert_eq!(compare_conversions(&r, &int(), &int(), &long), Better::T1);
        assert_eq!(compare_conversions(&r, &int(), &long, &int()), Better::T2);
        // int widens to both long and double; long is the narrower target.
        assert_eq!(compare_conversions(&r, &int(), &long, &double), Better::T1);
        // signed beats unsigned at equal distance.
        assert_eq!(compare_conversions(&r, &int(), &long, &ulong), Better::T1);
        assert_eq!(compare_conversions(&r, &int(), &long, &long), Better::Neutral);
    }
}
