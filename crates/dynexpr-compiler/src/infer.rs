//! Generic type inference.
//!
//! Given a generic method's declared parameter types (containing
//! [`DataType::Placeholder`]s) and the actual argument types, [`unify`]
//! accumulates bindings for each placeholder, and [`substitute`] rewrites
//! a declared type into its concrete form. A placeholder already bound
//! may rebind toward a wider compatible type (so `f(1, 2L)` against
//! `f(T, T)` binds `T = long`), but never toward an unrelated one.

use dynexpr_core::DataType;
use dynexpr_registry::SymbolRegistry;

use crate::conversion::is_compatible;

/// Accumulated placeholder bindings, indexed by placeholder position.
pub type Bindings = Vec<Option<DataType>>;

/// Unify a declared parameter type with an argument type, updating
/// `bindings`. Returns false when the shapes cannot match.
///
/// An unbound-lambda argument never binds a bare placeholder: a lambda
/// with unknown parameter types carries no evidence of any concrete
/// type, so it matches structurally (arity only) and leaves the
/// placeholder for other arguments to bind.
pub fn unify(
    registry: &SymbolRegistry,
    declared: &DataType,
    arg: &DataType,
    bindings: &mut Bindings,
) -> bool {
    match (declared, arg) {
        (DataType::Placeholder(idx), _) => {
            if arg.is_bare_placeholder() || matches!(arg, DataType::UnboundLambda { .. }) {
                return true;
            }
            bind(registry, *idx, arg, bindings)
        }
        (DataType::Array(d), DataType::Array(a)) => unify(registry, d, a, bindings),
        (DataType::Nullable(d), DataType::Nullable(a)) => unify(registry, d, a, bindings),
        // A non-null value type also satisfies a nullable declared type.
        (DataType::Nullable(d), a) => unify(registry, d, a, bindings),
        (
            DataType::Function {
                params: dp,
                ret: dr,
            },
            DataType::Function {
                params: ap,
                ret: ar,
            },
        ) => {
            dp.len() == ap.len()
                && dp.iter().zip(ap).all(|(d, a)| unify(registry, d, a, bindings))
                && unify(registry, dr, ar, bindings)
        }
        (DataType::Function { params, .. }, DataType::UnboundLambda { arity }) => {
            // Arity is the only evidence an unbound lambda offers.
            params.len() == *arity as usize
        }
        (DataType::Generic(dh, dargs), _) => {
            let Some(instantiation) = find_instantiation(registry, arg, *dh) else {
                return false;
            };
            let DataType::Generic(_, aargs) = instantiation else {
                return false;
            };
            dargs.len() == aargs.len()
                && dargs
                    .iter()
                    .zip(aargs.iter())
                    .all(|(d, a)| unify(registry, d, a, bindings))
        }
        _ => is_compatible(registry, arg, declared),
    }
}

fn bind(registry: &SymbolRegistry, idx: u8, arg: &DataType, bindings: &mut Bindings) -> bool {
    let slot = idx as usize;
    if slot >= bindings.len() {
        return false;
    }
    match &bindings[slot] {
        None => {
            bindings[slot] = Some(arg.clone());
            true
        }
        Some(existing) if existing == arg => true,
        Some(existing) => {
            // Rebind only toward a wider type the existing binding
            // converts into.
            if is_compatible(registry, existing, arg) {
                bindings[slot] = Some(arg.clone());
                true
            } else {
                is_compatible(registry, arg, existing)
            }
        }
    }
}

/// Find the instantiation of generic type `head` that `arg` provides:
/// either `arg` itself or one of its declared interfaces.
fn find_instantiation(
    registry: &SymbolRegistry,
    arg: &DataType,
    head: dynexpr_core::TypeHash,
) -> Option<DataType> {
    match arg {
        DataType::Generic(h, _) if *h == head => Some(arg.clone()),
        DataType::Simple(h) => {
            let entry = registry.get(*h)?;
            for iface in &entry.interfaces {
                if let DataType::Generic(ih, _) = iface
                    && *ih == head
                {
                    return Some(iface.clone());
                }
                if let Some(found) = find_instantiation(registry, iface, head) {
                    return Some(found);
                }
            }
            entry
                .base
                .and_then(|b| find_instantiation(registry, &DataType::Simple(b), head))
        }
        _ => None,
    }
}

/// Rewrite a declared type with the inferred bindings. `None` when an
/// unbound placeholder remains.
pub fn substitute(ty: &DataType, bindings: &Bindings) -> Option<DataType> {
    Some(match ty {
        DataType::Placeholder(idx) => bindings.get(*idx as usize)?.clone()?,
        DataType::Simple(_) | DataType::UnboundLambda { .. } => ty.clone(),
        DataType::Nullable(inner) => DataType::nullable(substitute(inner, bindings)?),
        DataType::Array(inner) => DataType::array(substitute(inner, bindings)?),
        DataType::Generic(h, args) => DataType::Generic(
            *h,
            args.iter()
                .map(|a| substitute(a, bindings))
                .collect::<Option<Vec<_>>>()?,
        ),
        DataType::Function { params, ret } => DataType::function(
            params
                .iter()
                .map(|p| substitute(p, bindings))
                .collect::<Option<Vec<_>>>()?,
            substitute(ret, bindings)?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynexpr_core::primitives;

    fn int() -> DataType {
        DataType::Simple(primitives::INT32)
    }

    fn long() -> DataType {
        DataType::Simple(primitives::INT64)
    }

    #[test]
    fn placeholder_binds_and_substitutes() {
        let r = SymbolRegistry::with_primitives();
        let mut b = vec![None];
        assert!(unify(&r, &DataType::Placeholder(0), &int(), &mut b));
        assert_eq!(substitute(&DataType::Placeholder(0), &b), Some(int()));
        assert_eq!(
            substitute(&DataType::array(DataType::Placeholder(0)), &b),
            Some(DataType::array(int()))
        );
    }

    #[test]
    fn rebinding_widens_but_never_jumps() {
        let r = SymbolRegistry::with_primitives();
        let mut b = vec![None];
        assert!(unify(&r, &DataType::Placeholder(0), &int(), &mut b));
        assert!(unify(&r, &DataType::Placeholder(0), &long(), &mut b));
        assert_eq!(b[0], Some(long()));

        // A narrower later argument keeps the wider binding.
        assert!(unify(&r, &DataType::Placeholder(0), &int(), &mut b));
        assert_eq!(b[0], Some(long()));

        // An unrelated type fails.
        assert!(!unify(&r, &DataType::Placeholder(0), &DataType::BOOL, &mut b));
    }

    #[test]
    fn array_shape_unifies_elementwise() {
        let r = SymbolRegistry::with_primitives();
        let mut b = vec![None];
        assert!(unify(
            &r,
            &DataType::array(DataType::Placeholder(0)),
            &DataType::array(long()),
            &mut b
        ));
        assert_eq!(b[0], Some(long()));
    }

    #[test]
    fn unbound_lambda_matches_arity_but_binds_nothing() {
        let r = SymbolRegistry::with_primitives();
        let declared = DataType::function(vec![DataType::Placeholder(0)], DataType::Placeholder(1));
        let mut b = vec![None, None];
        assert!(unify(
            &r,
            &declared,
            &DataType::UnboundLambda { arity: 1 },
            &mut b
        ));
        assert_eq!(b, vec![None, None]);
        assert!(!unify(
            &r,
            &declared,
            &DataType::UnboundLambda { arity: 2 },
            &mut b
        ));
    }

    #[test]
    fn unresolved_placeholder_fails_substitution() {
        let b: Bindings = vec![None];
        assert_eq!(substitute(&DataType::Placeholder(0), &b), None);
    }
}
