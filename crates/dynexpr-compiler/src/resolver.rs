//! Member and method lookup.
//!
//! The [`Resolver`] answers "what members named `n` does type `t`
//! have?", walking the declaration hierarchy level by level: a class is
//! searched self first, then up the base chain; an interface is searched
//! self, then its implemented interfaces breadth-first, then the
//! `object` root. Results are cached by (type, name, flags); host types
//! never change after registration, so entries are never invalidated.
//!
//! Callers consume the levels in order. The first level that yields a
//! usable member wins; later levels are shadowed, not merged.

use std::sync::Mutex;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use dynexpr_core::{DataType, FieldDef, MethodDef, TypeHash, TypeKind, primitives};
use dynexpr_registry::SymbolRegistry;

bitflags! {
    /// Member lookup filters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindingFlags: u8 {
        /// Match instance members.
        const INSTANCE = 1 << 0;
        /// Match static members.
        const STATIC = 1 << 1;
        /// Compare names case-insensitively.
        const IGNORE_CASE = 1 << 2;
    }
}

/// Name-matched members declared at one level of the hierarchy walk.
#[derive(Debug, Clone, Default)]
pub struct MemberLevel {
    /// The type declaring this level.
    pub declaring: TypeHash,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
}

impl MemberLevel {
    fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.methods.is_empty()
    }
}

type CacheKey = (TypeHash, String, BindingFlags);

/// Member lookup with a per-context cache.
///
/// The cache is shared mutable state; a plain exclusive lock around
/// read-then-insert keeps concurrent parses over one context correct.
/// Duplicate work on a miss race is harmless.
pub struct Resolver {
    cache: Mutex<FxHashMap<CacheKey, std::sync::Arc<Vec<MemberLevel>>>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// All levels of the hierarchy walk for `name` on `ty`, nearest
    /// declaration first. Empty levels are dropped.
    pub fn member_levels(
        &self,
        registry: &SymbolRegistry,
        ty: TypeHash,
        name: &str,
        flags: BindingFlags,
    ) -> std::sync::Arc<Vec<MemberLevel>> {
        let key = (ty, name.to_string(), flags);
        if let Ok(cache) = self.cache.lock()
            && let Some(hit) = cache.get(&key)
        {
            return std::sync::Arc::clone(hit);
        }

        let levels = std::sync::Arc::new(self.collect_levels(registry, ty, name, flags));
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, std::sync::Arc::clone(&levels));
        }
        levels
    }

    /// Find a field, nearest declaring type first.
    pub fn find_field(
        &self,
        registry: &SymbolRegistry,
        ty: TypeHash,
        name: &str,
        flags: BindingFlags,
    ) -> Option<FieldDef> {
        self.member_levels(registry, ty, name, flags)
            .iter()
            .find_map(|level| level.fields.first().cloned())
    }

    /// The indexer candidates per level of the walk.
    pub fn indexer_levels(&self, registry: &SymbolRegistry, ty: TypeHash) -> Vec<MemberLevel> {
        let mut out = Vec::new();
        for hash in self.walk_order(registry, ty) {
            let Some(entry) = registry.get(hash) else {
                continue;
            };
            if entry.indexers.is_empty() {
                continue;
            }
            out.push(MemberLevel {
                declaring: hash,
                fields: Vec::new(),
                methods: entry.indexers.clone(),
            });
        }
        out
    }

    fn collect_levels(
        &self,
        registry: &SymbolRegistry,
        ty: TypeHash,
        name: &str,
        flags: BindingFlags,
    ) -> Vec<MemberLevel> {
        let mut out = Vec::new();
        for hash in self.walk_order(registry, ty) {
            let Some(entry) = registry.get(hash) else {
                continue;
            };
            let mut level = MemberLevel {
                declaring: hash,
                ..MemberLevel::default()
            };
            for field in &entry.fields {
                if name_matches(&field.name, name, flags) && static_matches(field.is_static, flags)
                {
                    level.fields.push(field.clone());
                }
            }
            for method in &entry.methods {
                if name_matches(&method.name, name, flags)
                    && static_matches(method.is_static, flags)
                {
                    level.methods.push(method.clone());
                }
            }
            if !level.is_empty() {
                out.push(level);
            }
        }
        out
    }

    /// The hierarchy walk order for a type: self, then base chain for
    /// classes, or implemented interfaces breadth-first plus the object
    /// root for interfaces.
    fn walk_order(&self, registry: &SymbolRegistry, ty: TypeHash) -> Vec<TypeHash> {
        let mut order = vec![ty];
        let Some(entry) = registry.get(ty) else {
            return order;
        };

        match entry.kind {
            TypeKind::Interface => {
                let mut queue: Vec<TypeHash> = entry
                    .interfaces
                    .iter()
                    .filter_map(nominal_head)
                    .collect();
                let mut cursor = 0;
                while cursor < queue.len() {
                    let hash = queue[cursor];
                    cursor += 1;
                    if order.contains(&hash) {
                        continue;
                    }
                    order.push(hash);
                    if let Some(iface) = registry.get(hash) {
                        queue.extend(iface.interfaces.iter().filter_map(nominal_head));
                    }
                }
                if !order.contains(&primitives::OBJECT) {
                    order.push(primitives::OBJECT);
                }
            }
            TypeKind::Class | TypeKind::Value => {
                let mut current = entry.base;
                while let Some(base) = current {
                    if order.contains(&base) {
                        break;
                    }
                    order.push(base);
                    current = registry.get(base).and_then(|e| e.base);
                }
            }
        }
        order
    }
}

fn nominal_head(ty: &DataType) -> Option<TypeHash> {
    match ty {
        DataType::Simple(h) | DataType::Generic(h, _) => Some(*h),
        _ => None,
    }
}

fn name_matches(declared: &str, requested: &str, flags: BindingFlags) -> bool {
    if flags.contains(BindingFlags::IGNORE_CASE) {
        declared.eq_ignore_ascii_case(requested)
    } else {
        declared == requested
    }
}

fn static_matches(is_static: bool, flags: BindingFlags) -> bool {
    if is_static {
        flags.contains(BindingFlags::STATIC)
    } else {
        flags.contains(BindingFlags::INSTANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynexpr_core::{NativeFn, ParamDef, TypeEntry, Value};

    fn noop() -> NativeFn {
        NativeFn::from_static(|_| Ok(Value::Null))
    }

    fn registry_with_hierarchy() -> SymbolRegistry {
        let mut registry = SymbolRegistry::with_primitives();

        let mut base = TypeEntry::new("Animal", TypeKind::Class);
        base.base = Some(primitives::OBJECT);
        base.fields.push(FieldDef::readonly(
            "Name",
            base.hash,
            DataType::STRING,
            noop(),
        ));
        base.methods.push(MethodDef::new(
            "Speak",
            base.hash,
            vec![],
            DataType::STRING,
            noop(),
        ));
        let animal = base.hash;
        registry.register(base).unwrap();

        let mut derived = TypeEntry::new("Dog", TypeKind::Class);
        derived.base = Some(animal);
        derived.methods.push(MethodDef::new(
            "Speak",
            derived.hash,
            vec![ParamDef::new("times", DataType::Simple(primitives::INT32))],
            DataType::STRING,
            noop(),
        ));
        registry.register(derived).unwrap();

        registry
    }

    #[test]
    fn field_found_on_base_through_derived() {
        let registry = registry_with_hierarchy();
        let resolver = Resolver::new();
        let dog = TypeHash::from_name("Dog");
        let field = resolver
            .find_field(&registry, dog, "Name", BindingFlags::INSTANCE)
            .unwrap();
        assert_eq!(field.declaring, TypeHash::from_name("Animal"));
    }

    #[test]
    fn levels_keep_derived_before_base() {
        let registry = registry_with_hierarchy();
        let resolver = Resolver::new();
        let dog = TypeHash::from_name("Dog");
        let levels = resolver.member_levels(&registry, dog, "Speak", BindingFlags::INSTANCE);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].declaring, dog);
        assert_eq!(levels[1].declaring, TypeHash::from_name("Animal"));
    }

    #[test]
    fn case_insensitive_flag_changes_matching() {
        let registry = registry_with_hierarchy();
        let resolver = Resolver::new();
        let dog = TypeHash::from_name("Dog");
        assert!(
            resolver
                .find_field(&registry, dog, "name", BindingFlags::INSTANCE)
                .is_none()
        );
        assert!(
            resolver
                .find_field(
                    &registry,
                    dog,
                    "name",
                    BindingFlags::INSTANCE | BindingFlags::IGNORE_CASE
                )
                .is_some()
        );
    }

    #[test]
    fn cache_returns_same_levels() {
        let registry = registry_with_hierarchy();
        let resolver = Resolver::new();
        let dog = TypeHash::from_name("Dog");
        let a = resolver.member_levels(&registry, dog, "Speak", BindingFlags::INSTANCE);
        let b = resolver.member_levels(&registry, dog, "Speak", BindingFlags::INSTANCE);
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn string_members_resolve_through_registry() {
        let registry = SymbolRegistry::with_primitives();
        let resolver = Resolver::new();
        let levels =
            resolver.member_levels(&registry, primitives::STRING, "ToUpper", BindingFlags::INSTANCE);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].methods.len(), 1);
    }
}
