//! SymbolRegistry - the host type-descriptor table.
//!
//! Central storage for all nominal types an expression can see. Provides
//! O(1) lookup by [`TypeHash`] and by name (case sensitive or not).
//!
//! # Thread safety
//!
//! The registry is populated single-threaded during environment setup and
//! is read-only afterwards; compiled expressions hold it behind an `Arc`.
//! The member-lookup *cache* lives in the compiler's resolver, not here,
//! so the table itself never mutates after registration.

use rustc_hash::FxHashMap;

use dynexpr_core::{
    DataType, FieldDef, MethodDef, NativeFn, ParamDef, RegistrationError, RuntimeError, TypeEntry,
    TypeHash, TypeKind, Value, primitives,
};

/// The host reflection substitute: every registered nominal type, keyed
/// by hash and by name.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    types: FxHashMap<TypeHash, TypeEntry>,
    by_name: FxHashMap<String, TypeHash>,
    by_lower: FxHashMap<String, TypeHash>,
}

impl SymbolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with the built-in primitive, `string`, and
    /// `object` types.
    pub fn with_primitives() -> Self {
        let mut registry = Self::new();
        registry.register_primitives();
        registry
    }

    /// Register a type entry. Fails if the name is already taken.
    pub fn register(&mut self, entry: TypeEntry) -> Result<(), RegistrationError> {
        if self.by_name.contains_key(&entry.name) {
            return Err(RegistrationError::DuplicateType {
                name: entry.name.clone(),
            });
        }
        if let Some(base) = entry.base {
            if !self.types.contains_key(&base) {
                return Err(RegistrationError::UnknownBaseType {
                    name: format!("{base}"),
                });
            }
        }
        self.by_name.insert(entry.name.clone(), entry.hash);
        self.by_lower.insert(entry.name.to_lowercase(), entry.hash);
        self.types.insert(entry.hash, entry);
        Ok(())
    }

    /// Look up a type by hash.
    pub fn get(&self, hash: TypeHash) -> Option<&TypeEntry> {
        self.types.get(&hash)
    }

    /// Look up a type by name, optionally ignoring case.
    pub fn get_by_name(&self, name: &str, ignore_case: bool) -> Option<&TypeEntry> {
        let hash = if ignore_case {
            self.by_lower.get(&name.to_lowercase())
        } else {
            self.by_name.get(name)
        }?;
        self.types.get(hash)
    }

    /// Whether a type reference denotes a value type.
    ///
    /// Arrays, function shapes, generic instantiations, and unregistered
    /// nominal types are treated as reference types; a nullable wrapper
    /// is a value type by construction.
    pub fn is_value_type(&self, ty: &DataType) -> bool {
        match ty {
            DataType::Simple(hash) => self
                .get(*hash)
                .map(|entry| entry.is_value_type())
                .unwrap_or(false),
            DataType::Nullable(_) => true,
            _ => false,
        }
    }

    /// Whether a type reference denotes an interface.
    pub fn is_interface(&self, ty: &DataType) -> bool {
        let hash = match ty {
            DataType::Simple(hash) => *hash,
            DataType::Generic(hash, _) => *hash,
            _ => return false,
        };
        self.get(hash)
            .is_some_and(|entry| entry.kind == TypeKind::Interface)
    }

    /// Render a type reference as a readable name for error messages.
    pub fn type_name(&self, ty: &DataType) -> String {
        match ty {
            DataType::Simple(hash) if *hash == primitives::NULL => "null".to_string(),
            DataType::Simple(hash) if *hash == primitives::TYPE => "type".to_string(),
            DataType::Simple(hash) | DataType::Generic(hash, _) if self.get(*hash).is_none() => {
                format!("{hash}")
            }
            DataType::Simple(hash) => self.types[hash].name.clone(),
            DataType::Generic(hash, args) => {
                let args = args
                    .iter()
                    .map(|a| self.type_name(a))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}<{}>", self.types[hash].name, args)
            }
            DataType::Nullable(inner) => format!("{}?", self.type_name(inner)),
            DataType::Array(elem) => format!("{}[]", self.type_name(elem)),
            DataType::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| self.type_name(p))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({}) => {}", params, self.type_name(ret))
            }
            DataType::Placeholder(i) => format!("T{i}"),
            DataType::UnboundLambda { arity } => format!("lambda/{arity}"),
        }
    }

    fn register_primitives(&mut self) {
        for name in [
            "bool", "char", "sbyte", "byte", "short", "ushort", "int", "uint", "long", "ulong",
            "float", "double", "decimal",
        ] {
            // Seeded entries cannot collide; ignore the Result.
            let _ = self.register(TypeEntry::new(name, TypeKind::Value));
        }
        let _ = self.register(TypeEntry::new("object", TypeKind::Class));
        let _ = self.register(string_entry());
    }
}

fn expect_str(recv: Option<&Value>) -> Result<&str, RuntimeError> {
    match recv {
        Some(Value::Str(s)) => Ok(s),
        Some(Value::Null) | None => Err(RuntimeError::NullReference {
            context: "string member access".to_string(),
        }),
        Some(other) => Err(RuntimeError::Host {
            message: format!("string member called on {}", other.to_display_string()),
        }),
    }
}

fn expect_i32(value: &Value) -> Result<i32, RuntimeError> {
    match value {
        Value::I32(v) => Ok(*v),
        other => Err(RuntimeError::Host {
            message: format!("expected int, got {}", other.to_display_string()),
        }),
    }
}

/// The built-in `string` type: a reference type rooted at `object`, with
/// the members the textual lowering rules and the tests lean on.
fn string_entry() -> TypeEntry {
    let int = DataType::Simple(primitives::INT32);
    let mut entry = TypeEntry::new("string", TypeKind::Class);
    entry.base = Some(primitives::OBJECT);

    entry.fields.push(FieldDef::readonly(
        "Length",
        primitives::STRING,
        int.clone(),
        NativeFn::new(|recv: Option<&Value>, _: &[Value]| {
            Ok(Value::I32(expect_str(recv)?.chars().count() as i32))
        }),
    ));

    entry.methods.push(MethodDef::new(
        "ToUpper",
        primitives::STRING,
        vec![],
        DataType::STRING,
        NativeFn::new(|recv: Option<&Value>, _: &[Value]| {
            Ok(Value::Str(expect_str(recv)?.to_uppercase()))
        }),
    ));

    entry.methods.push(MethodDef::new(
        "ToLower",
        primitives::STRING,
        vec![],
        DataType::STRING,
        NativeFn::new(|recv: Option<&Value>, _: &[Value]| {
            Ok(Value::Str(expect_str(recv)?.to_lowercase()))
        }),
    ));

    entry.methods.push(MethodDef::new(
        "Contains",
        primitives::STRING,
        vec![ParamDef::new("value", DataType::STRING)],
        DataType::BOOL,
        NativeFn::new(|recv: Option<&Value>, args: &[Value]| {
            let needle = match &args[0] {
                Value::Str(s) => s.as_str(),
                _ => "",
            };
            Ok(Value::Bool(expect_str(recv)?.contains(needle)))
        }),
    ));

    // Two Substring overloads, matching the usual host surface.
    entry.methods.push(MethodDef::new(
        "Substring",
        primitives::STRING,
        vec![ParamDef::new("start", int.clone())],
        DataType::STRING,
        NativeFn::new(|recv: Option<&Value>, args: &[Value]| {
            let s = expect_str(recv)?;
            let start = expect_i32(&args[0])? as usize;
            Ok(Value::Str(s.chars().skip(start).collect()))
        }),
    ));
    entry.methods.push(MethodDef::new(
        "Substring",
        primitives::STRING,
        vec![
            ParamDef::new("start", int.clone()),
            ParamDef::new("length", int),
        ],
        DataType::STRING,
        NativeFn::new(|recv: Option<&Value>, args: &[Value]| {
            let s = expect_str(recv)?;
            let start = expect_i32(&args[0])? as usize;
            let length = expect_i32(&args[1])? as usize;
            Ok(Value::Str(s.chars().skip(start).take(length).collect()))
        }),
    ));

    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_seeded() {
        let registry = SymbolRegistry::with_primitives();
        assert!(registry.get(primitives::INT32).is_some());
        assert!(registry.get(primitives::STRING).is_some());
        assert!(registry.is_value_type(&DataType::Simple(primitives::INT32)));
        assert!(!registry.is_value_type(&DataType::STRING));
    }

    #[test]
    fn name_lookup_honors_case_flag() {
        let registry = SymbolRegistry::with_primitives();
        assert!(registry.get_by_name("int", false).is_some());
        assert!(registry.get_by_name("INT", false).is_none());
        assert!(registry.get_by_name("INT", true).is_some());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = SymbolRegistry::with_primitives();
        let err = registry.register(TypeEntry::new("int", TypeKind::Value));
        assert!(matches!(
            err,
            Err(RegistrationError::DuplicateType { .. })
        ));
    }

    #[test]
    fn type_names_render_structurally() {
        let registry = SymbolRegistry::with_primitives();
        let ty = DataType::array(DataType::nullable(DataType::Simple(primitives::INT32)));
        assert_eq!(registry.type_name(&ty), "int?[]");

        let f = DataType::function(vec![DataType::Simple(primitives::INT32)], DataType::BOOL);
        assert_eq!(registry.type_name(&f), "(int) => bool");
    }

    #[test]
    fn string_members_execute() {
        let registry = SymbolRegistry::with_primitives();
        let string = registry.get(primitives::STRING).unwrap();
        let recv = Value::Str("hello".into());

        let length = &string.fields[0];
        assert_eq!(length.getter.call(Some(&recv), &[]).unwrap(), Value::I32(5));

        let upper = string.methods.iter().find(|m| m.name == "ToUpper").unwrap();
        assert_eq!(
            upper.callable.call(Some(&recv), &[]).unwrap(),
            Value::Str("HELLO".into())
        );
    }
}
