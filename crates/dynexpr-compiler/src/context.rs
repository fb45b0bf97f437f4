//! The symbol environment an expression is compiled against.
//!
//! An [`ExpressionContext`] holds the variable bindings, named
//! constants, extension functions, and settings visible to one parse.
//! It is built up-front, then read-only while parsing; the member-lookup
//! cache lives in the embedded [`Resolver`], so repeated compiles
//! against the same context reuse lookups.

use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use dynexpr_core::{DataType, MethodDef, RegistrationError, Value};
use dynexpr_registry::SymbolRegistry;

use crate::resolver::Resolver;

bitflags! {
    /// Which assignment operators source text may use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AssignmentOperators: u8 {
        /// Plain `=`.
        const ASSIGN = 1 << 0;
    }
}

/// Parse-time behavior switches.
#[derive(Debug, Clone)]
pub struct ContextSettings {
    /// Whether identifier and member lookup is case sensitive.
    pub case_sensitive: bool,
    /// Enabled assignment operators. Defaults to all.
    pub assignment_operators: AssignmentOperators,
    /// Whether reflective constructs (`typeof`) are permitted.
    pub allow_reflection: bool,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            assignment_operators: AssignmentOperators::all(),
            allow_reflection: true,
        }
    }
}

/// A declared variable binding: name, type, frame slot, and an optional
/// default value used when invocation omits the argument.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub ty: DataType,
    pub slot: usize,
    pub default: Option<Value>,
}

/// Everything a parse can see.
pub struct ExpressionContext {
    registry: Arc<SymbolRegistry>,
    resolver: Resolver,
    variables: Vec<Variable>,
    variables_by_name: FxHashMap<String, usize>,
    variables_by_lower: FxHashMap<String, usize>,
    constants: FxHashMap<String, Value>,
    constants_by_lower: FxHashMap<String, String>,
    extension_fns: Vec<MethodDef>,
    settings: ContextSettings,
}

impl ExpressionContext {
    /// Create an empty context over a registry with default settings.
    pub fn new(registry: Arc<SymbolRegistry>) -> Self {
        Self {
            registry,
            resolver: Resolver::new(),
            variables: Vec::new(),
            variables_by_name: FxHashMap::default(),
            variables_by_lower: FxHashMap::default(),
            constants: FxHashMap::default(),
            constants_by_lower: FxHashMap::default(),
            extension_fns: Vec::new(),
            settings: ContextSettings::default(),
        }
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: ContextSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Declare a variable. Slots are assigned in declaration order and
    /// double as positional argument indices at invocation time.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        ty: DataType,
    ) -> Result<(), RegistrationError> {
        self.insert_variable(name.into(), ty, None)
    }

    /// Declare a variable with a default value, making the argument
    /// optional at invocation time.
    pub fn add_variable_with_default(
        &mut self,
        name: impl Into<String>,
        ty: DataType,
        default: Value,
    ) -> Result<(), RegistrationError> {
        self.insert_variable(name.into(), ty, Some(default))
    }

    fn insert_variable(
        &mut self,
        name: String,
        ty: DataType,
        default: Option<Value>,
    ) -> Result<(), RegistrationError> {
        if self.variables_by_name.contains_key(&name) || self.constants.contains_key(&name) {
            return Err(RegistrationError::DuplicateSymbol { name });
        }
        let slot = self.variables.len();
        self.variables_by_name.insert(name.clone(), slot);
        self.variables_by_lower.insert(name.to_lowercase(), slot);
        self.variables.push(Variable {
            name,
            ty,
            slot,
            default,
        });
        Ok(())
    }

    /// Register a named constant. Constants fold into literal nodes at
    /// parse time and never occupy a frame slot.
    pub fn add_constant(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<(), RegistrationError> {
        let name = name.into();
        if self.constants.contains_key(&name) || self.variables_by_name.contains_key(&name) {
            return Err(RegistrationError::DuplicateSymbol { name });
        }
        self.constants_by_lower
            .insert(name.to_lowercase(), name.clone());
        self.constants.insert(name, value);
        Ok(())
    }

    /// Register an extension function. Its first declared parameter is
    /// the receiver; it is consulted only when instance lookup finds no
    /// applicable member.
    pub fn add_extension_fn(&mut self, method: MethodDef) {
        self.extension_fns.push(method);
    }

    /// The backing registry.
    pub fn registry(&self) -> &Arc<SymbolRegistry> {
        &self.registry
    }

    /// The member-lookup resolver (and its cache).
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The settings in effect.
    pub fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    /// All declared variables, in slot order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Look up a variable by name, honoring case sensitivity.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        let slot = if self.settings.case_sensitive {
            *self.variables_by_name.get(name)?
        } else {
            *self.variables_by_lower.get(&name.to_lowercase())?
        };
        self.variables.get(slot)
    }

    /// Look up a constant by name, honoring case sensitivity.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        if self.settings.case_sensitive {
            self.constants.get(name)
        } else {
            let canonical = self.constants_by_lower.get(&name.to_lowercase())?;
            self.constants.get(canonical)
        }
    }

    /// Extension-function candidates with the given name.
    pub fn extension_candidates(&self, name: &str) -> Vec<&MethodDef> {
        let case_sensitive = self.settings.case_sensitive;
        self.extension_fns
            .iter()
            .filter(|m| {
                if case_sensitive {
                    m.name == name
                } else {
                    m.name.eq_ignore_ascii_case(name)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynexpr_core::primitives;

    fn ctx() -> ExpressionContext {
        ExpressionContext::new(Arc::new(SymbolRegistry::with_primitives()))
    }

    #[test]
    fn variables_get_sequential_slots() {
        let mut ctx = ctx();
        ctx.add_variable("a", DataType::Simple(primitives::INT32))
            .unwrap();
        ctx.add_variable("b", DataType::STRING).unwrap();
        assert_eq!(ctx.variable("a").unwrap().slot, 0);
        assert_eq!(ctx.variable("b").unwrap().slot, 1);
        assert!(ctx.variable("c").is_none());
    }

    #[test]
    fn duplicate_symbol_is_rejected() {
        let mut ctx = ctx();
        ctx.add_variable("x", DataType::BOOL).unwrap();
        assert!(matches!(
            ctx.add_variable("x", DataType::BOOL),
            Err(RegistrationError::DuplicateSymbol { .. })
        ));
        assert!(matches!(
            ctx.add_constant("x", Value::I32(1)),
            Err(RegistrationError::DuplicateSymbol { .. })
        ));
    }

    #[test]
    fn case_insensitive_lookup() {
        let mut ctx = ctx().with_settings(ContextSettings {
            case_sensitive: false,
            ..ContextSettings::default()
        });
        ctx.add_variable("Total", DataType::Simple(primitives::INT32))
            .unwrap();
        ctx.add_constant("Pi", Value::F64(3.14)).unwrap();
        assert!(ctx.variable("total").is_some());
        assert!(ctx.constant("PI").is_some());
    }

    #[test]
    fn case_sensitive_lookup_is_exact() {
        let mut ctx = ctx();
        ctx.add_variable("Total", DataType::Simple(primitives::INT32))
            .unwrap();
        assert!(ctx.variable("total").is_none());
        assert!(ctx.variable("Total").is_some());
    }
}
