//! The typed expression tree.
//!
//! Every node carries the [`DataType`] it resolved to at parse time; no
//! type is ever re-inferred after construction. The variant set is
//! closed, so the evaluator is an exhaustive match with no dynamic
//! dispatch.

use std::sync::Arc;

use dynexpr_core::{DataType, FieldDef, MethodDef, Value, primitives};

/// Unary operators that survive into the tree.
///
/// Unary `+` is an identity on numeric operands and never produces a
/// node; a `-` directly prefixing a numeric literal is folded into the
/// literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Boolean not.
    Not,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    /// String concatenation. `+` lowers to this when either operand is
    /// textual; both operands are rendered, not numerically added.
    Concat,
    Eq,
    Ne,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// Short-circuiting `&&`.
    And,
    /// Short-circuiting `||`.
    Or,
}

impl BinaryOp {
    /// Whether this operator compares and yields `bool`.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }
}

/// What an assignment writes to.
#[derive(Debug, Clone)]
pub enum AssignTarget {
    /// A bound variable's frame slot.
    Slot(usize),
    /// A writable field. `target` is `None` for static fields.
    Field {
        target: Option<Box<Expr>>,
        field: FieldDef,
    },
}

/// A resolved expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A constant value.
    Literal { value: Value, ty: DataType },

    /// A read of a bound variable or lambda parameter.
    Variable { slot: usize, ty: DataType },

    /// Field/property read. `target` is `None` for static fields.
    Field {
        target: Option<Box<Expr>>,
        field: FieldDef,
    },

    /// Resolved method, constructor, or extension-function invocation.
    /// `target` is `None` for static members, constructors, and
    /// extension functions (whose receiver is the first argument).
    Call {
        target: Option<Box<Expr>>,
        method: MethodDef,
        args: Vec<Expr>,
        ty: DataType,
    },

    /// Resolved indexer invocation.
    Index {
        target: Box<Expr>,
        method: MethodDef,
        args: Vec<Expr>,
        ty: DataType,
    },

    /// Direct element access on an array value.
    ArrayIndex {
        target: Box<Expr>,
        index: Box<Expr>,
        ty: DataType,
    },

    /// `Length` on an array value.
    ArrayLength { target: Box<Expr> },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        ty: DataType,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        ty: DataType,
    },

    Conditional {
        test: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        ty: DataType,
    },

    Assign {
        target: AssignTarget,
        value: Box<Expr>,
        ty: DataType,
    },

    /// Implicit or explicit conversion. `checked` conversions verify the
    /// runtime type and fail with an invalid-cast error; unchecked ones
    /// are widenings inserted by promotion.
    Convert {
        operand: Box<Expr>,
        target: DataType,
        checked: bool,
    },

    /// `is` (yields bool) or `as` (yields the target type or null).
    TypeTest {
        operand: Box<Expr>,
        target: DataType,
        as_cast: bool,
        ty: DataType,
    },

    /// Array construction with per-element expressions.
    NewArray { elem: DataType, items: Vec<Expr> },

    /// A realized lambda: evaluates to a function value capturing the
    /// current frame.
    Lambda {
        param_slots: Vec<usize>,
        body: Arc<Expr>,
        ty: DataType,
    },

    /// Invocation of a function-typed value.
    InvokeFn {
        target: Box<Expr>,
        args: Vec<Expr>,
        ty: DataType,
    },

    /// A lambda literal whose parameter types are not yet known.
    ///
    /// Carries everything realization needs: parameter names, the body's
    /// source text, and a snapshot of the enclosing lambda scope.
    /// Realization happens at most once, during overload resolution,
    /// when the target function type becomes concrete; an unbound node
    /// must never reach the evaluator.
    Unbound {
        params: Vec<String>,
        body: String,
        captured_scope: Vec<(String, usize, DataType)>,
        ty: DataType,
    },
}

impl Expr {
    /// The resolved static type of this node.
    pub fn ty(&self) -> DataType {
        match self {
            Expr::Literal { ty, .. }
            | Expr::Variable { ty, .. }
            | Expr::Call { ty, .. }
            | Expr::Index { ty, .. }
            | Expr::ArrayIndex { ty, .. }
            | Expr::Unary { ty, .. }
            | Expr::Binary { ty, .. }
            | Expr::Conditional { ty, .. }
            | Expr::Assign { ty, .. }
            | Expr::TypeTest { ty, .. }
            | Expr::Lambda { ty, .. }
            | Expr::InvokeFn { ty, .. }
            | Expr::Unbound { ty, .. } => ty.clone(),
            Expr::Field { field, .. } => field.ty.clone(),
            Expr::ArrayLength { .. } => DataType::Simple(primitives::INT32),
            Expr::Convert { target, .. } => target.clone(),
            Expr::NewArray { elem, .. } => DataType::array(elem.clone()),
        }
    }

    /// A literal holding a type reference, as produced by a type name in
    /// source text. Used by cast detection and static member access.
    pub fn as_type_literal(&self) -> Option<&DataType> {
        match self {
            Expr::Literal {
                value: Value::Type(dt),
                ..
            } => Some(dt),
            _ => None,
        }
    }

    /// Whether this node is the untyped `null` literal.
    pub fn is_null_literal(&self) -> bool {
        matches!(self, Expr::Literal { ty, .. } if ty.is_null_literal())
    }

    /// Whether this node is an unrealized lambda literal.
    pub fn is_unbound_lambda(&self) -> bool {
        matches!(self, Expr::Unbound { .. })
    }

    /// Build a typed literal from a value.
    pub fn literal(value: Value) -> Expr {
        let ty = value.data_type();
        Expr::Literal { value, ty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_carries_value_type() {
        let lit = Expr::literal(Value::I32(5));
        assert_eq!(lit.ty(), DataType::Simple(primitives::INT32));
        assert!(!lit.is_null_literal());
        assert!(Expr::literal(Value::Null).is_null_literal());
    }

    #[test]
    fn type_literal_detection() {
        let t = Expr::literal(Value::Type(DataType::BOOL));
        assert_eq!(t.as_type_literal(), Some(&DataType::BOOL));
        assert_eq!(t.ty(), DataType::Simple(primitives::TYPE));
        assert!(Expr::literal(Value::I32(1)).as_type_literal().is_none());
    }

    #[test]
    fn convert_reports_target_type() {
        let node = Expr::Convert {
            operand: Box::new(Expr::literal(Value::I32(1))),
            target: DataType::Simple(primitives::INT64),
            checked: false,
        };
        assert_eq!(node.ty(), DataType::Simple(primitives::INT64));
    }
}
