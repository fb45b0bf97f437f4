//! Tree-walking evaluation.
//!
//! The evaluator consumes a fully typed tree, so it never re-checks
//! static types: numeric binary operands arrive as the same kind,
//! branches have been reconciled, and arguments have been promoted.
//! What remains at runtime is null checking, bounds checking, checked
//! casts, and arithmetic itself.

use std::sync::Arc;

use dynexpr_core::{ArrayValue, DataType, FnValue, NumericKind, RuntimeError, Value};
use dynexpr_registry::SymbolRegistry;

use crate::conversion::{accepts_null, assignable_from};
use crate::expr::{AssignTarget, BinaryOp, Expr, UnaryOp};

/// Evaluate `expr` against a frame of variable slots.
pub fn eval(
    expr: &Expr,
    frame: &mut Vec<Value>,
    registry: &Arc<SymbolRegistry>,
) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Literal { value, .. } => Ok(value.clone()),

        Expr::Variable { slot, .. } => Ok(frame
            .get(*slot)
            .cloned()
            .unwrap_or(Value::Null)),

        Expr::Field { target, field } => match target {
            Some(target) => {
                let recv = eval(target, frame, registry)?;
                if recv.is_null() {
                    return Err(RuntimeError::NullReference {
                        context: format!("field '{}'", field.name),
                    });
                }
                field.getter.call(Some(&recv), &[])
            }
            None => field.getter.call(None, &[]),
        },

        Expr::Call {
            target,
            method,
            args,
            ..
        } => {
            let recv = match target {
                Some(target) => {
                    let recv = eval(target, frame, registry)?;
                    if recv.is_null() {
                        return Err(RuntimeError::NullReference {
                            context: format!("method '{}'", method.name),
                        });
                    }
                    Some(recv)
                }
                None => None,
            };
            let arg_values = eval_args(args, frame, registry)?;
            method.callable.call(recv.as_ref(), &arg_values)
        }

        Expr::Index {
            target,
            method,
            args,
            ..
        } => {
            let recv = eval(target, frame, registry)?;
            if recv.is_null() {
                return Err(RuntimeError::NullReference {
                    context: "indexer".to_string(),
                });
            }
            let arg_values = eval_args(args, frame, registry)?;
            method.callable.call(Some(&recv), &arg_values)
        }

        Expr::ArrayIndex { target, index, .. } => {
            let arr = eval_array(target, frame, registry)?;
            let index = match eval(index, frame, registry)? {
                Value::I32(i) => i as i64,
                Value::I64(i) => i,
                other => {
                    return Err(RuntimeError::ArgumentType {
                        name: format!("index ({:?})", other.data_type()),
                    });
                }
            };
            let len = arr.items.len();
            if index < 0 || index as usize >= len {
                return Err(RuntimeError::IndexOutOfRange { index, len });
            }
            Ok(arr.items[index as usize].clone())
        }

        Expr::ArrayLength { target } => {
            let arr = eval_array(target, frame, registry)?;
            Ok(Value::I32(arr.items.len() as i32))
        }

        Expr::Unary { op, operand, .. } => {
            let value = eval(operand, frame, registry)?;
            apply_unary(*op, value)
        }

        Expr::Binary {
            op, left, right, ..
        } => match op {
            // Short-circuit before touching the right operand.
            BinaryOp::And => match eval(left, frame, registry)? {
                Value::Bool(false) => Ok(Value::Bool(false)),
                _ => eval(right, frame, registry),
            },
            BinaryOp::Or => match eval(left, frame, registry)? {
                Value::Bool(true) => Ok(Value::Bool(true)),
                _ => eval(right, frame, registry),
            },
            BinaryOp::Concat => {
                let l = eval(left, frame, registry)?;
                let r = eval(right, frame, registry)?;
                let mut s = l.to_display_string();
                s.push_str(&r.to_display_string());
                Ok(Value::Str(s))
            }
            _ => {
                let l = eval(left, frame, registry)?;
                let r = eval(right, frame, registry)?;
                apply_binary(*op, l, r)
            }
        },

        Expr::Conditional {
            test,
            then_branch,
            else_branch,
            ..
        } => match eval(test, frame, registry)? {
            Value::Bool(true) => eval(then_branch, frame, registry),
            _ => eval(else_branch, frame, registry),
        },

        Expr::Assign { target, value, .. } => {
            let value = eval(value, frame, registry)?;
            match target {
                AssignTarget::Slot(slot) => {
                    if *slot >= frame.len() {
                        frame.resize(slot + 1, Value::Null);
                    }
                    frame[*slot] = value.clone();
                }
                AssignTarget::Field { target, field } => {
                    let recv = match target {
                        Some(target) => {
                            let recv = eval(target, frame, registry)?;
                            if recv.is_null() {
                                return Err(RuntimeError::NullReference {
                                    context: format!("field '{}'", field.name),
                                });
                            }
                            Some(recv)
                        }
                        None => None,
                    };
                    let setter = field.setter.as_ref().ok_or_else(|| RuntimeError::Host {
                        message: format!("field '{}' is read-only", field.name),
                    })?;
                    setter.call(recv.as_ref(), std::slice::from_ref(&value))?;
                }
            }
            Ok(value)
        }

        Expr::Convert {
            operand,
            target,
            checked,
        } => {
            let value = eval(operand, frame, registry)?;
            convert_value(value, target, *checked, registry)
        }

        Expr::TypeTest {
            operand,
            target,
            as_cast,
            ..
        } => {
            let value = eval(operand, frame, registry)?;
            let matches =
                !value.is_null() && runtime_assignable(registry, target, &value.data_type());
            if *as_cast {
                Ok(if matches { value } else { Value::Null })
            } else {
                Ok(Value::Bool(matches))
            }
        }

        Expr::NewArray { elem, items } => {
            let values = eval_args(items, frame, registry)?;
            Ok(Value::Array(ArrayValue::new(elem.clone(), values)))
        }

        Expr::Lambda {
            param_slots,
            body,
            ty,
        } => {
            // The closure captures a snapshot of the frame; later writes
            // to outer slots are not observed.
            let captured = frame.clone();
            let body = Arc::clone(body);
            let slots = param_slots.clone();
            let registry = Arc::clone(registry);
            Ok(Value::Function(FnValue::new(ty.clone(), move |args| {
                let mut frame = captured.clone();
                for (slot, arg) in slots.iter().zip(args) {
                    if *slot >= frame.len() {
                        frame.resize(slot + 1, Value::Null);
                    }
                    frame[*slot] = arg.clone();
                }
                eval(&body, &mut frame, &registry)
            })))
        }

        Expr::InvokeFn { target, args, .. } => {
            let callee = eval(target, frame, registry)?;
            let arg_values = eval_args(args, frame, registry)?;
            match callee {
                Value::Function(f) => f.call(&arg_values),
                Value::Null => Err(RuntimeError::NullReference {
                    context: "function invocation".to_string(),
                }),
                other => Err(RuntimeError::ArgumentType {
                    name: format!("callee ({:?})", other.data_type()),
                }),
            }
        }

        Expr::Unbound { .. } => Err(RuntimeError::Host {
            message: "lambda literal was never given a function type".to_string(),
        }),
    }
}

fn eval_args(
    args: &[Expr],
    frame: &mut Vec<Value>,
    registry: &Arc<SymbolRegistry>,
) -> Result<Vec<Value>, RuntimeError> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        out.push(eval(arg, frame, registry)?);
    }
    Ok(out)
}

fn eval_array(
    target: &Expr,
    frame: &mut Vec<Value>,
    registry: &Arc<SymbolRegistry>,
) -> Result<ArrayValue, RuntimeError> {
    match eval(target, frame, registry)? {
        Value::Array(arr) => Ok(arr),
        Value::Null => Err(RuntimeError::NullReference {
            context: "array access".to_string(),
        }),
        other => Err(RuntimeError::ArgumentType {
            name: format!("array ({:?})", other.data_type()),
        }),
    }
}

// ============================================================================
// Operators
// ============================================================================

fn apply_unary(op: UnaryOp, value: Value) -> Result<Value, RuntimeError> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::I8(v)) => Ok(Value::I8(v.wrapping_neg())),
        (UnaryOp::Neg, Value::I16(v)) => Ok(Value::I16(v.wrapping_neg())),
        (UnaryOp::Neg, Value::I32(v)) => Ok(Value::I32(v.wrapping_neg())),
        (UnaryOp::Neg, Value::I64(v)) => Ok(Value::I64(v.wrapping_neg())),
        (UnaryOp::Neg, Value::F32(v)) => Ok(Value::F32(-v)),
        (UnaryOp::Neg, Value::F64(v)) => Ok(Value::F64(-v)),
        (UnaryOp::Neg, Value::Decimal(v)) => Ok(Value::Decimal(-v)),
        (_, other) => Err(RuntimeError::ArgumentType {
            name: format!("operand ({:?})", other.data_type()),
        }),
    }
}

macro_rules! int_arith {
    ($op:expr, $ctor:path, $a:expr, $b:expr) => {
        match $op {
            BinaryOp::Add => Ok($ctor($a.wrapping_add($b))),
            BinaryOp::Sub => Ok($ctor($a.wrapping_sub($b))),
            BinaryOp::Mul => Ok($ctor($a.wrapping_mul($b))),
            BinaryOp::Div => {
                if $b == 0 {
                    Err(RuntimeError::DivideByZero)
                } else {
                    Ok($ctor($a.wrapping_div($b)))
                }
            }
            BinaryOp::Rem => {
                if $b == 0 {
                    Err(RuntimeError::DivideByZero)
                } else {
                    Ok($ctor($a.wrapping_rem($b)))
                }
            }
            op => ordering(op, $a.partial_cmp(&$b)),
        }
    };
}

macro_rules! float_arith {
    ($op:expr, $ctor:path, $a:expr, $b:expr) => {
        match $op {
            BinaryOp::Add => Ok($ctor($a + $b)),
            BinaryOp::Sub => Ok($ctor($a - $b)),
            BinaryOp::Mul => Ok($ctor($a * $b)),
            BinaryOp::Div => Ok($ctor($a / $b)),
            BinaryOp::Rem => Ok($ctor($a % $b)),
            op => ordering(op, $a.partial_cmp(&$b)),
        }
    };
}

fn ordering(op: BinaryOp, cmp: Option<std::cmp::Ordering>) -> Result<Value, RuntimeError> {
    use std::cmp::Ordering;
    // NaN comparisons are false except `!=`.
    let result = match (op, cmp) {
        (BinaryOp::Eq, Some(Ordering::Equal)) => true,
        (BinaryOp::Eq, _) => false,
        (BinaryOp::Ne, Some(Ordering::Equal)) => false,
        (BinaryOp::Ne, _) => true,
        (BinaryOp::Lt, Some(Ordering::Less)) => true,
        (BinaryOp::LtEq, Some(Ordering::Less | Ordering::Equal)) => true,
        (BinaryOp::Gt, Some(Ordering::Greater)) => true,
        (BinaryOp::GtEq, Some(Ordering::Greater | Ordering::Equal)) => true,
        _ => false,
    };
    Ok(Value::Bool(result))
}

fn apply_binary(op: BinaryOp, l: Value, r: Value) -> Result<Value, RuntimeError> {
    match (l, r) {
        (Value::I8(a), Value::I8(b)) => int_arith!(op, Value::I8, a, b),
        (Value::U8(a), Value::U8(b)) => int_arith!(op, Value::U8, a, b),
        (Value::I16(a), Value::I16(b)) => int_arith!(op, Value::I16, a, b),
        (Value::U16(a), Value::U16(b)) => int_arith!(op, Value::U16, a, b),
        (Value::I32(a), Value::I32(b)) => int_arith!(op, Value::I32, a, b),
        (Value::U32(a), Value::U32(b)) => int_arith!(op, Value::U32, a, b),
        (Value::I64(a), Value::I64(b)) => int_arith!(op, Value::I64, a, b),
        (Value::U64(a), Value::U64(b)) => int_arith!(op, Value::U64, a, b),
        (Value::F32(a), Value::F32(b)) => float_arith!(op, Value::F32, a, b),
        (Value::F64(a), Value::F64(b)) => float_arith!(op, Value::F64, a, b),
        (Value::Decimal(a), Value::Decimal(b)) => float_arith!(op, Value::Decimal, a, b),
        // String and char comparisons are ordinal.
        (Value::Str(a), Value::Str(b)) => ordering(op, Some(a.cmp(&b))),
        (Value::Str(a), Value::Char(b)) => ordering(op, Some(a.cmp(&b.to_string()))),
        (Value::Char(a), Value::Str(b)) => ordering(op, Some(a.to_string().cmp(&b))),
        (Value::Char(a), Value::Char(b)) => ordering(op, Some(a.cmp(&b))),
        (l, r) if op.is_comparison() => {
            // Reference and structural equality for everything else.
            let eq = l == r;
            match op {
                BinaryOp::Eq => Ok(Value::Bool(eq)),
                BinaryOp::Ne => Ok(Value::Bool(!eq)),
                _ => Err(RuntimeError::ArgumentType {
                    name: format!("operands ({:?}, {:?})", l.data_type(), r.data_type()),
                }),
            }
        }
        (l, r) => Err(RuntimeError::ArgumentType {
            name: format!("operands ({:?}, {:?})", l.data_type(), r.data_type()),
        }),
    }
}

// ============================================================================
// Conversions and type tests
// ============================================================================

/// Runtime subtype test against a declared target type.
fn runtime_assignable(
    registry: &Arc<SymbolRegistry>,
    target: &DataType,
    runtime_ty: &DataType,
) -> bool {
    let target = target.non_nullable();
    runtime_ty == target || assignable_from(registry, target, runtime_ty)
}

/// Apply a conversion node. Unchecked conversions are numeric widenings
/// and nullable wraps inserted by the parser; checked ones are source
/// casts, which narrow numerics by truncation and verify reference
/// types.
pub fn convert_value(
    value: Value,
    target: &DataType,
    checked: bool,
    registry: &Arc<SymbolRegistry>,
) -> Result<Value, RuntimeError> {
    if value.is_null() {
        if accepts_null(registry, target) {
            return Ok(Value::Null);
        }
        return Err(RuntimeError::InvalidCast {
            from: "null".to_string(),
            to: registry.type_name(target),
        });
    }

    if let Some(kind) = target.numeric_kind() {
        return numeric_cast(value, kind, registry, target);
    }

    if checked && !runtime_assignable(registry, target, &value.data_type()) {
        return Err(RuntimeError::InvalidCast {
            from: registry.type_name(&value.data_type()),
            to: registry.type_name(target),
        });
    }
    Ok(value)
}

fn numeric_cast(
    value: Value,
    kind: NumericKind,
    registry: &Arc<SymbolRegistry>,
    target: &DataType,
) -> Result<Value, RuntimeError> {
    enum Num {
        Int(i128),
        Float(f64),
    }
    let num = match &value {
        Value::I8(v) => Num::Int(*v as i128),
        Value::U8(v) => Num::Int(*v as i128),
        Value::I16(v) => Num::Int(*v as i128),
        Value::U16(v) => Num::Int(*v as i128),
        Value::I32(v) => Num::Int(*v as i128),
        Value::U32(v) => Num::Int(*v as i128),
        Value::I64(v) => Num::Int(*v as i128),
        Value::U64(v) => Num::Int(*v as i128),
        Value::F32(v) => Num::Float(*v as f64),
        Value::F64(v) => Num::Float(*v),
        Value::Decimal(v) => Num::Float(*v),
        Value::Char(c) => Num::Int(*c as u32 as i128),
        _ => {
            return Err(RuntimeError::InvalidCast {
                from: registry.type_name(&value.data_type()),
                to: registry.type_name(target),
            });
        }
    };
    // Integer narrowing truncates; float to integer saturates.
    Ok(match (kind, num) {
        (NumericKind::I8, Num::Int(v)) => Value::I8(v as i8),
        (NumericKind::U8, Num::Int(v)) => Value::U8(v as u8),
        (NumericKind::I16, Num::Int(v)) => Value::I16(v as i16),
        (NumericKind::U16, Num::Int(v)) => Value::U16(v as u16),
        (NumericKind::I32, Num::Int(v)) => Value::I32(v as i32),
        (NumericKind::U32, Num::Int(v)) => Value::U32(v as u32),
        (NumericKind::I64, Num::Int(v)) => Value::I64(v as i64),
        (NumericKind::U64, Num::Int(v)) => Value::U64(v as u64),
        (NumericKind::F32, Num::Int(v)) => Value::F32(v as f32),
        (NumericKind::F64, Num::Int(v)) => Value::F64(v as f64),
        (NumericKind::Decimal, Num::Int(v)) => Value::Decimal(v as f64),
        (NumericKind::I8, Num::Float(v)) => Value::I8(v as i8),
        (NumericKind::U8, Num::Float(v)) => Value::U8(v as u8),
        (NumericKind::I16, Num::Float(v)) => Value::I16(v as i16),
        (NumericKind::U16, Num::Float(v)) => Value::U16(v as u16),
        (NumericKind::I32, Num::Float(v)) => Value::I32(v as i32),
        (NumericKind::U32, Num::Float(v)) => Value::U32(v as u32),
        (NumericKind::I64, Num::Float(v)) => Value::I64(v as i64),
        (NumericKind::U64, Num::Float(v)) => Value::U64(v as u64),
        (NumericKind::F32, Num::Float(v)) => Value::F32(v as f32),
        (NumericKind::F64, Num::Float(v)) => Value::F64(v),
        (NumericKind::Decimal, Num::Float(v)) => Value::Decimal(v),
    })
}
