//! Shared host environment for the integration tests: a `Point` class
//! with fields, methods, an indexer, and a constructor, plus a `Util`
//! type carrying static, variadic, generic, and higher-order methods.
#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;

use dynexpr::prelude::*;

pub const POINT: TypeHash = TypeHash::from_name("Point");

pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl HostObject for Point {
    fn type_hash(&self) -> TypeHash {
        POINT
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn point_value(x: i32, y: i32) -> Value {
    Value::Object(Arc::new(Point { x, y }))
}

fn as_point(value: &Value) -> &Point {
    match value {
        Value::Object(obj) => obj.as_any().downcast_ref::<Point>().unwrap(),
        other => panic!("expected Point, got {other:?}"),
    }
}

fn int() -> DataType {
    DataType::Simple(primitives::INT32)
}

fn long() -> DataType {
    DataType::Simple(primitives::INT64)
}

fn int_arg(value: &Value) -> i32 {
    match value {
        Value::I32(v) => *v,
        other => panic!("expected int, got {other:?}"),
    }
}

pub fn build_registry() -> SymbolRegistry {
    let mut registry = SymbolRegistry::with_primitives();

    TypeBuilder::class("Point")
        .field(
            "X",
            int(),
            NativeFn::new(|recv: Option<&Value>, _: &[Value]| {
                Ok(Value::I32(as_point(recv.unwrap()).x))
            }),
        )
        .field(
            "Y",
            int(),
            NativeFn::new(|recv: Option<&Value>, _: &[Value]| {
                Ok(Value::I32(as_point(recv.unwrap()).y))
            }),
        )
        .method(
            "Dot",
            vec![ParamDef::new("other", DataType::Simple(POINT))],
            int(),
            NativeFn::new(|recv: Option<&Value>, args: &[Value]| {
                let a = as_point(recv.unwrap());
                let b = as_point(&args[0]);
                Ok(Value::I32(a.x * b.x + a.y * b.y))
            }),
        )
        .method(
            "Scaled",
            vec![ParamDef::new("factor", int())],
            DataType::Simple(POINT),
            NativeFn::new(|recv: Option<&Value>, args: &[Value]| {
                let p = as_point(recv.unwrap());
                let f = int_arg(&args[0]);
                Ok(point_value(p.x * f, p.y * f))
            }),
        )
        .indexer(
            vec![ParamDef::new("axis", int())],
            int(),
            NativeFn::new(|recv: Option<&Value>, args: &[Value]| {
                let p = as_point(recv.unwrap());
                match int_arg(&args[0]) {
                    0 => Ok(Value::I32(p.x)),
                    1 => Ok(Value::I32(p.y)),
                    i => Err(RuntimeError::IndexOutOfRange {
                        index: i as i64,
                        len: 2,
                    }),
                }
            }),
        )
        .constructor(
            vec![ParamDef::new("x", int()), ParamDef::new("y", int())],
            NativeFn::new(|_: Option<&Value>, args: &[Value]| {
                Ok(point_value(int_arg(&args[0]), int_arg(&args[1])))
            }),
        )
        .register(&mut registry)
        .unwrap();

    let mut util = TypeBuilder::class("Util")
        .static_method(
            "Sum",
            vec![ParamDef::params_tail("values", DataType::array(int()))],
            int(),
            NativeFn::new(|_: Option<&Value>, args: &[Value]| match &args[0] {
                Value::Array(arr) => {
                    let mut total = 0i32;
                    for item in arr.items.iter() {
                        total += int_arg(item);
                    }
                    Ok(Value::I32(total))
                }
                other => panic!("expected array, got {other:?}"),
            }),
        )
        .static_method(
            "Apply",
            vec![
                ParamDef::new("f", DataType::function(vec![int()], int())),
                ParamDef::new("x", int()),
            ],
            int(),
            NativeFn::new(|_: Option<&Value>, args: &[Value]| match &args[0] {
                Value::Function(f) => f.call(&args[1..2]),
                other => panic!("expected function, got {other:?}"),
            }),
        )
        .static_method(
            "Describe",
            vec![ParamDef::new("value", int())],
            DataType::STRING,
            NativeFn::new(|_: Option<&Value>, _: &[Value]| Ok(Value::Str("int".into()))),
        )
        .static_method(
            "Describe",
            vec![ParamDef::new("value", long())],
            DataType::STRING,
            NativeFn::new(|_: Option<&Value>, _: &[Value]| Ok(Value::Str("long".into()))),
        )
        .static_method(
            "Pick",
            vec![ParamDef::new("a", int()), ParamDef::new("b", long())],
            int(),
            NativeFn::new(|_: Option<&Value>, _: &[Value]| Ok(Value::I32(1))),
        )
        .static_method(
            "Pick",
            vec![ParamDef::new("a", long()), ParamDef::new("b", int())],
            int(),
            NativeFn::new(|_: Option<&Value>, _: &[Value]| Ok(Value::I32(2))),
        )
        .build();
    util.methods.push(
        MethodDef::new(
            "First",
            util.hash,
            vec![ParamDef::new(
                "items",
                DataType::array(DataType::Placeholder(0)),
            )],
            DataType::Placeholder(0),
            NativeFn::new(|_: Option<&Value>, args: &[Value]| match &args[0] {
                Value::Array(arr) => Ok(arr.items.first().cloned().unwrap_or(Value::Null)),
                other => panic!("expected array, got {other:?}"),
            }),
        )
        .generic(1)
        .static_member(),
    );
    registry.register(util).unwrap();

    registry
}

/// A context over [`build_registry`] with `p`, `q` (Point), `n` (int),
/// and `o` (object) variables.
pub fn build_context() -> ExpressionContext {
    let mut ctx = ExpressionContext::new(Arc::new(build_registry()));
    ctx.add_variable("p", DataType::Simple(POINT)).unwrap();
    ctx.add_variable("q", DataType::Simple(POINT)).unwrap();
    ctx.add_variable("n", int()).unwrap();
    ctx.add_variable("o", DataType::OBJECT).unwrap();
    ctx
}
