//! End-to-end coverage: compile against a host environment, then invoke
//! with values.

mod common;

use std::sync::Arc;

use dynexpr::prelude::*;

use common::{build_context, build_registry, point_value};

/// Compile `src` with the standard test context and invoke it with
/// p=(1,2), q=(3,4), n=5, o=null.
fn run(src: &str) -> Value {
    run_with(src, Value::Null)
}

fn run_with(src: &str, o: Value) -> Value {
    let ctx = build_context();
    let expr = compile(src, &ctx, None).unwrap();
    expr.invoke(&[point_value(1, 2), point_value(3, 4), Value::I32(5), o])
        .unwrap()
}

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(run("(n + 2) * 2"), Value::I32(14));
    assert_eq!(run("n + 2 * 2"), Value::I32(9));
    assert_eq!(run("10 % n + 10 / n"), Value::I32(2));
    assert_eq!(run("-n + 1"), Value::I32(-4));
}

#[test]
fn concat_lowers_plus_with_textual_operand() {
    assert_eq!(run("\"foo\" + 1"), Value::Str("foo1".into()));
    assert_eq!(run("1 + \"foo\""), Value::Str("1foo".into()));
    assert_eq!(run("\"a\" + 'b' + \"c\""), Value::Str("abc".into()));
}

#[test]
fn mixed_numeric_operands_widen() {
    assert_eq!(run("n + 1.5"), Value::F64(6.5));
    assert_eq!(run("n * 2.0F"), Value::F32(10.0));
}

#[test]
fn instance_fields_and_methods() {
    assert_eq!(run("p.X + p.Y"), Value::I32(3));
    assert_eq!(run("p.Dot(q)"), Value::I32(11));
    assert_eq!(run("p.Scaled(3).Y"), Value::I32(6));
}

#[test]
fn indexer_dispatch() {
    assert_eq!(run("p[0] * 10 + p[1]"), Value::I32(12));
    assert_eq!(run("q[1]"), Value::I32(4));
}

#[test]
fn constructor_and_chaining() {
    assert_eq!(run("new Point(3, 4).X"), Value::I32(3));
    assert_eq!(run("new Point(2, 3).Dot(new Point(4, 5))"), Value::I32(23));
}

#[test]
fn array_literals_and_length() {
    assert_eq!(run("new int[] { 1, 2, 3 }.Length"), Value::I32(3));
    assert_eq!(run("new int[] { 10, 20 }[1]"), Value::I32(20));
    assert_eq!(run("new int[] { }.Length"), Value::I32(0));
}

#[test]
fn variadic_call_packs_or_passes_through() {
    assert_eq!(run("Util.Sum(1, 2, 3)"), Value::I32(6));
    assert_eq!(run("Util.Sum(new int[] { 1, 2, 3 })"), Value::I32(6));
    assert_eq!(run("Util.Sum()"), Value::I32(0));
}

#[test]
fn overload_prefers_exact_match() {
    assert_eq!(run("Util.Describe(1)"), Value::Str("int".into()));
    assert_eq!(run("Util.Describe((long)1)"), Value::Str("long".into()));
    assert_eq!(run("Util.Pick(1, (long)2)"), Value::I32(1));
    assert_eq!(run("Util.Pick((long)1, 2)"), Value::I32(2));
}

#[test]
fn generic_method_infers_from_arguments() {
    assert_eq!(run("Util.First(new int[] { 7, 8 })"), Value::I32(7));
    assert_eq!(
        run("Util.First(new string[] { \"ab\", \"c\" })"),
        Value::Str("ab".into())
    );
    // The inferred result type carries through member access.
    assert_eq!(
        run("Util.First(new string[] { \"ab\" }).Length"),
        Value::I32(2)
    );
}

#[test]
fn lambda_arguments_realize_against_the_parameter_type() {
    assert_eq!(run("Util.Apply(v => v * 2, 21)"), Value::I32(42));
    assert_eq!(run("Util.Apply((v) => v + 1, 41)"), Value::I32(42));
    // The lambda parameter shadows nothing and sees outer variables.
    assert_eq!(run("Util.Apply(v => v + n, 10)"), Value::I32(15));
}

#[test]
fn lambda_body_may_be_a_conditional() {
    assert_eq!(run("Util.Apply(v => v > 0 ? 1 : 2, 21)"), Value::I32(1));
    assert_eq!(run("Util.Apply(v => v > 0 ? v : -v, -3)"), Value::I32(3));
}

#[test]
fn extension_function_receives_the_target_as_first_argument() {
    let mut ctx = build_context();
    ctx.add_extension_fn(MethodDef::new(
        "Doubled",
        primitives::OBJECT,
        vec![ParamDef::new(
            "value",
            DataType::Simple(primitives::INT32),
        )],
        DataType::Simple(primitives::INT32),
        NativeFn::new(|_: Option<&Value>, args: &[Value]| match &args[0] {
            Value::I32(v) => Ok(Value::I32(v * 2)),
            other => panic!("expected int, got {other:?}"),
        }),
    ));
    let expr = compile("n.Doubled() + 1", &ctx, None).unwrap();
    let out = expr
        .invoke(&[point_value(1, 2), point_value(3, 4), Value::I32(5), Value::Null])
        .unwrap();
    assert_eq!(out, Value::I32(11));
}

#[test]
fn conditional_and_comparisons() {
    assert_eq!(run("n > 3 ? n : 0"), Value::I32(5));
    assert_eq!(run("n < 3 ? n : 0"), Value::I32(0));
    assert_eq!(run("\"abc\" < \"abd\""), Value::Bool(true));
    assert_eq!(run("n >= 5 && n != 0"), Value::Bool(true));
}

#[test]
fn branches_reconcile_toward_the_wider_type() {
    assert_eq!(run("n > 0 ? 1 : 2.5"), Value::F64(1.0));
    assert_eq!(run("n < 0 ? 1 : 2.5"), Value::F64(2.5));
}

#[test]
fn logical_operators_short_circuit() {
    // The right side would divide by zero.
    assert_eq!(run("n == 0 && 1 / (n - n) == 1"), Value::Bool(false));
    assert_eq!(run("n > 0 || 1 / (n - n) == 1"), Value::Bool(true));
}

#[test]
fn type_tests() {
    assert_eq!(run_with("o is string", Value::Str("x".into())), Value::Bool(true));
    assert_eq!(run_with("o is string", point_value(0, 0)), Value::Bool(false));
    assert_eq!(run_with("o is Point", point_value(0, 0)), Value::Bool(true));
    // Null never satisfies a type test.
    assert_eq!(run("o is string"), Value::Bool(false));
}

#[test]
fn as_yields_null_on_mismatch() {
    assert_eq!(
        run_with("o as string", Value::Str("x".into())),
        Value::Str("x".into())
    );
    assert_eq!(run_with("o as string", point_value(0, 0)), Value::Null);
    assert_eq!(
        run_with("(o as string) == null ? \"none\" : \"some\"", point_value(0, 0)),
        Value::Str("none".into())
    );
}

#[test]
fn casts() {
    assert_eq!(run("(long)1"), Value::I64(1));
    assert_eq!(run("(byte)300"), Value::U8(44));
    assert_eq!(run("(int)2.9"), Value::I32(2));
    // A signed operand still reads as a cast.
    assert_eq!(run("(long)+1"), Value::I64(1));
    assert_eq!(run("(long)-n"), Value::I64(-5));
    assert_eq!(
        run_with("((string)o).ToUpper()", Value::Str("hi".into())),
        Value::Str("HI".into())
    );
}

#[test]
fn invalid_runtime_cast_fails() {
    let ctx = build_context();
    let expr = compile("(string)o", &ctx, None).unwrap();
    let err = expr
        .invoke(&[point_value(1, 2), point_value(3, 4), Value::I32(5), point_value(0, 0)])
        .unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidCast { .. }));
}

#[test]
fn null_comparisons() {
    assert_eq!(run("o == null"), Value::Bool(true));
    assert_eq!(run_with("o != null", Value::Str("x".into())), Value::Bool(true));
}

#[test]
fn null_receiver_is_a_runtime_error() {
    let ctx = build_context();
    let expr = compile("((string)o).Length", &ctx, None).unwrap();
    let err = expr
        .invoke(&[point_value(1, 2), point_value(3, 4), Value::I32(5), Value::Null])
        .unwrap_err();
    assert!(matches!(err, RuntimeError::NullReference { .. }));
}

#[test]
fn assignment_returns_the_assigned_value() {
    assert_eq!(run("n = n + 1"), Value::I32(6));
    assert_eq!(run("(n = 2) * n"), Value::I32(4));
}

#[test]
fn string_members() {
    assert_eq!(run("\"hello\".ToUpper()"), Value::Str("HELLO".into()));
    assert_eq!(run("\"HELLO\".ToLower()"), Value::Str("hello".into()));
    assert_eq!(run("\"hello\".Contains(\"ell\")"), Value::Bool(true));
    assert_eq!(run("\"hello\".Substring(1, 3)"), Value::Str("ell".into()));
    assert_eq!(run("\"hello\".Length"), Value::I32(5));
}

#[test]
fn typeof_yields_a_type_value() {
    assert_eq!(
        run("typeof(int)"),
        Value::Type(DataType::Simple(primitives::INT32))
    );
    assert_eq!(
        run("typeof(string[])"),
        Value::Type(DataType::array(DataType::STRING))
    );
}

#[test]
fn case_insensitive_mode_resolves_any_spelling() {
    let mut ctx = ExpressionContext::new(Arc::new(build_registry())).with_settings(
        ContextSettings {
            case_sensitive: false,
            ..ContextSettings::default()
        },
    );
    ctx.add_variable("p", DataType::Simple(common::POINT))
        .unwrap();
    let expr = compile("P.x + util.sum(1, 2)", &ctx, None).unwrap();
    assert_eq!(expr.invoke(&[point_value(7, 0)]).unwrap(), Value::I32(10));
}

#[test]
fn constants_participate_in_expressions() {
    let mut ctx = ExpressionContext::new(Arc::new(build_registry()));
    ctx.add_constant("Answer", Value::I32(42)).unwrap();
    ctx.add_constant("Greeting", Value::Str("hi".into())).unwrap();
    let expr = compile("Answer / 2 + 1", &ctx, None).unwrap();
    assert_eq!(expr.invoke(&[]).unwrap(), Value::I32(22));
    let expr = compile("Greeting + \"!\"", &ctx, None).unwrap();
    assert_eq!(expr.invoke(&[]).unwrap(), Value::Str("hi!".into()));
}

#[test]
fn escaped_identifier_is_a_plain_name() {
    let mut ctx = ExpressionContext::new(Arc::new(build_registry()));
    ctx.add_variable("new", DataType::Simple(primitives::INT32))
        .unwrap();
    let expr = compile("@new * 2", &ctx, None).unwrap();
    assert_eq!(expr.invoke(&[Value::I32(21)]).unwrap(), Value::I32(42));
}

#[test]
fn named_invocation_is_order_independent() {
    let ctx = build_context();
    let expr = compile("p.X - n", &ctx, None).unwrap();
    let out = expr
        .invoke_named(&[
            ("n", Value::I32(3)),
            ("o", Value::Null),
            ("q", point_value(0, 0)),
            ("p", point_value(10, 0)),
        ])
        .unwrap();
    assert_eq!(out, Value::I32(7));
}

#[test]
fn compiled_expressions_are_reusable_and_shareable() {
    let ctx = build_context();
    let expr = compile("p.Dot(q) + n", &ctx, None).unwrap();
    let clone = expr.clone();
    let handle = std::thread::spawn(move || {
        clone
            .invoke(&[point_value(1, 1), point_value(2, 2), Value::I32(1), Value::Null])
            .unwrap()
    });
    let local = expr
        .invoke(&[point_value(1, 1), point_value(2, 2), Value::I32(1), Value::Null])
        .unwrap();
    assert_eq!(local, Value::I32(5));
    assert_eq!(handle.join().unwrap(), local);
}
