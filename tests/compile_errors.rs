//! Compile-time error reporting: kinds, messages, and positions.

mod common;

use std::sync::Arc;

use dynexpr::prelude::*;

use common::build_context;

fn compile_err(src: &str) -> ParseError {
    let ctx = build_context();
    match compile(src, &ctx, None) {
        Err(ExprError::Parse(err)) => err,
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn unknown_identifier_names_the_symbol() {
    let err = compile_err("foo()");
    assert_eq!(err.kind, ParseErrorKind::UnknownIdentifier);
    assert!(err.message.contains("foo"));
    assert_eq!(err.span.start, 0);
}

#[test]
fn unknown_member_names_the_member_and_type() {
    let err = compile_err("p.Z");
    assert_eq!(err.kind, ParseErrorKind::UnknownMember);
    assert!(err.message.contains("Z"));
    assert!(err.message.contains("Point"));
}

#[test]
fn assignment_reports_the_operator_position_when_disabled() {
    let registry = Arc::new(common::build_registry());
    let mut ctx = ExpressionContext::new(registry).with_settings(ContextSettings {
        assignment_operators: AssignmentOperators::empty(),
        ..ContextSettings::default()
    });
    ctx.add_variable("x", DataType::Simple(primitives::INT32))
        .unwrap();
    match compile("x = 5", &ctx, None) {
        Err(ExprError::Parse(err)) => {
            assert_eq!(err.kind, ParseErrorKind::AssignmentDisabled);
            assert_eq!(err.span.start, 2);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn assignment_to_a_literal_is_rejected() {
    let err = compile_err("1 = 2");
    assert_eq!(err.kind, ParseErrorKind::NotAssignable);
}

#[test]
fn no_applicable_method_on_argument_mismatch() {
    let err = compile_err("p.Dot(1)");
    assert_eq!(err.kind, ParseErrorKind::NoApplicableMethod);
    assert!(err.message.contains("Dot"));
}

#[test]
fn no_applicable_constructor_on_arity_mismatch() {
    let err = compile_err("new Point(1)");
    assert_eq!(err.kind, ParseErrorKind::NoApplicableConstructor);
    assert!(err.message.contains("Point"));
}

#[test]
fn no_applicable_indexer() {
    let err = compile_err("p[\"x\"]");
    assert_eq!(err.kind, ParseErrorKind::NoApplicableIndexer);
}

#[test]
fn ambiguous_overloads_are_reported() {
    let err = compile_err("Util.Pick(1, 2)");
    assert_eq!(err.kind, ParseErrorKind::AmbiguousCall);
}

#[test]
fn incompatible_conditional_branches() {
    let err = compile_err("n > 1 ? 1 : \"a\"");
    assert_eq!(err.kind, ParseErrorKind::IncompatibleBranches);
}

#[test]
fn conditional_test_must_be_bool() {
    let err = compile_err("1 ? 2 : 3");
    assert_eq!(err.kind, ParseErrorKind::TypeConversion);
}

#[test]
fn arithmetic_on_non_numeric_operands() {
    let err = compile_err("\"a\" - \"b\"");
    assert_eq!(err.kind, ParseErrorKind::TypeConversion);
}

#[test]
fn ulong_cannot_be_negated() {
    let mut ctx = build_context();
    ctx.add_variable("u", DataType::Simple(primitives::UINT64))
        .unwrap();
    match compile("-u", &ctx, None) {
        Err(ExprError::Parse(err)) => {
            assert_eq!(err.kind, ParseErrorKind::TypeConversion);
            assert!(err.message.contains("ulong"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn expected_result_type_must_be_reachable() {
    let ctx = build_context();
    let bool_ty = DataType::BOOL;
    match compile("n + 1", &ctx, Some(&bool_ty)) {
        Err(ExprError::Parse(err)) => {
            assert_eq!(err.kind, ParseErrorKind::TypeConversion);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn as_requires_a_nullable_or_reference_target() {
    let err = compile_err("o as int");
    assert_eq!(err.kind, ParseErrorKind::TypeConversion);
    // A nullable target is fine.
    let ctx = build_context();
    let expr = compile("o as int?", &ctx, None).unwrap();
    assert_eq!(
        *expr.result_type(),
        DataType::nullable(DataType::Simple(primitives::INT32))
    );
}

#[test]
fn reflection_can_be_disabled() {
    let registry = Arc::new(common::build_registry());
    let ctx = ExpressionContext::new(registry).with_settings(ContextSettings {
        allow_reflection: false,
        ..ContextSettings::default()
    });
    match compile("typeof(int)", &ctx, None) {
        Err(ExprError::Parse(err)) => {
            assert_eq!(err.kind, ParseErrorKind::ReflectionNotAllowed);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    // A bare type name yields a type value, which is equally gated.
    match compile("int", &ctx, None) {
        Err(ExprError::Parse(err)) => {
            assert_eq!(err.kind, ParseErrorKind::ReflectionNotAllowed);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    // A type value reaching an ordinary value position is gated even
    // when nested.
    match compile("new object[] { int }", &ctx, None) {
        Err(ExprError::Parse(err)) => {
            assert_eq!(err.kind, ParseErrorKind::ReflectionNotAllowed);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    let open = ExpressionContext::new(Arc::new(common::build_registry()));
    assert!(compile("new object[] { int }", &open, None).is_ok());
    // Static member access only passes through the type name; it stays
    // available.
    assert!(compile("Util.Sum(1, 2)", &ctx, None).is_ok());
}

#[test]
fn duplicate_lambda_parameters_are_rejected() {
    let err = compile_err("Util.Apply((v, v) => 1, 2)");
    assert_eq!(err.kind, ParseErrorKind::DuplicateParameter);
}

#[test]
fn trailing_input_is_rejected() {
    let err = compile_err("n + 1 1");
    assert_eq!(err.kind, ParseErrorKind::ExpectedToken);
    assert_eq!(err.span.start, 6);
}

#[test]
fn unterminated_string_is_a_lex_error() {
    let ctx = build_context();
    match compile("\"abc", &ctx, None) {
        Err(err @ ExprError::Parse(_)) => {
            assert_eq!(err.span().map(|s| s.start), Some(0));
        }
        other => panic!("expected error, got {other:?}"),
    }
}
