//! Literals, variables and blocks

use super::harness::*;
use jovian_engine::compiler::CompileError;

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_number() {
    expect_i32("42", 42);
}

#[test]
fn test_negative_number() {
    expect_i32("-7", -7);
}

#[test]
fn test_booleans_widen_to_exit_code() {
    expect_i32("true", 1);
    expect_i32("false", 0);
}

#[test]
fn test_string_result_exits_zero() {
    expect_i32(r#""hello""#, 0);
}

#[test]
fn test_version_global() {
    expect_i32("VERSION", 42);
}

#[test]
fn test_version_is_assignable() {
    expect_i32("(set VERSION 7) VERSION", 7);
}

// ============================================================================
// Variables and blocks
// ============================================================================

#[test]
fn test_var_and_read() {
    expect_i32("(var x 10) x", 10);
}

#[test]
fn test_var_value_is_stored_value() {
    expect_i32("(var x 10)", 10);
}

#[test]
fn test_set_returns_new_value() {
    expect_i32("(var x 1) (set x 5)", 5);
}

#[test]
fn test_begin_uses_last_value() {
    expect_i32("(begin (var x 1) (+ x 1))", 2);
}

#[test]
fn test_empty_begin_is_zero() {
    expect_i32("(begin)", 0);
}

#[test]
fn test_inner_scope_shadows() {
    expect_i32(
        "(var x 10)
         (var y (begin (var x 20) x))
         (+ x y)",
        30,
    );
}

#[test]
fn test_inner_scope_assigns_outer() {
    expect_i32("(var x 10) (begin (set x 11)) x", 11);
}

#[test]
fn test_typed_var() {
    expect_i32("(var (x number) 3) x", 3);
}

#[test]
fn test_unresolved_identifier() {
    let err = expect_compile_error("(+ nope 1)");
    assert!(matches!(err, CompileError::UnresolvedIdentifier { name } if name == "nope"));
}

#[test]
fn test_scope_ends_with_block() {
    let err = expect_compile_error("(begin (var inner 1)) inner");
    assert!(matches!(err, CompileError::UnresolvedIdentifier { .. }));
}
