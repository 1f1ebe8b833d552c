//! Arithmetic and comparison operators

use super::harness::*;
use jovian_engine::compiler::CompileError;

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_add() {
    expect_i32("(+ 2 3)", 5);
}

#[test]
fn test_sub() {
    expect_i32("(- 2 3)", -1);
}

#[test]
fn test_mul() {
    expect_i32("(* 6 7)", 42);
}

#[test]
fn test_signed_div() {
    expect_i32("(/ 10 3)", 3);
    expect_i32("(/ -10 3)", -3);
}

#[test]
fn test_nested() {
    expect_i32("(+ (* 2 3) (- 10 (/ 8 2)))", 12);
}

#[test]
fn test_overflow_wraps() {
    expect_i32("(+ 2147483647 1)", i32::MIN);
}

#[test]
fn test_bool_operand_is_widened() {
    expect_i32("(+ true 1)", 2);
}

#[test]
fn test_string_operand_rejected() {
    let err = expect_compile_error(r#"(+ "a" 1)"#);
    assert!(matches!(err, CompileError::TypeMismatch { .. }));
}

#[test]
fn test_wrong_arity() {
    let err = expect_compile_error("(+ 1 2 3)");
    assert!(matches!(err, CompileError::MalformedExpression { .. }));
}

// ============================================================================
// Comparisons (unsigned)
// ============================================================================

#[test]
fn test_greater() {
    expect_i32("(> 5 3)", 1);
    expect_i32("(> 3 5)", 0);
}

#[test]
fn test_equal_and_not_equal() {
    expect_i32("(== 4 4)", 1);
    expect_i32("(!= 4 4)", 0);
}

#[test]
fn test_greater_equal_and_less_equal() {
    expect_i32("(>= 4 4)", 1);
    expect_i32("(<= 5 4)", 0);
}

#[test]
fn test_negative_compares_as_unsigned() {
    expect_i32("(< -1 1)", 0);
    expect_i32("(> -1 1)", 1);
}
