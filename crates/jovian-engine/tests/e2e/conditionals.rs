//! `if`

use super::harness::*;
use jovian_engine::compiler::CompileError;

#[test]
fn test_if_then() {
    expect_i32("(if (> 5 3) 1 2)", 1);
}

#[test]
fn test_if_else() {
    expect_i32("(if (< 5 3) 1 2)", 2);
}

#[test]
fn test_integer_condition() {
    expect_i32("(if 7 1 2)", 1);
    expect_i32("(if 0 1 2)", 2);
}

#[test]
fn test_nested_if() {
    expect_i32(
        "(var x 15)
         (if (> x 10)
             (if (> x 20) 3 2)
             1)",
        2,
    );
}

#[test]
fn test_if_value_feeds_expression() {
    expect_i32("(+ 1 (if (== 1 1) 10 20))", 11);
}

#[test]
fn test_only_taken_branch_runs() {
    expect_output(
        r#"(if (> 2 1) (printf "yes\n") (printf "no\n"))"#,
        "yes\n",
    );
}

#[test]
fn test_branch_assignment() {
    expect_i32("(var x 10) (if (> x 5) (set x 100) (set x 0)) x", 100);
}

#[test]
fn test_branch_types_must_agree() {
    let err = expect_compile_error(r#"(if true 1 "one")"#);
    assert!(matches!(err, CompileError::TypeMismatch { .. }));
}

#[test]
fn test_string_condition_rejected() {
    let err = expect_compile_error(r#"(if "x" 1 2)"#);
    assert!(matches!(err, CompileError::TypeMismatch { .. }));
}
