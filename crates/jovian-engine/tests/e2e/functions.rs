//! `def` and calls

use super::harness::*;
use jovian_engine::compiler::CompileError;

#[test]
fn test_simple_function() {
    expect_i32("(def square (x) (* x x)) (square 7)", 49);
}

#[test]
fn test_def_with_return_type() {
    expect_i32("(def add (a b) -> number (+ a b)) (add 2 3)", 5);
}

#[test]
fn test_typed_params() {
    expect_i32("(def sub ((a number) (b number)) (- a b)) (sub 10 4)", 6);
}

#[test]
fn test_recursion() {
    expect_i32(
        "(def fact (n)
           (if (== n 0) 1 (* n (fact (- n 1)))))
         (fact 5)",
        120,
    );
}

#[test]
fn test_fibonacci() {
    expect_i32(
        "(def fib (n)
           (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2)))))
         (fib 15)",
        610,
    );
}

#[test]
fn test_params_are_mutable() {
    expect_i32("(def bump (x) (begin (set x (+ x 1)) x)) (bump 1)", 2);
}

#[test]
fn test_function_calls_function() {
    expect_i32(
        "(def double (x) (* x 2))
         (def quad (x) (double (double x)))
         (quad 3)",
        12,
    );
}

#[test]
fn test_function_reads_global() {
    expect_i32("(def version () VERSION) (version)", 42);
}

#[test]
fn test_string_param() {
    expect_output(
        r#"(def greet ((name string)) (printf "hi %s\n" name))
           (greet "bob")"#,
        "hi bob\n",
    );
}

#[test]
fn test_string_function_result_becomes_zero() {
    expect_i32(r#"(def name () "x") (name)"#, 0);
}

#[test]
fn test_local_of_main_not_captured() {
    let err = expect_compile_error("(var x 1) (def f () x) (f)");
    assert!(matches!(err, CompileError::CapturedLocal { name } if name == "x"));
}

#[test]
fn test_wrong_argument_count() {
    let err = expect_compile_error("(def f (a b) a) (f 1)");
    assert!(matches!(err, CompileError::MalformedExpression { .. }));
}

#[test]
fn test_duplicate_function() {
    let err = expect_compile_error("(def f () 1) (def f () 2)");
    assert!(matches!(err, CompileError::DuplicateDefinition { .. }));
}

#[test]
fn test_number_is_not_callable() {
    let err = expect_compile_error("(var x 1) (x 2)");
    assert!(matches!(err, CompileError::TypeMismatch { .. }));
}
