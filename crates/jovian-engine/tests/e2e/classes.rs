//! Classes, instances and fields

use super::harness::*;
use jovian_engine::compiler::CompileError;

fn with_point(body: &str) -> String {
    format!("{}\n{}", POINT, body)
}

// ============================================================================
// Construction and fields
// ============================================================================

#[test]
fn test_class_declaration_value_is_zero() {
    expect_i32("(class Empty null (begin))", 0);
}

#[test]
fn test_new_without_constructor() {
    expect_i32(
        "(class Empty null (begin (var x 0)))
         (var e (new Empty))
         7",
        7,
    );
}

#[test]
fn test_constructor_sets_fields() {
    expect_i32(&with_point("(var p (new Point 10 20)) (prop p x)"), 10);
    expect_i32(&with_point("(var p (new Point 10 20)) (prop p y)"), 20);
}

#[test]
fn test_set_field() {
    expect_i32(
        &with_point("(var p (new Point 1 2)) (set (prop p x) 40) (+ (prop p x) (prop p y))"),
        42,
    );
}

#[test]
fn test_instances_are_independent() {
    expect_i32(
        &with_point(
            "(var a (new Point 1 2))
             (var b (new Point 30 40))
             (set (prop a x) 5)
             (+ (prop a x) (prop b x))",
        ),
        35,
    );
}

#[test]
fn test_heap_layout() {
    run_and_inspect(&with_point("(var p (new Point 3 4)) 0"), |_, vm| {
        let blocks: Vec<_> = vm.memory().heap_blocks().collect();
        assert_eq!(blocks.len(), 1);
        let (_, bytes) = blocks[0];
        // { vtable*, x, y }
        assert_eq!(bytes.len(), 16);
        let vtable = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
        assert_eq!(Some(vtable), vm.global_address("Point_vTable"));
        assert_eq!(i32::from_le_bytes(bytes[8..12].try_into().unwrap()), 3);
        assert_eq!(i32::from_le_bytes(bytes[12..16].try_into().unwrap()), 4);
    });
}

#[test]
fn test_instance_as_parameter() {
    expect_i32(
        &with_point(
            "(def sum ((p Point)) (+ (prop p x) (prop p y)))
             (sum (new Point 5 6))",
        ),
        11,
    );
}

#[test]
fn test_method_updates_field() {
    expect_i32(
        "(class Counter null
           (begin
             (var count 0)
             (def constructor (self) (set (prop self count) 0))
             (def inc (self) (set (prop self count) (+ (prop self count) 1)))))
         (var c (new Counter))
         ((method c inc) c)
         ((method c inc) c)
         ((method c inc) c)
         (prop c count)",
        3,
    );
}

#[test]
fn test_class_body_var_is_not_a_local() {
    let err = expect_compile_error(&with_point("x"));
    assert!(matches!(err, CompileError::UnresolvedIdentifier { .. }));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unknown_class() {
    let err = expect_compile_error("(var p (new Ghost))");
    assert!(matches!(err, CompileError::UnknownClass { name } if name == "Ghost"));
}

#[test]
fn test_unknown_parent() {
    let err = expect_compile_error("(class Child Ghost (begin))");
    assert!(matches!(err, CompileError::UnknownClass { .. }));
}

#[test]
fn test_unknown_field() {
    let err = expect_compile_error(&with_point("(var p (new Point 1 2)) (prop p z)"));
    assert!(matches!(err, CompileError::UnknownMember { member, .. } if member == "z"));
}

#[test]
fn test_constructor_arguments_without_constructor() {
    let err = expect_compile_error("(class Empty null (begin)) (new Empty 1)");
    assert!(matches!(err, CompileError::UnknownMember { .. }));
}

#[test]
fn test_duplicate_class() {
    let err = expect_compile_error("(class A null (begin)) (class A null (begin))");
    assert!(matches!(err, CompileError::DuplicateDefinition { .. }));
}

#[test]
fn test_duplicate_method() {
    let err = expect_compile_error(
        "(class A null (begin (def f (self) 1) (def f (self) 2)))",
    );
    assert!(matches!(err, CompileError::DuplicateDefinition { .. }));
}

#[test]
fn test_prop_on_number() {
    let err = expect_compile_error("(var n 1) (prop n x)");
    assert!(matches!(err, CompileError::TypeMismatch { .. }));
}

#[test]
fn test_class_body_must_be_block() {
    let err = expect_compile_error("(class A null 1)");
    assert!(matches!(err, CompileError::MalformedExpression { .. }));
}

// ============================================================================
// Instance bindings
// ============================================================================

#[test]
fn test_instance_of_main_not_captured() {
    let err = expect_compile_error(&with_point(
        "(var p (new Point 3 4)) (def getx () (prop p x)) (getx)",
    ));
    assert!(matches!(err, CompileError::CapturedLocal { name } if name == "p"));
}

#[test]
fn test_instance_bound_in_branch_not_visible_after_merge() {
    let err = expect_compile_error(&with_point(
        "(if false (var p (new Point 3 4)) (new Point 1 2)) (prop p x)",
    ));
    assert!(matches!(err, CompileError::ConditionalBinding { name } if name == "p"));
}

#[test]
fn test_instance_bound_in_loop_body_not_visible_after_loop() {
    let err = expect_compile_error(&with_point(
        "(while false (var p (new Point 3 4))) (prop p y)",
    ));
    assert!(matches!(err, CompileError::ConditionalBinding { .. }));
}

#[test]
fn test_instance_used_inside_its_branch() {
    expect_i32(
        &with_point("(if true (begin (var p (new Point 3 4)) (prop p y)) 0)"),
        4,
    );
}

#[test]
fn test_outer_instance_used_in_loop_body() {
    expect_i32(
        &with_point(
            "(var p (new Point 0 0)) (var i 0)
             (while (< i 3) (begin (set (prop p x) (+ (prop p x) 2)) (set i (+ i 1))))
             (prop p x)",
        ),
        6,
    );
}
