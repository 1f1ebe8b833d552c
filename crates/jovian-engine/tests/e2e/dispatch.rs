//! Vtable dispatch, inheritance, `super` and `__call__`

use super::harness::*;
use jovian_engine::compiler::CompileError;

const SHAPES: &str = r#"
(class Point null
  (begin
    (var x 0)
    (var y 0)
    (def constructor (self x y)
      (begin
        (set (prop self x) x)
        (set (prop self y) y)))
    (def calc (self) (+ (prop self x) (prop self y)))
    (def name (self) 1)))

(class Point3D Point
  (begin
    (var z 0)
    (def constructor (self x y z)
      (begin
        ((method (super Point3D) constructor) self x y)
        (set (prop self z) z)))
    (def calc (self)
      (+ ((method (super Point3D) calc) self) (prop self z)))))

(class Point4D Point3D
  (begin
    (var zoom 0)
    (def calc (self) (* ((method (super Point4D) calc) self) 10))))
"#;

fn with_shapes(body: &str) -> String {
    format!("{}\n{}", SHAPES, body)
}

// ============================================================================
// Dynamic dispatch
// ============================================================================

#[test]
fn test_method_call() {
    expect_i32(&with_shapes("(var p (new Point 10 20)) ((method p calc) p)"), 30);
}

#[test]
fn test_override() {
    expect_i32(
        &with_shapes("(var p (new Point3D 10 20 30)) ((method p calc) p)"),
        60,
    );
}

#[test]
fn test_inherited_method() {
    expect_i32(&with_shapes("(var p (new Point3D 1 2 3)) ((method p name) p)"), 1);
}

#[test]
fn test_inherited_field() {
    expect_i32(&with_shapes("(var p (new Point3D 1 2 3)) (prop p y)"), 2);
}

#[test]
fn test_dispatch_through_parent_typed_parameter() {
    expect_i32(
        &with_shapes(
            "(def total ((p Point)) ((method p calc) p))
             (+ (total (new Point 1 2)) (total (new Point3D 1 2 3)))",
        ),
        9,
    );
}

// ============================================================================
// super
// ============================================================================

#[test]
fn test_super_is_static_for_grandchild() {
    // Point4D's calc reaches Point3D's calc, which must reach Point's calc
    // rather than looping back through the instance's own vtable.
    expect_i32(
        &with_shapes(
            "(var p (new Point4D 1 2 3))
             ((method p calc) p)",
        ),
        60,
    );
}

#[test]
fn test_inherited_constructor() {
    expect_i32(&with_shapes("(var p (new Point4D 1 2 3)) (prop p z)"), 3);
}

#[test]
fn test_super_of_root_class() {
    let err = expect_compile_error(&with_shapes(
        "(var p (new Point 1 2)) ((method (super Point) calc) p)",
    ));
    assert!(matches!(err, CompileError::MalformedExpression { .. }));
}

#[test]
fn test_super_outside_method() {
    let err = expect_compile_error(&with_shapes("(super Point3D)"));
    assert!(matches!(err, CompileError::MalformedExpression { .. }));
}

#[test]
fn test_unknown_method() {
    let err = expect_compile_error(&with_shapes("(var p (new Point 1 2)) (method p fly)"));
    assert!(matches!(err, CompileError::UnknownMember { member, .. } if member == "fly"));
}

// ============================================================================
// Callable instances
// ============================================================================

#[test]
fn test_call_operator() {
    expect_i32(
        "(class Adder null
           (begin
             (var base 0)
             (def constructor (self base) (set (prop self base) base))
             (def __call__ (self x) (+ (prop self base) x))))
         (var add5 (new Adder 5))
         (add5 10)",
        15,
    );
}

#[test]
fn test_inherited_call_operator() {
    expect_i32(
        "(class Adder null
           (begin
             (var base 0)
             (def constructor (self base) (set (prop self base) base))
             (def __call__ (self x) (+ (prop self base) x))))
         (class Named Adder (begin (var tag 0)))
         (var f (new Named 2))
         (f 40)",
        42,
    );
}

#[test]
fn test_instance_without_call_operator() {
    let err = expect_compile_error(&with_shapes("(var p (new Point 1 2)) (p 1)"));
    assert!(matches!(err, CompileError::UnknownMember { .. }));
}
