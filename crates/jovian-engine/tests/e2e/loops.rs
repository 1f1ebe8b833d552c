//! `while`

use super::harness::*;

#[test]
fn test_while_counts() {
    expect_i32(
        "(var i 0)
         (while (< i 10)
           (set i (+ i 1)))
         i",
        10,
    );
}

#[test]
fn test_while_value_is_zero() {
    expect_i32("(var i 0) (while (< i 3) (set i (+ i 1)))", 0);
}

#[test]
fn test_while_never_entered() {
    expect_i32("(var i 5) (while (< i 3) (set i 100)) i", 5);
}

#[test]
fn test_sum_loop() {
    expect_i32(
        "(var i 1)
         (var sum 0)
         (while (<= i 100)
           (begin
             (set sum (+ sum i))
             (set i (+ i 1))))
         sum",
        5050,
    );
}

#[test]
fn test_nested_loops() {
    expect_i32(
        "(var total 0)
         (var i 0)
         (while (< i 4)
           (begin
             (var j 0)
             (while (< j 3)
               (begin
                 (set total (+ total 1))
                 (set j (+ j 1))))
             (set i (+ i 1))))
         total",
        12,
    );
}

#[test]
fn test_loop_with_if() {
    expect_i32(
        "(var i 0)
         (var evens 0)
         (while (< i 10)
           (begin
             (if (== (* (/ i 2) 2) i)
                 (set evens (+ evens 1))
                 0)
             (set i (+ i 1))))
         evens",
        5,
    );
}

#[test]
fn test_loop_prints() {
    expect_output(
        r#"(var i 0)
           (while (< i 3)
             (begin
               (printf "%d " i)
               (set i (+ i 1))))"#,
        "0 1 2 ",
    );
}
