//! `printf`

use super::harness::*;

#[test]
fn test_printf_value() {
    expect_output(r#"(printf "Value: %d\n" 42)"#, "Value: 42\n");
}

#[test]
fn test_printf_returns_length() {
    expect_i32(r#"(printf "abc")"#, 3);
}

#[test]
fn test_printf_string_argument() {
    expect_output(r#"(printf "%s, %s!\n" "Hello" "world")"#, "Hello, world!\n");
}

#[test]
fn test_printf_bool_is_promoted() {
    expect_output(r#"(printf "%d %d\n" true (> 1 2))"#, "1 0\n");
}

#[test]
fn test_printf_expressions() {
    expect_output(
        r#"(var x 6) (printf "%d * 7 = %d\n" x (* x 7))"#,
        "6 * 7 = 42\n",
    );
}

#[test]
fn test_printf_version() {
    expect_output(r#"(printf "VERSION: %d\n" VERSION)"#, "VERSION: 42\n");
}

#[test]
fn test_printf_negative_and_width() {
    expect_output(r#"(printf "[%5d][%-3d]" -12 7)"#, "[  -12][7  ]");
}

#[test]
fn test_printf_from_method() {
    expect_output(
        &format!(
            "{}\n{}",
            POINT,
            r#"(var p (new Point 2 3)) (printf "calc=%d\n" ((method p calc) p))"#
        ),
        "calc=5\n",
    );
}
