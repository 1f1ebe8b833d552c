//! Shared helpers for the e2e suite.

#![allow(dead_code)]

use jovian_engine::compiler::CompileError;
use jovian_engine::{compile_source, CompilerOptions, Vm};

/// Compile and run `source`, returning main's result and everything printed
pub fn compile_and_run(source: &str) -> (i32, String) {
    let program = compile_source(source, &CompilerOptions::default())
        .unwrap_or_else(|e| panic!("compile failed: {}\n--- source ---\n{}", e, source));
    let mut vm = Vm::new(&program.module).expect("module loads");
    let code = vm
        .run_main()
        .unwrap_or_else(|e| panic!("run failed: {}\n--- IR ---\n{}", e, program.to_ir_string()));
    (code, vm.output_string())
}

/// Run `source` and hand the finished VM to `inspect`
pub fn run_and_inspect(source: &str, inspect: impl FnOnce(i32, &Vm<'_>)) {
    let program = compile_source(source, &CompilerOptions::default()).expect("compiles");
    let mut vm = Vm::new(&program.module).expect("module loads");
    let code = vm.run_main().expect("runs");
    inspect(code, &vm);
}

pub fn expect_i32(source: &str, expected: i32) {
    let (code, _) = compile_and_run(source);
    assert_eq!(code, expected, "wrong result for:\n{}", source);
}

pub fn expect_output(source: &str, expected: &str) {
    let (_, output) = compile_and_run(source);
    assert_eq!(output, expected, "wrong output for:\n{}", source);
}

pub fn expect_compile_error(source: &str) -> CompileError {
    match compile_source(source, &CompilerOptions::default()) {
        Ok(program) => panic!(
            "expected a compile error for:\n{}\n--- IR ---\n{}",
            source,
            program.to_ir_string()
        ),
        Err(err) => err,
    }
}

/// Two-field `Point` with a constructor and accessors
pub const POINT: &str = r#"
(class Point null
  (begin
    (var x 0)
    (var y 0)
    (def constructor (self x y)
      (begin
        (set (prop self x) x)
        (set (prop self y) y)))
    (def calc (self)
      (+ (prop self x) (prop self y)))))
"#;
