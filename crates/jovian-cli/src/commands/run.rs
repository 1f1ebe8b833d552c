//! `jovian run`: compile and execute in the VM.

use super::Input;
use jovian_engine::{CompilerOptions, Vm};
use std::io::Write;
use termcolor::ColorChoice;

/// Returns the value of `main`, used as the process exit code
pub fn execute(input: Input, color: ColorChoice) -> anyhow::Result<i32> {
    let (name, source) = input.read()?;
    let program = super::compile(&name, &source, &CompilerOptions::default(), color)?;

    let mut vm = Vm::new(&program.module)?;
    let result = vm.run_main();

    // whatever was printed before a fault is still shown
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(vm.output())?;
    stdout.flush()?;

    let code = result?;
    log::debug!("main returned {}", code);
    Ok(code)
}
