//! `jovian layout`: class slot tables as JSON.

use super::Input;
use jovian_engine::CompilerOptions;
use termcolor::ColorChoice;

pub fn execute(input: Input, color: ColorChoice) -> anyhow::Result<()> {
    let (name, source) = input.read()?;
    let program = super::compile(&name, &source, &CompilerOptions::default(), color)?;
    println!("{}", serde_json::to_string_pretty(&program.classes)?);
    Ok(())
}
