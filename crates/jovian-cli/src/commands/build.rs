//! `jovian build`: compile to IR text.

use super::Input;
use jovian_engine::CompilerOptions;
use std::path::PathBuf;
use termcolor::ColorChoice;

pub fn execute(
    input: Input,
    output: PathBuf,
    quiet: bool,
    color: ColorChoice,
) -> anyhow::Result<()> {
    let (name, source) = input.read()?;
    let options = CompilerOptions {
        output_path: output,
        ..CompilerOptions::default()
    };

    let program = super::compile(&name, &source, &options, color)?;
    if !quiet {
        println!("{}", program.to_ir_string());
    }
    program.write_to(&options.output_path)?;
    log::info!("wrote {}", options.output_path.display());
    Ok(())
}
