pub mod build;
pub mod layout;
pub mod run;

use crate::output;
use anyhow::Context;
use clap::Args;
use jovian_engine::{compile_source, CompiledProgram, CompilerOptions};
use std::path::PathBuf;
use termcolor::ColorChoice;

/// Program source: inline expression or file
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct Input {
    /// Expression to compile
    #[arg(short, long)]
    pub expression: Option<String>,

    /// File to compile
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

impl Input {
    /// Display name and text of the program
    pub fn read(&self) -> anyhow::Result<(String, String)> {
        match (&self.expression, &self.file) {
            (Some(expression), _) => Ok(("<expression>".to_string(), expression.clone())),
            (None, Some(path)) => {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Ok((path.display().to_string(), source))
            }
            (None, None) => anyhow::bail!("either --expression or --file is required"),
        }
    }
}

/// Compile, rendering any compile error as a diagnostic
pub fn compile(
    name: &str,
    source: &str,
    options: &CompilerOptions,
    color: ColorChoice,
) -> anyhow::Result<CompiledProgram> {
    compile_source(source, options).map_err(|err| {
        output::emit_compile_error(name, source, &err, color);
        anyhow::anyhow!("could not compile {}", name)
    })
}
