//! Jovian compiler
//!
//! Lowers an `Expression` program to an `IrModule`:
//! - `env`: lexical scopes
//! - `class_layout`: class registry, field/method slots, vtables
//! - `lower`: the code generator
//! - `ir`: the target IR and its builder

pub mod class_layout;
pub mod env;
pub mod error;
pub mod ir;
mod lower;

pub use class_layout::{ClassInfo, ClassLayout, ClassRegistry};
pub use env::{Binding, Environment};
pub use error::{CompileError, CompileResult};
pub use lower::{CompiledProgram, Compiler};

use crate::parser::{parse_program, Expression};
use ir::PrettyPrint;
use std::path::{Path, PathBuf};

/// Settings for one compilation
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub module_name: String,
    pub target_triple: String,
    /// Where `exec` writes the textual module
    pub output_path: PathBuf,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            module_name: "JovianVM".to_string(),
            target_triple: "x86_64-pc-linux-gnu".to_string(),
            output_path: PathBuf::from("./out.ll"),
        }
    }
}

impl CompiledProgram {
    /// Textual form of the module
    pub fn to_ir_string(&self) -> String {
        self.module.pretty_print()
    }

    pub fn write_to(&self, path: &Path) -> CompileResult<()> {
        std::fs::write(path, self.to_ir_string()).map_err(|source| CompileError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Compile an already parsed program
pub fn compile_program(
    program: &Expression,
    options: &CompilerOptions,
) -> CompileResult<CompiledProgram> {
    Compiler::new(options).compile(program)
}

/// Parse and compile source text; top-level expressions are wrapped in `(begin ...)`
pub fn compile_source(source: &str, options: &CompilerOptions) -> CompileResult<CompiledProgram> {
    let program = parse_program(source)?;
    compile_program(&program, options)
}

/// Parse, compile, and write the module to `options.output_path`.
/// Nothing is written when compilation fails.
pub fn exec(source: &str, options: &CompilerOptions) -> CompileResult<CompiledProgram> {
    let compiled = compile_source(source, options)?;
    compiled.write_to(&options.output_path)?;
    log::info!("wrote {}", options.output_path.display());
    Ok(compiled)
}
