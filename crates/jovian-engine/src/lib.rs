//! Jovian language engine
//!
//! - `parser`: source text to `Expression`
//! - `compiler`: `Expression` to IR, class layout and dispatch
//! - `vm`: reference interpreter for compiled modules

pub mod compiler;
pub mod parser;
pub mod vm;

pub use compiler::{compile_source, exec, CompileError, CompiledProgram, CompilerOptions};
pub use parser::{parse_program, Expression, ParseError};
pub use vm::{Vm, VmError};
