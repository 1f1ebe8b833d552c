//! Reference VM
//!
//! Executes a compiled `IrModule` directly. Memory is byte-addressed and
//! split into segments (globals, heap blocks, stack slots); `printf` and
//! `malloc` are provided as externals and program output is captured.

pub mod interpreter;
pub mod memory;
pub mod printf;

pub use interpreter::{Vm, MAX_CALL_DEPTH};
pub use memory::{Memory, SegmentKind};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("Null pointer dereference")]
    NullPointer,

    #[error("Invalid address {0:#x}")]
    InvalidAddress(u64),

    #[error("Access of {len} byte(s) at {address:#x} is out of bounds")]
    OutOfBounds { address: u64, len: usize },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Stack overflow (call depth exceeded {0})")]
    StackOverflow(usize),

    #[error("Invalid function pointer {0:#x}")]
    InvalidFunctionPointer(u64),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Call to unknown external function: {0}")]
    UnknownExternal(String),

    #[error("Reached unreachable code in {0}")]
    Unreachable(String),

    #[error("printf: {0}")]
    Printf(String),

    #[error("Malformed module: {0}")]
    MalformedModule(String),
}

/// VM execution result
pub type VmResult<T> = Result<T, VmError>;
