//! Intermediate Representation
//!
//! A small typed-pointer SSA IR: named struct types, globals, functions made
//! of basic blocks, and a builder with an explicit insertion point. The
//! compiler emits into it; the VM executes it; `PrettyPrint` renders it as
//! text.

pub mod block;
pub mod builder;
pub mod function;
pub mod instr;
pub mod layout;
pub mod module;
pub mod pretty;
pub mod types;
pub mod value;

pub use block::{BasicBlock, BasicBlockId, Terminator};
pub use builder::{InsertPoint, IrBuilder};
pub use function::IrFunction;
pub use instr::{BinaryOp, CastOp, CmpOp, IrInstr};
pub use layout::{DataLayout, StructLayout};
pub use module::{Initializer, IrGlobal, IrModule};
pub use pretty::PrettyPrint;
pub use types::{FunctionType, IrType, StructId, StructType};
pub use value::{FunctionId, GlobalId, Register, RegisterId, Value};
