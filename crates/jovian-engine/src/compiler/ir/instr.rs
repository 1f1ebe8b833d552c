//! IR Instructions
//!
//! Three-address instructions over typed registers. Terminators live in
//! `block.rs`.

use super::block::BasicBlockId;
use super::types::{FunctionType, IrType, StructId};
use super::value::{Register, Value};

/// Integer arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
}

impl BinaryOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::SDiv => "sdiv",
        }
    }
}

/// Integer comparison predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
}

impl CmpOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Ugt => "ugt",
            CmpOp::Uge => "uge",
            CmpOp::Ult => "ult",
            CmpOp::Ule => "ule",
        }
    }
}

/// Representation-changing casts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    /// Pointer to pointer
    BitCast,
    ZExt,
    SExt,
    Trunc,
}

impl CastOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CastOp::BitCast => "bitcast",
            CastOp::ZExt => "zext",
            CastOp::SExt => "sext",
            CastOp::Trunc => "trunc",
        }
    }
}

/// An IR instruction
#[derive(Debug, Clone)]
pub enum IrInstr {
    Binary {
        dest: Register,
        op: BinaryOp,
        left: Value,
        right: Value,
    },

    /// Produces an `i1`
    ICmp {
        dest: Register,
        op: CmpOp,
        left: Value,
        right: Value,
    },

    /// Stack slot; `dest` has type `ty*`
    Alloca {
        dest: Register,
        ty: IrType,
        name: String,
    },

    Load {
        dest: Register,
        ptr: Value,
    },

    Store {
        value: Value,
        ptr: Value,
    },

    /// Address of field `index` of the struct `base` points at
    StructGep {
        dest: Register,
        struct_id: StructId,
        base: Value,
        index: u32,
    },

    /// Direct or indirect call; `dest` is `None` for void results
    Call {
        dest: Option<Register>,
        callee: Value,
        fn_ty: FunctionType,
        args: Vec<Value>,
    },

    Cast {
        dest: Register,
        op: CastOp,
        value: Value,
    },

    /// SSA merge: value depends on the predecessor block
    Phi {
        dest: Register,
        incoming: Vec<(Value, BasicBlockId)>,
    },
}

impl IrInstr {
    /// The register this instruction defines, if any
    pub fn dest(&self) -> Option<&Register> {
        match self {
            IrInstr::Binary { dest, .. }
            | IrInstr::ICmp { dest, .. }
            | IrInstr::Alloca { dest, .. }
            | IrInstr::Load { dest, .. }
            | IrInstr::StructGep { dest, .. }
            | IrInstr::Cast { dest, .. }
            | IrInstr::Phi { dest, .. } => Some(dest),
            IrInstr::Call { dest, .. } => dest.as_ref(),
            IrInstr::Store { .. } => None,
        }
    }

    /// Values this instruction reads
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            IrInstr::Binary { left, right, .. } | IrInstr::ICmp { left, right, .. } => {
                vec![left, right]
            }
            IrInstr::Alloca { .. } => vec![],
            IrInstr::Load { ptr, .. } => vec![ptr],
            IrInstr::Store { value, ptr } => vec![value, ptr],
            IrInstr::StructGep { base, .. } => vec![base],
            IrInstr::Call { callee, args, .. } => std::iter::once(callee).chain(args).collect(),
            IrInstr::Cast { value, .. } => vec![value],
            IrInstr::Phi { incoming, .. } => incoming.iter().map(|(value, _)| value).collect(),
        }
    }

    pub fn is_alloca(&self) -> bool {
        matches!(self, IrInstr::Alloca { .. })
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, IrInstr::Phi { .. })
    }
}
