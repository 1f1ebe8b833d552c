//! Basic Blocks and Control Flow

use super::instr::IrInstr;
use super::value::Value;

/// Basic block identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BasicBlockId(pub u32);

impl BasicBlockId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for BasicBlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// A basic block: sequence of instructions with single entry and exit
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BasicBlockId,
    /// Label kept for readability of the printed module
    pub label: Option<String>,
    /// Instructions in this block (excluding terminator)
    pub instructions: Vec<IrInstr>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn new(id: BasicBlockId) -> Self {
        Self {
            id,
            label: None,
            instructions: Vec::new(),
            terminator: Terminator::Unreachable,
        }
    }

    pub fn with_label(id: BasicBlockId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: Some(label.into()),
            instructions: Vec::new(),
            terminator: Terminator::Unreachable,
        }
    }

    pub fn add_instr(&mut self, instr: IrInstr) {
        self.instructions.push(instr);
    }

    /// Insert after the leading run of allocas, keeping stack slots grouped at the top
    pub fn add_alloca(&mut self, instr: IrInstr) {
        let at = self
            .instructions
            .iter()
            .take_while(|i| i.is_alloca())
            .count();
        self.instructions.insert(at, instr);
    }

    pub fn set_terminator(&mut self, term: Terminator) {
        self.terminator = term;
    }

    pub fn successors(&self) -> Vec<BasicBlockId> {
        self.terminator.successors()
    }

    /// Check if this block is terminated (not unreachable)
    pub fn is_terminated(&self) -> bool {
        !matches!(self.terminator, Terminator::Unreachable)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Control flow terminator (ends a basic block)
#[derive(Debug, Clone)]
pub enum Terminator {
    /// Unconditional jump to target block
    Jump(BasicBlockId),

    /// Conditional branch on an `i1`
    Branch {
        cond: Value,
        then_block: BasicBlockId,
        else_block: BasicBlockId,
    },

    /// Return from function with optional value
    Return(Option<Value>),

    /// Placeholder before a terminator is set
    Unreachable,
}

impl Terminator {
    pub fn successors(&self) -> Vec<BasicBlockId> {
        match self {
            Terminator::Jump(target) => vec![*target],
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) | Terminator::Unreachable => vec![],
        }
    }

    pub fn operand(&self) -> Option<&Value> {
        match self {
            Terminator::Branch { cond, .. } => Some(cond),
            Terminator::Return(value) => value.as_ref(),
            Terminator::Jump(_) | Terminator::Unreachable => None,
        }
    }
}
