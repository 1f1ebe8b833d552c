//! IR Functions
//!
//! A function is a signature plus basic blocks. A function without blocks is
//! an external declaration (`printf`, `malloc`) or a method prototype whose
//! body has not been generated yet.

use super::block::{BasicBlock, BasicBlockId};
use super::types::{FunctionType, IrType};
use super::value::{Register, RegisterId, Value};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone)]
pub struct IrFunction {
    pub name: String,
    pub ty: FunctionType,
    /// Parameter registers, numbered from zero
    pub params: Vec<Register>,
    pub param_names: Vec<String>,
    /// Basic blocks (in order)
    pub blocks: Vec<BasicBlock>,
    pub entry_block: BasicBlockId,
    block_map: FxHashMap<BasicBlockId, usize>,
    next_register: u32,
    next_block: u32,
}

impl IrFunction {
    pub fn new(name: impl Into<String>, ty: FunctionType, param_names: Vec<String>) -> Self {
        let params: Vec<Register> = ty
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| Register::new(RegisterId(i as u32), ty.clone()))
            .collect();
        let next_register = params.len() as u32;
        Self {
            name: name.into(),
            ty,
            params,
            param_names,
            blocks: Vec::new(),
            entry_block: BasicBlockId(0),
            block_map: FxHashMap::default(),
            next_register,
            next_block: 0,
        }
    }

    pub fn return_type(&self) -> &IrType {
        &self.ty.ret
    }

    /// Declarations have no body
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn alloc_register(&mut self, ty: IrType) -> Register {
        let id = RegisterId(self.next_register);
        self.next_register += 1;
        Register::new(id, ty)
    }

    /// Create a labelled block, append it, and return its ID.
    /// The first block created becomes the entry block.
    pub fn append_block(&mut self, label: impl Into<String>) -> BasicBlockId {
        let id = BasicBlockId(self.next_block);
        self.next_block += 1;
        if self.blocks.is_empty() {
            self.entry_block = id;
        }
        self.add_block(BasicBlock::with_label(id, label))
    }

    pub fn add_block(&mut self, block: BasicBlock) -> BasicBlockId {
        let id = block.id;
        let index = self.blocks.len();
        self.block_map.insert(id, index);
        self.blocks.push(block);
        self.next_block = self.next_block.max(id.0 + 1);
        id
    }

    pub fn get_block(&self, id: BasicBlockId) -> Option<&BasicBlock> {
        self.block_map.get(&id).map(|&idx| &self.blocks[idx])
    }

    pub fn get_block_mut(&mut self, id: BasicBlockId) -> Option<&mut BasicBlock> {
        self.block_map
            .get(&id)
            .copied()
            .map(|idx| &mut self.blocks[idx])
    }

    pub fn entry(&self) -> Option<&BasicBlock> {
        self.get_block(self.entry_block)
    }

    pub fn entry_mut(&mut self) -> Option<&mut BasicBlock> {
        self.get_block_mut(self.entry_block)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    /// Validate the function structure
    pub fn validate(&self) -> Result<(), String> {
        if self.blocks.is_empty() {
            return Err(format!("Function {} has no blocks", self.name));
        }

        if self.get_block(self.entry_block).is_none() {
            return Err(format!(
                "Entry block {} of {} does not exist",
                self.entry_block, self.name
            ));
        }

        for block in &self.blocks {
            if !block.is_terminated() {
                return Err(format!(
                    "Block {} of {} is not terminated",
                    block.id, self.name
                ));
            }

            for succ in block.successors() {
                if self.get_block(succ).is_none() {
                    return Err(format!(
                        "Block {} of {} references non-existent successor {}",
                        block.id, self.name, succ
                    ));
                }
            }
        }

        self.validate_registers()
    }

    /// Every register read must be a parameter or the `dest` of an
    /// instruction of this function, with the same type. Within one block a
    /// non-phi use must follow its definition.
    fn validate_registers(&self) -> Result<(), String> {
        let mut defined: FxHashMap<RegisterId, &IrType> =
            self.params.iter().map(|p| (p.id, &p.ty)).collect();
        for block in &self.blocks {
            for dest in block.instructions.iter().filter_map(|i| i.dest()) {
                if defined.insert(dest.id, &dest.ty).is_some() {
                    return Err(format!("Register {} of {} is defined twice", dest.id, self.name));
                }
            }
        }

        for block in &self.blocks {
            let mut pending: FxHashSet<RegisterId> = block
                .instructions
                .iter()
                .filter_map(|i| i.dest().map(|d| d.id))
                .collect();

            for instr in &block.instructions {
                let ordered = !instr.is_phi();
                for value in instr.operands() {
                    self.check_use(block.id, value, &defined, ordered.then_some(&pending))?;
                }
                if let Some(dest) = instr.dest() {
                    pending.remove(&dest.id);
                }
            }
            if let Some(value) = block.terminator.operand() {
                self.check_use(block.id, value, &defined, None)?;
            }
        }

        Ok(())
    }

    fn check_use(
        &self,
        block: BasicBlockId,
        value: &Value,
        defined: &FxHashMap<RegisterId, &IrType>,
        pending: Option<&FxHashSet<RegisterId>>,
    ) -> Result<(), String> {
        let Value::Register(reg) = value else {
            return Ok(());
        };
        match defined.get(&reg.id) {
            None => Err(format!(
                "Block {} of {} reads undefined register {}",
                block, self.name, reg.id
            )),
            Some(ty) if **ty != reg.ty => Err(format!(
                "Block {} of {} reads {} as {:?}, but it is defined as {:?}",
                block, self.name, reg.id, reg.ty, ty
            )),
            Some(_) if pending.is_some_and(|p| p.contains(&reg.id)) => Err(format!(
                "Block {} of {} reads register {} before its definition",
                block, self.name, reg.id
            )),
            Some(_) => Ok(()),
        }
    }
}
