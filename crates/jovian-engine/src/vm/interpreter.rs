//! IR interpreter
//!
//! Walks basic blocks of an `IrModule`. Every value is a `u64` holding the
//! bits of its IR type, masked to the type's width. Phi nodes are resolved on
//! block entry from the predecessor block.

use super::memory::{function_address, function_id, Memory, SegmentKind};
use super::printf;
use super::{VmError, VmResult};
use crate::compiler::ir::{
    BasicBlockId, BinaryOp, CastOp, CmpOp, DataLayout, FunctionId, Initializer, IrFunction,
    IrInstr, IrModule, IrType, RegisterId, Terminator, Value,
};
use rustc_hash::FxHashMap;

/// Deepest call nesting before `StackOverflow`
pub const MAX_CALL_DEPTH: usize = 256;

fn mask(value: u64, bits: u32) -> u64 {
    if bits >= 64 {
        value
    } else {
        value & ((1u64 << bits) - 1)
    }
}

fn sign_extend(value: u64, bits: u32) -> i64 {
    if bits >= 64 {
        value as i64
    } else {
        let shift = 64 - bits;
        ((value << shift) as i64) >> shift
    }
}

/// Width in bits of a value of this type; pointers are 64-bit
fn bits_of(ty: &IrType) -> u32 {
    ty.int_bits().unwrap_or(64)
}

#[derive(Default)]
struct Frame {
    registers: FxHashMap<RegisterId, u64>,
    stack_slots: Vec<u64>,
}

pub struct Vm<'m> {
    module: &'m IrModule,
    memory: Memory,
    layout: DataLayout,
    /// Address of each global, indexed by `GlobalId`
    globals: Vec<u64>,
    output: Vec<u8>,
    depth: usize,
}

impl<'m> Vm<'m> {
    /// Load a module: allocate and initialize every global
    pub fn new(module: &'m IrModule) -> VmResult<Self> {
        let mut vm = Self {
            module,
            memory: Memory::new(),
            layout: DataLayout::x86_64(),
            globals: Vec::with_capacity(module.globals.len()),
            output: Vec::new(),
            depth: 0,
        };

        for global in &module.globals {
            let size = vm.layout.size_of(&global.ty, module) as usize;
            let address = vm.memory.allocate(SegmentKind::Global, size);
            vm.globals.push(address);
        }

        // initializers may refer to any global or function, so all addresses exist first
        let frame = Frame::default();
        for (global, &address) in module.globals.iter().zip(&vm.globals) {
            match &global.init {
                Initializer::Int(value) => {
                    let size = vm.layout.size_of(&global.ty, module) as usize;
                    vm.memory.write_uint(address, size, *value as u64)?;
                }
                Initializer::Bytes(bytes) => vm.memory.write(address, bytes)?,
                Initializer::Struct(fields) => {
                    let IrType::Struct(id) = global.ty else {
                        return Err(VmError::MalformedModule(format!(
                            "aggregate initializer on non-struct global {}",
                            global.name
                        )));
                    };
                    let offsets = vm.layout.struct_layout(id, module).offsets;
                    for (field, offset) in fields.iter().zip(offsets) {
                        let size = vm.layout.size_of(&field.ty(), module) as usize;
                        let bits = vm.eval(&frame, field)?;
                        vm.memory.write_uint(address + offset, size, bits)?;
                    }
                }
                Initializer::Zero => {}
            }
        }

        Ok(vm)
    }

    /// Run `main` and return its exit value
    pub fn run_main(&mut self) -> VmResult<i32> {
        let result = self.call("main", &[])?;
        Ok(result as u32 as i32)
    }

    /// Call a function by name with raw argument bits
    pub fn call(&mut self, name: &str, args: &[u64]) -> VmResult<u64> {
        let id = self
            .module
            .get_function_id(name)
            .ok_or_else(|| VmError::UnknownFunction(name.to_string()))?;
        self.call_function(id, args.to_vec())
    }

    /// Everything the program printed so far
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn global_address(&self, name: &str) -> Option<u64> {
        self.module
            .global_id(name)
            .and_then(|id| self.globals.get(id.0 as usize).copied())
    }

    fn call_function(&mut self, id: FunctionId, args: Vec<u64>) -> VmResult<u64> {
        let module = self.module;
        let func = module
            .get_function(id)
            .ok_or_else(|| VmError::UnknownFunction(id.to_string()))?;

        if func.is_declaration() {
            return self.call_external(func, &args);
        }

        if self.depth >= MAX_CALL_DEPTH {
            return Err(VmError::StackOverflow(MAX_CALL_DEPTH));
        }
        self.depth += 1;
        log::trace!("call {} ({} args)", func.name, args.len());

        let mut frame = Frame::default();
        for (param, arg) in func.params.iter().zip(args) {
            frame.registers.insert(param.id, mask(arg, bits_of(&param.ty)));
        }

        let result = self.execute(func, &mut frame);

        for slot in frame.stack_slots {
            self.memory.free(slot)?;
        }
        self.depth -= 1;
        result
    }

    fn execute(&mut self, func: &IrFunction, frame: &mut Frame) -> VmResult<u64> {
        let mut current = func.entry_block;
        let mut previous: Option<BasicBlockId> = None;

        loop {
            let block = func.get_block(current).ok_or_else(|| {
                VmError::MalformedModule(format!("{} has no block {}", func.name, current))
            })?;

            // phis read their inputs before any of them is written
            let mut phi_values = Vec::new();
            for instr in block.instructions.iter().take_while(|i| i.is_phi()) {
                if let IrInstr::Phi { dest, incoming } = instr {
                    let value = incoming
                        .iter()
                        .find(|(_, pred)| Some(*pred) == previous)
                        .map(|(value, _)| value)
                        .ok_or_else(|| {
                            VmError::MalformedModule(format!(
                                "phi in {} of {} has no entry for the predecessor",
                                current, func.name
                            ))
                        })?;
                    phi_values.push((dest.id, self.eval(frame, value)?));
                }
            }
            for (reg, value) in phi_values {
                frame.registers.insert(reg, value);
            }

            for instr in block.instructions.iter().skip_while(|i| i.is_phi()) {
                self.step(instr, frame)?;
            }

            match &block.terminator {
                Terminator::Jump(target) => {
                    previous = Some(current);
                    current = *target;
                }
                Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                } => {
                    previous = Some(current);
                    current = if self.eval(frame, cond)? & 1 != 0 {
                        *then_block
                    } else {
                        *else_block
                    };
                }
                Terminator::Return(value) => {
                    return match value {
                        Some(value) => self.eval(frame, value),
                        None => Ok(0),
                    };
                }
                Terminator::Unreachable => return Err(VmError::Unreachable(func.name.clone())),
            }
        }
    }

    fn step(&mut self, instr: &IrInstr, frame: &mut Frame) -> VmResult<()> {
        match instr {
            IrInstr::Binary {
                dest,
                op,
                left,
                right,
            } => {
                let bits = bits_of(&dest.ty);
                let l = self.eval(frame, left)?;
                let r = self.eval(frame, right)?;
                let value = match op {
                    BinaryOp::Add => l.wrapping_add(r),
                    BinaryOp::Sub => l.wrapping_sub(r),
                    BinaryOp::Mul => l.wrapping_mul(r),
                    BinaryOp::SDiv => {
                        let divisor = sign_extend(r, bits);
                        if divisor == 0 {
                            return Err(VmError::DivisionByZero);
                        }
                        sign_extend(l, bits).wrapping_div(divisor) as u64
                    }
                };
                frame.registers.insert(dest.id, mask(value, bits));
            }
            IrInstr::ICmp {
                dest,
                op,
                left,
                right,
            } => {
                let l = self.eval(frame, left)?;
                let r = self.eval(frame, right)?;
                let result = match op {
                    CmpOp::Eq => l == r,
                    CmpOp::Ne => l != r,
                    CmpOp::Ugt => l > r,
                    CmpOp::Uge => l >= r,
                    CmpOp::Ult => l < r,
                    CmpOp::Ule => l <= r,
                };
                frame.registers.insert(dest.id, result as u64);
            }
            IrInstr::Alloca { dest, ty, .. } => {
                let size = self.layout.size_of(ty, self.module).max(1) as usize;
                let address = self.memory.allocate(SegmentKind::Stack, size);
                frame.stack_slots.push(address);
                frame.registers.insert(dest.id, address);
            }
            IrInstr::Load { dest, ptr } => {
                let address = self.eval(frame, ptr)?;
                let size = self.layout.size_of(&dest.ty, self.module) as usize;
                let value = self.memory.read_uint(address, size)?;
                frame.registers.insert(dest.id, mask(value, bits_of(&dest.ty)));
            }
            IrInstr::Store { value, ptr } => {
                let address = self.eval(frame, ptr)?;
                let size = self.layout.size_of(&value.ty(), self.module) as usize;
                let bits = self.eval(frame, value)?;
                self.memory.write_uint(address, size, bits)?;
            }
            IrInstr::StructGep {
                dest,
                struct_id,
                base,
                index,
            } => {
                let base = self.eval(frame, base)?;
                let offset = self
                    .layout
                    .struct_layout(*struct_id, self.module)
                    .offsets
                    .get(*index as usize)
                    .copied()
                    .ok_or_else(|| {
                        VmError::MalformedModule(format!(
                            "field {} out of range for {}",
                            index,
                            self.module.struct_name(*struct_id)
                        ))
                    })?;
                frame.registers.insert(dest.id, base.wrapping_add(offset));
            }
            IrInstr::Call {
                dest, callee, args, ..
            } => {
                let target = match callee {
                    Value::Function { id, .. } => *id,
                    other => {
                        let address = self.eval(frame, other)?;
                        function_id(address)
                            .ok_or(VmError::InvalidFunctionPointer(address))?
                    }
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval(frame, arg))
                    .collect::<VmResult<Vec<_>>>()?;
                let result = self.call_function(target, args)?;
                if let Some(dest) = dest {
                    frame.registers.insert(dest.id, mask(result, bits_of(&dest.ty)));
                }
            }
            IrInstr::Cast { dest, op, value } => {
                let bits = self.eval(frame, value)?;
                let to = bits_of(&dest.ty);
                let result = match op {
                    CastOp::BitCast | CastOp::ZExt | CastOp::Trunc => mask(bits, to),
                    CastOp::SExt => mask(sign_extend(bits, bits_of(&value.ty())) as u64, to),
                };
                frame.registers.insert(dest.id, result);
            }
            IrInstr::Phi { .. } => {
                return Err(VmError::MalformedModule(
                    "phi after a non-phi instruction".to_string(),
                ))
            }
        }
        Ok(())
    }

    fn eval(&self, frame: &Frame, value: &Value) -> VmResult<u64> {
        match value {
            Value::Register(reg) => frame.registers.get(&reg.id).copied().ok_or_else(|| {
                VmError::MalformedModule(format!("register {} read before definition", reg.id))
            }),
            Value::ConstInt { ty, value } => Ok(mask(*value as u64, bits_of(ty))),
            Value::Null(_) => Ok(0),
            Value::Global { id, .. } | Value::StringPtr(id) => self
                .globals
                .get(id.0 as usize)
                .copied()
                .ok_or_else(|| VmError::MalformedModule(format!("unknown global {}", id.0))),
            Value::Function { id, .. } => Ok(function_address(*id)),
        }
    }

    fn call_external(&mut self, func: &IrFunction, args: &[u64]) -> VmResult<u64> {
        match func.name.as_str() {
            "printf" => {
                let format = args
                    .first()
                    .ok_or_else(|| VmError::Printf("missing format string".to_string()))?;
                let format = self.memory.read_c_string(*format)?;
                let text = printf::format(&format, &args[1..], &self.memory)?;
                self.output.extend_from_slice(&text);
                Ok(text.len() as u64)
            }
            "malloc" => {
                let size = args.first().copied().unwrap_or(0) as usize;
                Ok(self.memory.allocate(SegmentKind::Heap, size))
            }
            other => Err(VmError::UnknownExternal(other.to_string())),
        }
    }
}
