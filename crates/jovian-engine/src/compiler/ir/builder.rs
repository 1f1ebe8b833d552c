//! IR Builder
//!
//! Owns the module under construction and an explicit insertion point.
//! All `build_*` helpers append to the block the insertion point names and
//! return the resulting value.

use super::block::{BasicBlockId, Terminator};
use super::function::IrFunction;
use super::instr::{BinaryOp, CastOp, CmpOp, IrInstr};
use super::layout::DataLayout;
use super::module::{Initializer, IrGlobal, IrModule};
use super::types::{FunctionType, IrType};
use super::value::{FunctionId, GlobalId, Register, Value};
use crate::compiler::error::{CompileError, CompileResult};

/// Where new instructions go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPoint {
    pub function: FunctionId,
    pub block: BasicBlockId,
}

#[derive(Debug)]
pub struct IrBuilder {
    module: IrModule,
    insert_point: Option<InsertPoint>,
    layout: DataLayout,
    string_count: u32,
}

impl IrBuilder {
    pub fn new(module_name: impl Into<String>, target_triple: impl Into<String>) -> Self {
        Self {
            module: IrModule::new(module_name, target_triple),
            insert_point: None,
            layout: DataLayout::x86_64(),
            string_count: 0,
        }
    }

    pub fn module(&self) -> &IrModule {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut IrModule {
        &mut self.module
    }

    pub fn finish(self) -> IrModule {
        self.module
    }

    pub fn insert_point(&self) -> Option<InsertPoint> {
        self.insert_point
    }

    pub fn set_insert_point(&mut self, point: Option<InsertPoint>) {
        self.insert_point = point;
    }

    /// Move the insertion point to the end of `block` in the current function
    pub fn switch_to_block(&mut self, block: BasicBlockId) -> CompileResult<()> {
        let function = self.current_function()?;
        self.insert_point = Some(InsertPoint { function, block });
        Ok(())
    }

    pub fn current_function(&self) -> CompileResult<FunctionId> {
        self.insert_point
            .map(|p| p.function)
            .ok_or_else(|| CompileError::internal("no insertion point"))
    }

    pub fn current_block(&self) -> CompileResult<BasicBlockId> {
        self.insert_point
            .map(|p| p.block)
            .ok_or_else(|| CompileError::internal("no insertion point"))
    }

    fn function_mut(&mut self, id: FunctionId) -> CompileResult<&mut IrFunction> {
        self.module
            .get_function_mut(id)
            .ok_or_else(|| CompileError::internal(format!("unknown function {}", id)))
    }

    fn current_function_mut(&mut self) -> CompileResult<&mut IrFunction> {
        let id = self.current_function()?;
        self.function_mut(id)
    }

    /// Append a labelled block to `function`
    pub fn append_block_to(
        &mut self,
        function: FunctionId,
        label: &str,
    ) -> CompileResult<BasicBlockId> {
        Ok(self.function_mut(function)?.append_block(label))
    }

    /// Append a labelled block to the current function
    pub fn append_block(&mut self, label: &str) -> CompileResult<BasicBlockId> {
        Ok(self.current_function_mut()?.append_block(label))
    }

    pub fn alloc_register(&mut self, ty: IrType) -> CompileResult<Register> {
        Ok(self.current_function_mut()?.alloc_register(ty))
    }

    /// Append an instruction to the current block
    pub fn emit(&mut self, instr: IrInstr) -> CompileResult<()> {
        let block = self.current_block()?;
        let func = self.current_function_mut()?;
        let name = func.name.clone();
        func.get_block_mut(block)
            .ok_or_else(|| CompileError::internal(format!("{} has no block {}", name, block)))?
            .add_instr(instr);
        Ok(())
    }

    pub fn terminate(&mut self, term: Terminator) -> CompileResult<()> {
        let block = self.current_block()?;
        let func = self.current_function_mut()?;
        let name = func.name.clone();
        func.get_block_mut(block)
            .ok_or_else(|| CompileError::internal(format!("{} has no block {}", name, block)))?
            .set_terminator(term);
        Ok(())
    }

    // ===== Constants =====

    pub fn const_i32(&self, value: i32) -> Value {
        Value::const_i32(value)
    }

    pub fn const_bool(&self, value: bool) -> Value {
        Value::const_bool(value)
    }

    pub fn const_int(&self, ty: IrType, value: i64) -> Value {
        Value::ConstInt { ty, value }
    }

    // ===== Instructions =====

    pub fn build_binary(&mut self, op: BinaryOp, left: Value, right: Value) -> CompileResult<Value> {
        let dest = self.alloc_register(left.ty())?;
        self.emit(IrInstr::Binary {
            dest: dest.clone(),
            op,
            left,
            right,
        })?;
        Ok(dest.into())
    }

    pub fn build_icmp(&mut self, op: CmpOp, left: Value, right: Value) -> CompileResult<Value> {
        let dest = self.alloc_register(IrType::I1)?;
        self.emit(IrInstr::ICmp {
            dest: dest.clone(),
            op,
            left,
            right,
        })?;
        Ok(dest.into())
    }

    pub fn build_load(&mut self, ptr: Value) -> CompileResult<Value> {
        let ty = ptr
            .ty()
            .pointee()
            .cloned()
            .ok_or_else(|| CompileError::internal("load from a non-pointer value"))?;
        let dest = self.alloc_register(ty)?;
        self.emit(IrInstr::Load {
            dest: dest.clone(),
            ptr,
        })?;
        Ok(dest.into())
    }

    pub fn build_store(&mut self, value: Value, ptr: Value) -> CompileResult<()> {
        self.emit(IrInstr::Store { value, ptr })
    }

    /// Address of field `index` of the struct `base` points to
    pub fn build_struct_gep(&mut self, base: Value, index: u32) -> CompileResult<Value> {
        let struct_id = base
            .ty()
            .pointee_struct()
            .ok_or_else(|| CompileError::internal("struct GEP on a non-struct pointer"))?;
        let field_ty = self
            .module
            .get_struct(struct_id)
            .and_then(|s| s.field(index))
            .cloned()
            .ok_or_else(|| {
                CompileError::internal(format!(
                    "struct {} has no field {}",
                    self.module.struct_name(struct_id),
                    index
                ))
            })?;
        let dest = self.alloc_register(IrType::ptr_to(field_ty))?;
        self.emit(IrInstr::StructGep {
            dest: dest.clone(),
            struct_id,
            base,
            index,
        })?;
        Ok(dest.into())
    }

    /// Call `callee` with signature `fn_ty`. A void call evaluates to `i32 0`.
    pub fn build_call(
        &mut self,
        callee: Value,
        fn_ty: &FunctionType,
        args: Vec<Value>,
    ) -> CompileResult<Value> {
        let dest = if fn_ty.ret == IrType::Void {
            None
        } else {
            Some(self.alloc_register(fn_ty.ret.clone())?)
        };
        self.emit(IrInstr::Call {
            dest: dest.clone(),
            callee,
            fn_ty: fn_ty.clone(),
            args,
        })?;
        Ok(dest.map(Value::from).unwrap_or_else(|| Value::const_i32(0)))
    }

    pub fn build_cast(&mut self, op: CastOp, value: Value, ty: IrType) -> CompileResult<Value> {
        let dest = self.alloc_register(ty)?;
        self.emit(IrInstr::Cast {
            dest: dest.clone(),
            op,
            value,
        })?;
        Ok(dest.into())
    }

    pub fn build_phi(
        &mut self,
        ty: IrType,
        incoming: Vec<(Value, BasicBlockId)>,
    ) -> CompileResult<Value> {
        let dest = self.alloc_register(ty)?;
        self.emit(IrInstr::Phi {
            dest: dest.clone(),
            incoming,
        })?;
        Ok(dest.into())
    }

    pub fn build_br(&mut self, target: BasicBlockId) -> CompileResult<()> {
        self.terminate(Terminator::Jump(target))
    }

    pub fn build_cond_br(
        &mut self,
        cond: Value,
        then_block: BasicBlockId,
        else_block: BasicBlockId,
    ) -> CompileResult<()> {
        self.terminate(Terminator::Branch {
            cond,
            then_block,
            else_block,
        })
    }

    pub fn build_ret(&mut self, value: Option<Value>) -> CompileResult<()> {
        self.terminate(Terminator::Return(value))
    }

    /// Stack slot in the entry block of the current function, whatever block is current
    pub fn build_entry_alloca(&mut self, ty: IrType, name: &str) -> CompileResult<Value> {
        let func = self.current_function_mut()?;
        let dest = func.alloc_register(IrType::ptr_to(ty.clone()));
        let fn_name = func.name.clone();
        func.entry_mut()
            .ok_or_else(|| CompileError::internal(format!("{} has no entry block", fn_name)))?
            .add_alloca(IrInstr::Alloca {
                dest: dest.clone(),
                ty,
                name: name.to_string(),
            });
        Ok(dest.into())
    }

    /// Value of parameter `index` of the current function
    pub fn param(&self, index: usize) -> CompileResult<Value> {
        let id = self.current_function()?;
        self.module
            .get_function(id)
            .and_then(|f| f.params.get(index))
            .map(|reg| Value::Register(reg.clone()))
            .ok_or_else(|| CompileError::internal(format!("no parameter {}", index)))
    }

    // ===== Module-level entities =====

    /// NUL-terminated private string global; returns an `i8*` to its first byte
    pub fn global_string_ptr(&mut self, text: &str) -> Value {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        let name = format!(".str.{}", self.string_count);
        self.string_count += 1;
        let id = self.module.add_global(IrGlobal {
            name,
            ty: IrType::Array(bytes.len() as u64, Box::new(IrType::I8)),
            init: Initializer::Bytes(bytes),
            constant: true,
            private: true,
            align: 1,
        });
        Value::StringPtr(id)
    }

    pub fn add_global(
        &mut self,
        name: &str,
        ty: IrType,
        init: Initializer,
        constant: bool,
    ) -> GlobalId {
        let align = self.layout.align_of(&ty, &self.module) as u32;
        self.module.add_global(IrGlobal {
            name: name.to_string(),
            ty,
            init,
            constant,
            private: false,
            align,
        })
    }

    pub fn global_value(&self, id: GlobalId) -> CompileResult<Value> {
        self.module
            .global_value(id)
            .ok_or_else(|| CompileError::internal("unknown global"))
    }

    /// Declare a function without a body
    pub fn declare_function(
        &mut self,
        name: &str,
        ty: FunctionType,
        param_names: Vec<String>,
    ) -> FunctionId {
        self.module
            .add_function(IrFunction::new(name, ty, param_names))
    }

    pub fn function_value(&self, id: FunctionId) -> CompileResult<Value> {
        self.module
            .function_value(id)
            .ok_or_else(|| CompileError::internal(format!("unknown function {}", id)))
    }

    pub fn function_type(&self, id: FunctionId) -> CompileResult<FunctionType> {
        self.module
            .get_function(id)
            .map(|f| f.ty.clone())
            .ok_or_else(|| CompileError::internal(format!("unknown function {}", id)))
    }

    /// Allocation size of a type in bytes
    pub fn size_of(&self, ty: &IrType) -> u64 {
        self.layout.size_of(ty, &self.module)
    }

    /// Printable name of a type, e.g. `%Point*`
    pub fn type_name(&self, ty: &IrType) -> String {
        self.module.type_name(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_in_main() -> IrBuilder {
        let mut builder = IrBuilder::new("test", "x86_64-pc-linux-gnu");
        let main = builder.declare_function("main", FunctionType::new(IrType::I32, vec![]), vec![]);
        let entry = builder.append_block_to(main, "entry").expect("block");
        builder.set_insert_point(Some(InsertPoint {
            function: main,
            block: entry,
        }));
        builder
    }

    #[test]
    fn test_no_insert_point_is_internal_error() {
        let mut builder = IrBuilder::new("test", "x86_64-pc-linux-gnu");
        let err = builder
            .build_binary(BinaryOp::Add, Value::const_i32(1), Value::const_i32(2))
            .unwrap_err();
        assert!(matches!(err, CompileError::Internal { .. }));
    }

    #[test]
    fn test_entry_alloca_hoisted_from_later_block() {
        let mut builder = builder_in_main();
        let body = builder.append_block("body").expect("block");
        builder.build_br(body).expect("br");
        builder.switch_to_block(body).expect("switch");

        let slot = builder.build_entry_alloca(IrType::I32, "x").expect("alloca");
        assert_eq!(slot.ty(), IrType::ptr_to(IrType::I32));

        let main = builder.module().get_function_by_name("main").expect("main");
        assert!(main.entry().expect("entry").instructions[0].is_alloca());
        assert!(main.get_block(body).expect("body").is_empty());
    }

    #[test]
    fn test_load_takes_pointee_type() {
        let mut builder = builder_in_main();
        let slot = builder.build_entry_alloca(IrType::I1, "flag").expect("alloca");
        let loaded = builder.build_load(slot).expect("load");
        assert_eq!(loaded.ty(), IrType::I1);
        assert!(builder.build_load(Value::const_i32(0)).is_err());
    }

    #[test]
    fn test_string_globals_are_numbered() {
        let mut builder = IrBuilder::new("test", "x86_64-pc-linux-gnu");
        let a = builder.global_string_ptr("a");
        let b = builder.global_string_ptr("bc");
        assert_eq!(a.ty(), IrType::i8_ptr());
        assert_ne!(a, b);
        let global = builder.module().get_global_by_name(".str.1").expect("global");
        assert_eq!(global.init, Initializer::Bytes(vec![b'b', b'c', 0]));
    }
}
