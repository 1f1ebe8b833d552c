//! IR Module
//!
//! Top-level container for a compiled program: named struct types, globals
//! and functions.

use super::function::IrFunction;
use super::types::{IrType, StructId, StructType};
use super::value::{FunctionId, GlobalId, Value};
use rustc_hash::FxHashMap;

/// Initial contents of a global
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Int(i64),
    /// Raw bytes of an `[N x i8]` array (including any trailing NUL)
    Bytes(Vec<u8>),
    /// Constant aggregate; one constant value per struct field
    Struct(Vec<Value>),
    Zero,
}

#[derive(Debug, Clone)]
pub struct IrGlobal {
    pub name: String,
    /// Type of the stored value (the global itself is a pointer to it)
    pub ty: IrType,
    pub init: Initializer,
    pub constant: bool,
    /// Internal helper data such as string literals
    pub private: bool,
    pub align: u32,
}

/// An IR module (compilation unit)
#[derive(Debug, Clone)]
pub struct IrModule {
    pub name: String,
    pub target_triple: String,
    pub structs: Vec<StructType>,
    pub globals: Vec<IrGlobal>,
    pub functions: Vec<IrFunction>,
    struct_map: FxHashMap<String, StructId>,
    global_map: FxHashMap<String, GlobalId>,
    function_map: FxHashMap<String, FunctionId>,
}

impl IrModule {
    pub fn new(name: impl Into<String>, target_triple: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_triple: target_triple.into(),
            structs: Vec::new(),
            globals: Vec::new(),
            functions: Vec::new(),
            struct_map: FxHashMap::default(),
            global_map: FxHashMap::default(),
            function_map: FxHashMap::default(),
        }
    }

    /// Add an opaque named struct
    pub fn add_struct(&mut self, name: impl Into<String>) -> StructId {
        let name = name.into();
        let id = StructId(self.structs.len() as u32);
        self.struct_map.insert(name.clone(), id);
        self.structs.push(StructType::opaque(name));
        id
    }

    pub fn set_struct_body(&mut self, id: StructId, body: Vec<IrType>) {
        if let Some(st) = self.structs.get_mut(id.0 as usize) {
            st.body = Some(body);
        }
    }

    pub fn get_struct(&self, id: StructId) -> Option<&StructType> {
        self.structs.get(id.0 as usize)
    }

    pub fn struct_id(&self, name: &str) -> Option<StructId> {
        self.struct_map.get(name).copied()
    }

    pub fn struct_name(&self, id: StructId) -> &str {
        self.get_struct(id).map(|s| s.name.as_str()).unwrap_or("<unknown>")
    }

    pub fn add_global(&mut self, global: IrGlobal) -> GlobalId {
        let id = GlobalId(self.globals.len() as u32);
        self.global_map.insert(global.name.clone(), id);
        self.globals.push(global);
        id
    }

    pub fn get_global(&self, id: GlobalId) -> Option<&IrGlobal> {
        self.globals.get(id.0 as usize)
    }

    pub fn global_id(&self, name: &str) -> Option<GlobalId> {
        self.global_map.get(name).copied()
    }

    pub fn get_global_by_name(&self, name: &str) -> Option<&IrGlobal> {
        self.global_id(name).and_then(|id| self.get_global(id))
    }

    /// Address of a global as a value
    pub fn global_value(&self, id: GlobalId) -> Option<Value> {
        self.get_global(id).map(|g| Value::Global {
            id,
            ty: IrType::ptr_to(g.ty.clone()),
        })
    }

    pub fn add_function(&mut self, func: IrFunction) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.function_map.insert(func.name.clone(), id);
        self.functions.push(func);
        id
    }

    pub fn get_function(&self, id: FunctionId) -> Option<&IrFunction> {
        self.functions.get(id.0 as usize)
    }

    pub fn get_function_mut(&mut self, id: FunctionId) -> Option<&mut IrFunction> {
        self.functions.get_mut(id.0 as usize)
    }

    pub fn get_function_by_name(&self, name: &str) -> Option<&IrFunction> {
        self.function_map
            .get(name)
            .and_then(|&id| self.get_function(id))
    }

    pub fn get_function_id(&self, name: &str) -> Option<FunctionId> {
        self.function_map.get(name).copied()
    }

    /// Address of a function as a value
    pub fn function_value(&self, id: FunctionId) -> Option<Value> {
        self.get_function(id).map(|f| Value::Function {
            id,
            ty: f.ty.ptr_type(),
        })
    }

    /// Validate every defined function and every struct/global reference
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for func in self.functions.iter().filter(|f| !f.is_declaration()) {
            if let Err(e) = func.validate() {
                errors.push(e);
            }
        }

        for st in &self.structs {
            if st.is_opaque() {
                errors.push(format!("Struct {} has no body", st.name));
            }
        }

        for global in &self.globals {
            if let Initializer::Struct(fields) = &global.init {
                for field in fields {
                    if let Value::Function { id, .. } = field {
                        if self.get_function(*id).is_none() {
                            errors.push(format!(
                                "Global {} references unknown function {}",
                                global.name, id
                            ));
                        }
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn total_instruction_count(&self) -> usize {
        self.functions.iter().map(|f| f.instruction_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::block::Terminator;
    use crate::compiler::ir::types::FunctionType;

    #[test]
    fn test_module_new() {
        let module = IrModule::new("test", "x86_64-pc-linux-gnu");
        assert_eq!(module.name, "test");
        assert!(module.functions.is_empty());
        assert!(module.validate().is_ok());
    }

    #[test]
    fn test_module_function_lookup() {
        let mut module = IrModule::new("test", "x86_64-pc-linux-gnu");
        let sig = FunctionType::variadic(IrType::I32, vec![IrType::i8_ptr()]);
        let id = module.add_function(IrFunction::new("printf", sig.clone(), vec![]));

        assert_eq!(module.get_function_id("printf"), Some(id));
        assert!(module.get_function_by_name("printf").is_some());
        assert_eq!(
            module.function_value(id),
            Some(Value::Function {
                id,
                ty: sig.ptr_type()
            })
        );
    }

    #[test]
    fn test_module_struct_body() {
        let mut module = IrModule::new("test", "x86_64-pc-linux-gnu");
        let id = module.add_struct("Point");
        assert_eq!(module.validate().unwrap_err().len(), 1);

        module.set_struct_body(id, vec![IrType::I32, IrType::I32]);
        assert_eq!(module.struct_id("Point"), Some(id));
        assert_eq!(module.get_struct(id).and_then(|s| s.field(1)), Some(&IrType::I32));
        assert!(module.validate().is_ok());
    }

    #[test]
    fn test_module_validate_reports_unterminated_block() {
        let mut module = IrModule::new("test", "x86_64-pc-linux-gnu");
        let mut func = IrFunction::new("main", FunctionType::new(IrType::I32, vec![]), vec![]);
        let entry = func.append_block("entry");
        module.add_function(func.clone());
        assert!(module.validate().is_err());

        if let Some(block) = func.get_block_mut(entry) {
            block.set_terminator(Terminator::Return(Some(Value::const_i32(0))));
        }
        let mut fixed = IrModule::new("test", "x86_64-pc-linux-gnu");
        fixed.add_function(func);
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn test_global_value_is_pointer() {
        let mut module = IrModule::new("test", "x86_64-pc-linux-gnu");
        let id = module.add_global(IrGlobal {
            name: "VERSION".to_string(),
            ty: IrType::I32,
            init: Initializer::Int(42),
            constant: false,
            private: false,
            align: 4,
        });
        assert_eq!(
            module.global_value(id).map(|v| v.ty()),
            Some(IrType::ptr_to(IrType::I32))
        );
    }

    #[test]
    fn test_module_validate_reports_register_from_other_function() {
        let mut module = IrModule::new("test", "x86_64-pc-linux-gnu");
        let sig = FunctionType::new(IrType::I32, vec![]);

        let mut main = IrFunction::new("main", sig.clone(), vec![]);
        let entry = main.append_block("entry");
        let owned = main.alloc_register(IrType::I32);
        if let Some(block) = main.get_block_mut(entry) {
            block.add_instr(crate::compiler::ir::instr::IrInstr::Binary {
                dest: owned.clone(),
                op: crate::compiler::ir::instr::BinaryOp::Add,
                left: Value::const_i32(1),
                right: Value::const_i32(2),
            });
            block.set_terminator(Terminator::Return(Some(Value::Register(owned.clone()))));
        }
        module.add_function(main);

        let mut getter = IrFunction::new("get", sig, vec![]);
        let entry = getter.append_block("entry");
        if let Some(block) = getter.get_block_mut(entry) {
            block.set_terminator(Terminator::Return(Some(Value::Register(owned))));
        }
        module.add_function(getter);

        let errors = module.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("of get reads undefined register"), "{}", errors[0]);
    }
}
