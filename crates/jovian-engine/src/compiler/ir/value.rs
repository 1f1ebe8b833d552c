//! IR Values
//!
//! Every expression lowers to a `Value`: a virtual register or a constant.

use super::types::IrType;
use std::fmt;

/// Virtual register identifier, unique within one function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterId(pub u32);

impl RegisterId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%r{}", self.0)
    }
}

/// A typed virtual register
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Register {
    pub id: RegisterId,
    pub ty: IrType,
}

impl Register {
    pub fn new(id: RegisterId, ty: IrType) -> Self {
        Self { id, ty }
    }
}

/// Global variable identifier (index into the module's globals)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(pub u32);

/// Function identifier (index into the module's functions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// An IR value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Register(Register),
    /// Integer constant of an integer type
    ConstInt { ty: IrType, value: i64 },
    /// Null pointer of the given pointer type
    Null(IrType),
    /// Address of a global; `ty` is the pointer type
    Global { id: GlobalId, ty: IrType },
    /// Address of a function; `ty` is the function pointer type
    Function { id: FunctionId, ty: IrType },
    /// `i8*` to the first byte of a string global
    StringPtr(GlobalId),
}

impl Value {
    pub fn const_i32(value: i32) -> Self {
        Value::ConstInt {
            ty: IrType::I32,
            value: value as i64,
        }
    }

    pub fn const_bool(value: bool) -> Self {
        Value::ConstInt {
            ty: IrType::I1,
            value: value as i64,
        }
    }

    pub fn ty(&self) -> IrType {
        match self {
            Value::Register(reg) => reg.ty.clone(),
            Value::ConstInt { ty, .. } | Value::Null(ty) => ty.clone(),
            Value::Global { ty, .. } | Value::Function { ty, .. } => ty.clone(),
            Value::StringPtr(_) => IrType::i8_ptr(),
        }
    }

    pub fn as_const_int(&self) -> Option<i64> {
        match self {
            Value::ConstInt { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<FunctionId> {
        match self {
            Value::Function { id, .. } => Some(*id),
            _ => None,
        }
    }
}

impl From<Register> for Value {
    fn from(reg: Register) -> Self {
        Value::Register(reg)
    }
}
