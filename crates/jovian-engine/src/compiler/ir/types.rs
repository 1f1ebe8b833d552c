//! IR Types
//!
//! Typed-pointer types in the style of a classic SSA backend. Named struct
//! types live in the module and are referenced here by `StructId`.

/// Named struct type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub u32);

impl StructId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// An IR type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Void,
    I1,
    I8,
    I32,
    I64,
    Ptr(Box<IrType>),
    Array(u64, Box<IrType>),
    Struct(StructId),
    Function(Box<FunctionType>),
}

impl IrType {
    pub fn ptr_to(pointee: IrType) -> Self {
        IrType::Ptr(Box::new(pointee))
    }

    /// `i8*`, the type of C strings and of raw `malloc` results
    pub fn i8_ptr() -> Self {
        IrType::ptr_to(IrType::I8)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, IrType::I1 | IrType::I8 | IrType::I32 | IrType::I64)
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, IrType::Ptr(_))
    }

    /// Width in bits of an integer type
    pub fn int_bits(&self) -> Option<u32> {
        match self {
            IrType::I1 => Some(1),
            IrType::I8 => Some(8),
            IrType::I32 => Some(32),
            IrType::I64 => Some(64),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    /// The struct a pointer points at, e.g. `Point` for `%Point*`
    pub fn pointee_struct(&self) -> Option<StructId> {
        match self.pointee() {
            Some(IrType::Struct(id)) => Some(*id),
            _ => None,
        }
    }

    /// The signature behind a function pointer
    pub fn pointee_function(&self) -> Option<&FunctionType> {
        match self.pointee() {
            Some(IrType::Function(fn_ty)) => Some(fn_ty),
            _ => None,
        }
    }
}

/// A function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub ret: IrType,
    pub params: Vec<IrType>,
    pub variadic: bool,
}

impl FunctionType {
    pub fn new(ret: IrType, params: Vec<IrType>) -> Self {
        Self {
            ret,
            params,
            variadic: false,
        }
    }

    pub fn variadic(ret: IrType, params: Vec<IrType>) -> Self {
        Self {
            ret,
            params,
            variadic: true,
        }
    }

    /// Pointer-to-function type for this signature
    pub fn ptr_type(&self) -> IrType {
        IrType::ptr_to(IrType::Function(Box::new(self.clone())))
    }
}

/// A named (possibly still opaque) struct type
#[derive(Debug, Clone)]
pub struct StructType {
    pub name: String,
    /// `None` until the body is set
    pub body: Option<Vec<IrType>>,
}

impl StructType {
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.body.is_none()
    }

    pub fn field(&self, index: u32) -> Option<&IrType> {
        self.body.as_ref().and_then(|b| b.get(index as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_helpers() {
        let point = IrType::ptr_to(IrType::Struct(StructId(3)));
        assert!(point.is_ptr());
        assert_eq!(point.pointee_struct(), Some(StructId(3)));
        assert_eq!(IrType::i8_ptr().pointee(), Some(&IrType::I8));
        assert_eq!(IrType::I32.pointee(), None);
    }

    #[test]
    fn test_function_pointer_signature() {
        let sig = FunctionType::new(IrType::I32, vec![IrType::I32, IrType::I32]);
        let ptr = sig.ptr_type();
        assert_eq!(ptr.pointee_function(), Some(&sig));
        assert_eq!(IrType::I1.int_bits(), Some(1));
        assert_eq!(ptr.int_bits(), None);
    }
}
