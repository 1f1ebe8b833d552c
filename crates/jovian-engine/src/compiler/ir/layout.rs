//! Target data layout
//!
//! Sizes, alignments and struct field offsets for x86-64: pointers are 8
//! bytes, fields sit at their natural alignment and a struct's size is rounded
//! up to its own alignment.

use super::module::IrModule;
use super::types::{IrType, StructId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub offsets: Vec<u64>,
    pub size: u64,
    pub align: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct DataLayout {
    pointer_size: u64,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::x86_64()
    }
}

fn align_to(offset: u64, align: u64) -> u64 {
    offset.div_ceil(align) * align
}

impl DataLayout {
    pub fn x86_64() -> Self {
        Self { pointer_size: 8 }
    }

    pub fn pointer_size(&self) -> u64 {
        self.pointer_size
    }

    /// Allocation size in bytes
    pub fn size_of(&self, ty: &IrType, module: &IrModule) -> u64 {
        match ty {
            IrType::Void | IrType::Function(_) => 0,
            IrType::I1 | IrType::I8 => 1,
            IrType::I32 => 4,
            IrType::I64 => 8,
            IrType::Ptr(_) => self.pointer_size,
            IrType::Array(len, elem) => len * self.size_of(elem, module),
            IrType::Struct(id) => self.struct_layout(*id, module).size,
        }
    }

    pub fn align_of(&self, ty: &IrType, module: &IrModule) -> u64 {
        match ty {
            IrType::Void | IrType::Function(_) | IrType::I1 | IrType::I8 => 1,
            IrType::I32 => 4,
            IrType::I64 => 8,
            IrType::Ptr(_) => self.pointer_size,
            IrType::Array(_, elem) => self.align_of(elem, module),
            IrType::Struct(id) => self.struct_layout(*id, module).align,
        }
    }

    /// Field offsets of a struct; an opaque struct lays out as empty
    pub fn struct_layout(&self, id: StructId, module: &IrModule) -> StructLayout {
        let fields = module
            .get_struct(id)
            .and_then(|s| s.body.as_deref())
            .unwrap_or(&[]);

        let mut offsets = Vec::with_capacity(fields.len());
        let mut offset = 0;
        let mut align = 1;
        for field in fields {
            let field_align = self.align_of(field, module);
            offset = align_to(offset, field_align);
            offsets.push(offset);
            offset += self.size_of(field, module);
            align = align.max(field_align);
        }

        StructLayout {
            offsets,
            size: align_to(offset, align),
            align,
        }
    }
}
