//! Textual form of an IR module
//!
//! The output reads like classic typed-pointer LLVM assembly: named struct
//! types, globals, declarations, then function definitions with `bbN` blocks
//! and `%rN` registers.

use super::block::{BasicBlock, Terminator};
use super::function::IrFunction;
use super::instr::IrInstr;
use super::module::{Initializer, IrGlobal, IrModule};
use super::types::IrType;
use super::value::Value;
use std::fmt::{self, Write};

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for IrModule {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail.
        let _ = write_module(&mut output, self);
        output
    }
}

impl IrModule {
    pub fn type_name(&self, ty: &IrType) -> String {
        let mut out = String::new();
        let _ = write_type(&mut out, self, ty);
        out
    }

    /// Render a single function
    pub fn function_to_string(&self, func: &IrFunction) -> String {
        let mut out = String::new();
        let _ = write_function(&mut out, self, func);
        out
    }
}

fn write_type(out: &mut impl Write, m: &IrModule, ty: &IrType) -> fmt::Result {
    match ty {
        IrType::Void => write!(out, "void"),
        IrType::I1 => write!(out, "i1"),
        IrType::I8 => write!(out, "i8"),
        IrType::I32 => write!(out, "i32"),
        IrType::I64 => write!(out, "i64"),
        IrType::Ptr(inner) => {
            write_type(out, m, inner)?;
            write!(out, "*")
        }
        IrType::Array(len, elem) => {
            write!(out, "[{} x ", len)?;
            write_type(out, m, elem)?;
            write!(out, "]")
        }
        IrType::Struct(id) => write!(out, "%{}", m.struct_name(*id)),
        IrType::Function(fn_ty) => {
            write_type(out, m, &fn_ty.ret)?;
            write!(out, " (")?;
            for (i, param) in fn_ty.params.iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                write_type(out, m, param)?;
            }
            if fn_ty.variadic {
                if !fn_ty.params.is_empty() {
                    write!(out, ", ")?;
                }
                write!(out, "...")?;
            }
            write!(out, ")")
        }
    }
}

fn write_value(out: &mut impl Write, m: &IrModule, value: &Value) -> fmt::Result {
    match value {
        Value::Register(reg) => write!(out, "{}", reg.id),
        Value::ConstInt { ty: IrType::I1, value } => {
            write!(out, "{}", if *value != 0 { "true" } else { "false" })
        }
        Value::ConstInt { value, .. } => write!(out, "{}", value),
        Value::Null(_) => write!(out, "null"),
        Value::Global { id, .. } => match m.get_global(*id) {
            Some(g) => write!(out, "@{}", g.name),
            None => write!(out, "@<global {}>", id.0),
        },
        Value::Function { id, .. } => match m.get_function(*id) {
            Some(f) => write!(out, "@{}", f.name),
            None => write!(out, "@<{}>", id),
        },
        Value::StringPtr(id) => {
            let (name, array) = match m.get_global(*id) {
                Some(g) => (g.name.clone(), m.type_name(&g.ty)),
                None => (format!("<global {}>", id.0), "[0 x i8]".to_string()),
            };
            write!(
                out,
                "getelementptr inbounds ({}, {}* @{}, i64 0, i64 0)",
                array, array, name
            )
        }
    }
}

/// `<type> <value>`
fn write_operand(out: &mut impl Write, m: &IrModule, value: &Value) -> fmt::Result {
    write_type(out, m, &value.ty())?;
    write!(out, " ")?;
    write_value(out, m, value)
}

fn escape_bytes(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len());
    for &b in bytes {
        if (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\' {
            s.push(b as char);
        } else {
            s.push_str(&format!("\\{:02X}", b));
        }
    }
    s
}

fn write_global(out: &mut impl Write, m: &IrModule, g: &IrGlobal) -> fmt::Result {
    write!(out, "@{} = ", g.name)?;
    if g.private {
        write!(out, "private unnamed_addr ")?;
    }
    write!(out, "{} ", if g.constant { "constant" } else { "global" })?;
    write_type(out, m, &g.ty)?;
    write!(out, " ")?;
    match &g.init {
        Initializer::Int(v) => write!(out, "{}", v)?,
        Initializer::Bytes(bytes) => write!(out, "c\"{}\"", escape_bytes(bytes))?,
        Initializer::Struct(fields) => {
            write!(out, "{{ ")?;
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                write_operand(out, m, field)?;
            }
            write!(out, " }}")?;
        }
        Initializer::Zero => write!(out, "zeroinitializer")?,
    }
    writeln!(out, ", align {}", g.align)
}

fn write_instr(out: &mut impl Write, m: &IrModule, instr: &IrInstr) -> fmt::Result {
    if let Some(dest) = instr.dest() {
        write!(out, "{} = ", dest.id)?;
    }
    match instr {
        IrInstr::Binary {
            op, left, right, ..
        } => {
            write!(out, "{} ", op.mnemonic())?;
            write_operand(out, m, left)?;
            write!(out, ", ")?;
            write_value(out, m, right)
        }
        IrInstr::ICmp {
            op, left, right, ..
        } => {
            write!(out, "icmp {} ", op.mnemonic())?;
            write_operand(out, m, left)?;
            write!(out, ", ")?;
            write_value(out, m, right)
        }
        IrInstr::Alloca { ty, name, .. } => {
            write!(out, "alloca ")?;
            write_type(out, m, ty)?;
            write!(out, " ; {}", name)
        }
        IrInstr::Load { dest, ptr } => {
            write!(out, "load ")?;
            write_type(out, m, &dest.ty)?;
            write!(out, ", ")?;
            write_operand(out, m, ptr)
        }
        IrInstr::Store { value, ptr } => {
            write!(out, "store ")?;
            write_operand(out, m, value)?;
            write!(out, ", ")?;
            write_operand(out, m, ptr)
        }
        IrInstr::StructGep {
            struct_id,
            base,
            index,
            ..
        } => {
            write!(out, "getelementptr inbounds ")?;
            write_type(out, m, &IrType::Struct(*struct_id))?;
            write!(out, ", ")?;
            write_operand(out, m, base)?;
            write!(out, ", i32 0, i32 {}", index)
        }
        IrInstr::Call {
            callee,
            fn_ty,
            args,
            ..
        } => {
            write!(out, "call ")?;
            if fn_ty.variadic {
                write_type(out, m, &IrType::Function(Box::new(fn_ty.clone())))?;
            } else {
                write_type(out, m, &fn_ty.ret)?;
            }
            write!(out, " ")?;
            write_value(out, m, callee)?;
            write!(out, "(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                write_operand(out, m, arg)?;
            }
            write!(out, ")")
        }
        IrInstr::Cast { dest, op, value } => {
            write!(out, "{} ", op.mnemonic())?;
            write_operand(out, m, value)?;
            write!(out, " to ")?;
            write_type(out, m, &dest.ty)
        }
        IrInstr::Phi { dest, incoming } => {
            write!(out, "phi ")?;
            write_type(out, m, &dest.ty)?;
            for (i, (value, block)) in incoming.iter().enumerate() {
                write!(out, "{} [ ", if i > 0 { "," } else { "" })?;
                write_value(out, m, value)?;
                write!(out, ", %{} ]", block)?;
            }
            Ok(())
        }
    }
}

fn write_terminator(out: &mut impl Write, m: &IrModule, term: &Terminator) -> fmt::Result {
    match term {
        Terminator::Jump(target) => write!(out, "br label %{}", target),
        Terminator::Branch {
            cond,
            then_block,
            else_block,
        } => {
            write!(out, "br ")?;
            write_operand(out, m, cond)?;
            write!(out, ", label %{}, label %{}", then_block, else_block)
        }
        Terminator::Return(Some(value)) => {
            write!(out, "ret ")?;
            write_operand(out, m, value)
        }
        Terminator::Return(None) => write!(out, "ret void"),
        Terminator::Unreachable => write!(out, "unreachable"),
    }
}

fn write_block(out: &mut impl Write, m: &IrModule, block: &BasicBlock) -> fmt::Result {
    match &block.label {
        Some(label) => writeln!(out, "{}: ; {}", block.id, label)?,
        None => writeln!(out, "{}:", block.id)?,
    }
    for instr in &block.instructions {
        write!(out, "  ")?;
        write_instr(out, m, instr)?;
        writeln!(out)?;
    }
    write!(out, "  ")?;
    write_terminator(out, m, &block.terminator)?;
    writeln!(out)
}

fn write_function(out: &mut impl Write, m: &IrModule, func: &IrFunction) -> fmt::Result {
    let keyword = if func.is_declaration() { "declare" } else { "define" };
    write!(out, "{} ", keyword)?;
    write_type(out, m, &func.ty.ret)?;
    write!(out, " @{}(", func.name)?;
    for (i, param) in func.params.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        write_type(out, m, &param.ty)?;
        if !func.is_declaration() {
            write!(out, " {}", param.id)?;
        }
    }
    if func.ty.variadic {
        write!(out, "{}...", if func.params.is_empty() { "" } else { ", " })?;
    }
    write!(out, ")")?;

    if func.is_declaration() {
        return writeln!(out);
    }

    writeln!(out, " {{")?;
    for block in &func.blocks {
        write_block(out, m, block)?;
    }
    writeln!(out, "}}")
}

fn write_module(out: &mut impl Write, m: &IrModule) -> fmt::Result {
    writeln!(out, "; ModuleID = '{}'", m.name)?;
    writeln!(out, "source_filename = \"{}\"", m.name)?;
    writeln!(out, "target triple = \"{}\"", m.target_triple)?;

    if !m.structs.is_empty() {
        writeln!(out)?;
    }
    for st in &m.structs {
        write!(out, "%{} = type ", st.name)?;
        match &st.body {
            Some(fields) => {
                write!(out, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(out, ", ")?;
                    }
                    write_type(out, m, field)?;
                }
                writeln!(out, "{}}}", if fields.is_empty() { "" } else { " " })?;
            }
            None => writeln!(out, "opaque")?,
        }
    }

    if !m.globals.is_empty() {
        writeln!(out)?;
    }
    for global in &m.globals {
        write_global(out, m, global)?;
    }

    for func in &m.functions {
        writeln!(out)?;
        write_function(out, m, func)?;
    }

    Ok(())
}
