//! Instances, field access and method dispatch

use super::{expect_arity, expect_symbol, Compiler};
use crate::compiler::class_layout::{ClassInfo, CONSTRUCTOR, VTABLE_SLOT};
use crate::compiler::env::Environment;
use crate::compiler::error::{CompileError, CompileResult};
use crate::compiler::ir::{CastOp, IrType, Value};
use crate::parser::Expression;

/// How a `method` expression finds its vtable
#[derive(Debug, Clone)]
pub(super) enum Dispatch {
    /// `(super Class)`: the parent's published vtable global, never the runtime one
    Static { class: String },
    /// Any other receiver: the vtable pointer stored in the instance
    Dynamic { class: String, instance: Value },
}

impl Dispatch {
    fn class(&self) -> &str {
        match self {
            Dispatch::Static { class } | Dispatch::Dynamic { class, .. } => class,
        }
    }
}

impl Compiler {
    /// The class of an instance pointer value
    fn instance_class(&self, value: &Value, context: &str) -> CompileResult<&ClassInfo> {
        let ty = value.ty();
        self.classes.class_of_type(&ty).ok_or_else(|| CompileError::TypeMismatch {
            context: context.to_string(),
            expected: "class instance".to_string(),
            found: self.type_name(&ty),
        })
    }

    /// `(new Class args...)`: allocate, install the vtable, run the constructor
    pub(super) fn gen_new(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        if items.len() < 2 {
            return Err(CompileError::malformed("new", "missing class name"));
        }
        let name = expect_symbol(&items[1], "new", "class")?;

        let class = self.classes.lookup(name)?;
        let struct_id = class.struct_id;
        let instance_ty = class.instance_type();
        let constructor = class.method(CONSTRUCTOR);
        let vtable = class.vtable.ok_or_else(|| {
            CompileError::internal(format!("class {} has no vtable yet", name))
        })?;

        let size = self.builder.size_of(&IrType::Struct(struct_id));
        let size = self.builder.const_int(IrType::I64, size as i64);
        let raw = self.call_function(self.malloc, vec![size], "new")?;
        let instance = self.builder.build_cast(CastOp::BitCast, raw, instance_ty)?;

        let vtable_slot = self.builder.build_struct_gep(instance.clone(), VTABLE_SLOT)?;
        let vtable_ptr = self.builder.global_value(vtable.global)?;
        self.builder.build_store(vtable_ptr, vtable_slot)?;

        let mut args = vec![instance.clone()];
        for item in &items[2..] {
            args.push(self.gen_expr(item, env)?);
        }

        match constructor {
            Some(ctor) => {
                self.call_function(ctor, args, &format!("new {}", name))?;
            }
            None if args.len() == 1 => {}
            None => {
                return Err(CompileError::UnknownMember {
                    class: name.to_string(),
                    member: CONSTRUCTOR.to_string(),
                })
            }
        }

        Ok(instance)
    }

    /// Address of `field` inside the instance
    pub(super) fn field_address(&mut self, instance: Value, field: &str) -> CompileResult<Value> {
        let class = self.instance_class(&instance, "prop")?;
        let slot = class
            .field_slot(field)
            .ok_or_else(|| class.unknown_member(field))?;
        self.builder.build_struct_gep(instance, slot)
    }

    /// `(prop instance field)`
    pub(super) fn gen_prop(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        expect_arity(items, 3, "prop")?;
        let instance = self.gen_expr(&items[1], env)?;
        let field = expect_symbol(&items[2], "prop", "field")?;
        let address = self.field_address(instance, field)?;
        self.builder.build_load(address)
    }

    fn dispatch(&mut self, receiver: &Expression, env: &mut Environment<'_>) -> CompileResult<Dispatch> {
        if receiver.is_tagged("super") {
            let parts = receiver.as_list().unwrap_or(&[]);
            expect_arity(parts, 2, "super")?;
            let name = expect_symbol(&parts[1], "super", "class")?;
            let parent = self
                .classes
                .lookup(name)?
                .parent
                .clone()
                .ok_or_else(|| {
                    CompileError::malformed("super", format!("class {} has no parent", name))
                })?;
            return Ok(Dispatch::Static { class: parent });
        }

        let instance = self.gen_expr(receiver, env)?;
        let class = self.instance_class(&instance, "method")?.name.clone();
        Ok(Dispatch::Dynamic { class, instance })
    }

    /// `(method receiver name)`: load the method's function pointer from a vtable
    pub(super) fn gen_method(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        expect_arity(items, 3, "method")?;
        let method = expect_symbol(&items[2], "method", "method")?;
        let dispatch = self.dispatch(&items[1], env)?;

        let class = self.classes.lookup(dispatch.class())?;
        let slot = class
            .method_slot(method)
            .ok_or_else(|| class.unknown_member(method))?;
        let published = class.vtable;

        let vtable = match dispatch {
            Dispatch::Static { class } => {
                let vtable = published.ok_or_else(|| {
                    CompileError::internal(format!("class {} has no vtable yet", class))
                })?;
                self.builder.global_value(vtable.global)?
            }
            Dispatch::Dynamic { instance, .. } => {
                let address = self.builder.build_struct_gep(instance, VTABLE_SLOT)?;
                self.builder.build_load(address)?
            }
        };

        let entry = self.builder.build_struct_gep(vtable, slot)?;
        self.builder.build_load(entry)
    }
}
