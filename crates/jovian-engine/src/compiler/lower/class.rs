//! `class` declarations
//!
//! open -> collect members -> finalize layout and vtable -> generate method
//! bodies -> close.

use super::{expect_arity, expect_symbol, Compiler};
use crate::compiler::class_layout::{mangle, vtable_name, VTable};
use crate::compiler::env::Environment;
use crate::compiler::error::{CompileError, CompileResult};
use crate::compiler::ir::{Initializer, IrType, Value};
use crate::parser::Expression;
use rustc_hash::FxHashSet;

impl Compiler {
    /// `(class Name Parent (begin ...))`; `Parent` is `null` for a root class
    pub(super) fn gen_class(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        expect_arity(items, 4, "class")?;
        let name = expect_symbol(&items[1], "class", "class")?.to_string();
        let parent = match expect_symbol(&items[2], "class", "parent class")? {
            "null" => None,
            parent => Some(parent.to_string()),
        };
        let body = &items[3];
        let Some(members) = body.as_list().filter(|_| body.is_tagged("begin")) else {
            return Err(CompileError::malformed(
                "class",
                format!("body of class {} must be a `(begin ...)` block", name),
            ));
        };

        if self.builder.module().struct_id(&name).is_some() {
            return Err(CompileError::DuplicateDefinition {
                name: format!("class {}", name),
            });
        }
        let struct_id = self.builder.module_mut().add_struct(&name);
        self.classes.open(&name, struct_id, parent.as_deref())?;

        let saved_class = self.current_class.replace(name.clone());
        let saved_in_class_body = self.in_class_body;

        self.collect_members(&name, &members[1..])?;
        self.finalize_layout(&name)?;

        self.in_class_body = true;
        self.gen_expr(body, env)?;

        self.in_class_body = saved_in_class_body;
        self.current_class = saved_class;
        Ok(self.builder.const_i32(0))
    }

    /// Record fields and declare method prototypes without generating any code
    fn collect_members(&mut self, class: &str, members: &[Expression]) -> CompileResult<()> {
        let mut own_methods = FxHashSet::default();

        for member in members {
            let Some(parts) = member.as_list() else {
                continue;
            };
            match member.head() {
                Some("var") => {
                    if parts.len() != 3 {
                        return Err(CompileError::malformed(
                            "var",
                            format!("field declaration in class {} needs a name and an initializer", class),
                        ));
                    }
                    let (field, ty) = self.typed_name(&parts[1], "var")?;
                    let ty = ty.unwrap_or(IrType::I32);
                    if let Some(info) = self.classes.get_mut(class) {
                        info.fields.insert(field, ty);
                    }
                }
                Some("def") => {
                    let (sig, _) = self.signature(parts)?;
                    if !own_methods.insert(sig.name.clone()) {
                        return Err(CompileError::DuplicateDefinition {
                            name: format!("method {}.{}", class, sig.name),
                        });
                    }
                    let mangled = mangle(class, &sig.name);
                    if self.builder.module().get_function_id(&mangled).is_some() {
                        return Err(CompileError::DuplicateDefinition {
                            name: format!("function {}", mangled),
                        });
                    }
                    let func = self.builder.declare_function(
                        &mangled,
                        sig.function_type(),
                        sig.param_names(),
                    );
                    // an override replaces the inherited entry and keeps its slot
                    if let Some(info) = self.classes.get_mut(class) {
                        info.methods.insert(sig.name, func);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Set the instance struct body, build the vtable type and publish the vtable global
    fn finalize_layout(&mut self, class: &str) -> CompileResult<()> {
        let vtable = vtable_name(class);
        if self.builder.module().struct_id(&vtable).is_some() {
            return Err(CompileError::DuplicateDefinition {
                name: format!("type {}", vtable),
            });
        }

        let info = self.classes.lookup(class)?.clone();
        let vtable_struct = self.builder.module_mut().add_struct(&vtable);
        self.builder
            .module_mut()
            .set_struct_body(info.struct_id, info.struct_body(vtable_struct));

        let entries = info
            .methods
            .values()
            .map(|func| self.builder.function_value(*func))
            .collect::<CompileResult<Vec<_>>>()?;
        let slot_types = entries.iter().map(Value::ty).collect();
        self.builder
            .module_mut()
            .set_struct_body(vtable_struct, slot_types);

        let global = self.builder.add_global(
            &vtable,
            IrType::Struct(vtable_struct),
            Initializer::Struct(entries),
            true,
        );

        log::debug!(
            "class {}: fields [{}], vtable [{}]",
            class,
            info.fields.keys().cloned().collect::<Vec<_>>().join(", "),
            info.methods.keys().cloned().collect::<Vec<_>>().join(", ")
        );

        if let Some(info) = self.classes.get_mut(class) {
            info.vtable = Some(VTable {
                struct_id: vtable_struct,
                global,
            });
        }
        Ok(())
    }
}
