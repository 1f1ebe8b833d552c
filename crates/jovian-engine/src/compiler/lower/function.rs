//! `def` and the function compilation protocol

use super::{expect_symbol, Compiler};
use crate::compiler::class_layout::mangle;
use crate::compiler::env::{Binding, Environment};
use crate::compiler::error::{CompileError, CompileResult};
use crate::compiler::ir::{FunctionId, FunctionType, InsertPoint, IrType, Value};
use crate::parser::Expression;

/// Name, parameters and return type of a `def`
#[derive(Debug, Clone)]
pub(super) struct Signature {
    pub name: String,
    pub params: Vec<(String, IrType)>,
    pub ret: IrType,
}

impl Signature {
    pub fn function_type(&self) -> FunctionType {
        FunctionType::new(
            self.ret.clone(),
            self.params.iter().map(|(_, ty)| ty.clone()).collect(),
        )
    }

    pub fn param_names(&self) -> Vec<String> {
        self.params.iter().map(|(name, _)| name.clone()).collect()
    }
}

impl Compiler {
    /// `number` is `i32`, `string` is `i8*`, a class name is a pointer to its instance struct
    pub(super) fn resolve_type(&self, name: &str) -> CompileResult<IrType> {
        match name {
            "number" => Ok(IrType::I32),
            "string" => Ok(IrType::i8_ptr()),
            _ => self
                .classes
                .lookup(name)
                .map(|class| class.instance_type()),
        }
    }

    fn self_type(&self) -> CompileResult<IrType> {
        match &self.current_class {
            Some(class) => self.resolve_type(class),
            None => Err(CompileError::malformed(
                "def",
                "`self` parameter outside of a class",
            )),
        }
    }

    fn param(&self, param: &Expression) -> CompileResult<(String, IrType)> {
        match param {
            Expression::Symbol(name) if name == "self" => Ok((name.clone(), self.self_type()?)),
            Expression::Symbol(name) => Ok((name.clone(), IrType::I32)),
            Expression::List(parts) if parts.len() == 2 => {
                let name = expect_symbol(&parts[0], "def", "parameter")?;
                let ty = expect_symbol(&parts[1], "def", "type")?;
                Ok((name.to_string(), self.resolve_type(ty)?))
            }
            other => Err(CompileError::malformed(
                "def",
                format!("invalid parameter `{}`", other),
            )),
        }
    }

    /// Parse `(def name (params...) body)` or `(def name (params...) -> type body)`
    pub(super) fn signature<'e>(
        &self,
        items: &'e [Expression],
    ) -> CompileResult<(Signature, &'e Expression)> {
        let (ret, body) = match items.len() {
            4 => (IrType::I32, &items[3]),
            6 if items[3].as_symbol() == Some("->") => {
                let ty = expect_symbol(&items[4], "def", "return type")?;
                (self.resolve_type(ty)?, &items[5])
            }
            _ => {
                return Err(CompileError::malformed(
                    "def",
                    "expected `(def name (params) body)` or `(def name (params) -> type body)`",
                ))
            }
        };

        let name = expect_symbol(&items[1], "def", "function")?.to_string();
        let params = items[2].as_list().ok_or_else(|| {
            CompileError::malformed("def", format!("parameter list of `{}` must be a list", name))
        })?;
        let params = params
            .iter()
            .map(|p| self.param(p))
            .collect::<CompileResult<Vec<_>>>()?;

        Ok((Signature { name, params, ret }, body))
    }

    pub(super) fn gen_def(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        let (sig, body) = self.signature(items)?;

        let method_of = if self.in_class_body {
            self.current_class.clone()
        } else {
            None
        };

        let (func, bound_name) = match method_of {
            // the prototype was declared while collecting the class members
            Some(class) => {
                let mangled = mangle(&class, &sig.name);
                let func = self
                    .builder
                    .module()
                    .get_function_id(&mangled)
                    .ok_or_else(|| CompileError::UnknownMember {
                        class: class.clone(),
                        member: sig.name.clone(),
                    })?;
                (func, mangled)
            }
            None => {
                if self.builder.module().get_function_id(&sig.name).is_some() {
                    return Err(CompileError::DuplicateDefinition {
                        name: format!("function {}", sig.name),
                    });
                }
                let func = self.builder.declare_function(
                    &sig.name,
                    sig.function_type(),
                    sig.param_names(),
                );
                (func, sig.name.clone())
            }
        };

        // bound before the body so the function can call itself
        let value = self.builder.function_value(func)?;
        env.define(bound_name, Binding::Direct(value.clone()));

        self.compile_function(func, &sig, body, env)?;
        Ok(value)
    }

    /// Generate the body of a declared function, then restore the caller's insertion point
    fn compile_function(
        &mut self,
        func: FunctionId,
        sig: &Signature,
        body: &Expression,
        env: &Environment<'_>,
    ) -> CompileResult<()> {
        let name = self
            .builder
            .module()
            .get_function(func)
            .map(|f| f.name.clone())
            .unwrap_or_default();
        if self
            .builder
            .module()
            .get_function(func)
            .is_some_and(|f| !f.is_declaration())
        {
            return Err(CompileError::DuplicateDefinition {
                name: format!("function {}", name),
            });
        }
        log::debug!("compiling function {} ({} params)", name, sig.params.len());

        let saved_point = self.builder.insert_point();
        let saved_in_class_body = std::mem::replace(&mut self.in_class_body, false);

        let entry = self.builder.append_block_to(func, "entry")?;
        self.builder.set_insert_point(Some(InsertPoint {
            function: func,
            block: entry,
        }));

        let mut scope = env.child();
        for (index, (param_name, ty)) in sig.params.iter().enumerate() {
            let slot = self.builder.build_entry_alloca(ty.clone(), param_name)?;
            let arg = self.builder.param(index)?;
            self.builder.build_store(arg, slot.clone())?;
            scope.define(
                param_name.clone(),
                Binding::Stack {
                    slot,
                    function: func,
                },
            );
        }

        let result = self.gen_expr(body, &mut scope)?;
        let result = self.coerce_return(result, &sig.ret)?;
        self.builder.build_ret(Some(result))?;

        self.in_class_body = saved_in_class_body;
        self.builder.set_insert_point(saved_point);
        Ok(())
    }
}
