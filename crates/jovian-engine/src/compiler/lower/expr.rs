//! Literals, variables, arithmetic, blocks and calls

use super::{expect_arity, expect_symbol, Compiler};
use crate::compiler::class_layout::CALL_OPERATOR;
use crate::compiler::env::{Binding, Environment};
use crate::compiler::error::{CompileError, CompileResult};
use crate::compiler::ir::{BinaryOp, CastOp, CmpOp, FunctionId, FunctionType, IrType, Value};
use crate::parser::Expression;

/// Replace every `\n` sequence with a newline; other backslashes are kept
pub(super) fn unescape(text: &str) -> String {
    text.replace("\\n", "\n")
}

impl Compiler {
    pub(super) fn gen_string(&mut self, text: &str) -> Value {
        self.builder.global_string_ptr(&unescape(text))
    }

    pub(super) fn gen_symbol(&mut self, name: &str, env: &Environment<'_>) -> CompileResult<Value> {
        match name {
            "true" => return Ok(self.builder.const_bool(true)),
            "false" => return Ok(self.builder.const_bool(false)),
            _ => {}
        }

        match env.lookup(name)?.clone() {
            Binding::Stack { slot, function } => {
                self.check_local_access(name, function)?;
                self.builder.build_load(slot)
            }
            Binding::Global(ptr) => self.builder.build_load(ptr),
            Binding::Instance {
                value,
                function,
                region,
            } => {
                self.check_instance_access(name, function, region)?;
                Ok(value)
            }
            Binding::Direct(value) => Ok(value),
        }
    }

    /// Evaluate both operands of a binary form and bring them to a common integer type
    fn gen_int_operands(
        &mut self,
        op: &str,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<(Value, Value)> {
        expect_arity(items, 3, op)?;
        let left = self.gen_expr(&items[1], env)?;
        let right = self.gen_expr(&items[2], env)?;

        for operand in [&left, &right] {
            if !operand.ty().is_int() {
                return Err(self.type_mismatch(
                    format!("operand of `{}`", op),
                    &IrType::I32,
                    &operand.ty(),
                ));
            }
        }

        if left.ty() == right.ty() {
            return Ok((left, right));
        }
        let left = self.coerce(left, &IrType::I32, op)?;
        let right = self.coerce(right, &IrType::I32, op)?;
        Ok((left, right))
    }

    pub(super) fn gen_arithmetic(
        &mut self,
        op: &str,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        let (left, right) = self.gen_int_operands(op, items, env)?;
        let op = match op {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            _ => BinaryOp::SDiv,
        };
        self.builder.build_binary(op, left, right)
    }

    /// Comparisons are unsigned regardless of operand sign: `(< -1 1)` is false.
    pub(super) fn gen_comparison(
        &mut self,
        op: &str,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        let (left, right) = self.gen_int_operands(op, items, env)?;
        let op = match op {
            ">" => CmpOp::Ugt,
            "<" => CmpOp::Ult,
            "==" => CmpOp::Eq,
            "!=" => CmpOp::Ne,
            ">=" => CmpOp::Uge,
            _ => CmpOp::Ule,
        };
        self.builder.build_icmp(op, left, right)
    }

    /// `name` or `(name type)`
    pub(super) fn typed_name(
        &self,
        expr: &Expression,
        form: &str,
    ) -> CompileResult<(String, Option<IrType>)> {
        match expr {
            Expression::Symbol(name) => Ok((name.clone(), None)),
            Expression::List(parts) if parts.len() == 2 => {
                let name = expect_symbol(&parts[0], form, "variable")?;
                let ty = expect_symbol(&parts[1], form, "type")?;
                Ok((name.to_string(), Some(self.resolve_type(ty)?)))
            }
            other => Err(CompileError::malformed(
                form,
                format!("expected `name` or `(name type)`, found `{}`", other),
            )),
        }
    }

    pub(super) fn gen_var(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        // Fields were already collected from the class body
        if self.in_class_body {
            return Ok(self.builder.const_i32(0));
        }

        expect_arity(items, 3, "var")?;
        let (name, declared) = self.typed_name(&items[1], "var")?;

        if items[2].is_tagged("new") {
            let instance = self.gen_expr(&items[2], env)?;
            let function = self.builder.current_function()?;
            let region = self.current_region();
            env.define(
                name,
                Binding::Instance {
                    value: instance.clone(),
                    function,
                    region,
                },
            );
            return Ok(instance);
        }

        let init = self.gen_expr(&items[2], env)?;
        let ty = declared.unwrap_or_else(|| init.ty());
        let value = self.coerce(init, &ty, "var")?;

        let slot = self.builder.build_entry_alloca(ty, &name)?;
        self.builder.build_store(value.clone(), slot.clone())?;
        let function = self.builder.current_function()?;
        env.define(name, Binding::Stack { slot, function });
        Ok(value)
    }

    pub(super) fn gen_set(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        expect_arity(items, 3, "set")?;
        let value = self.gen_expr(&items[2], env)?;
        let target = &items[1];

        let ptr = if target.is_tagged("prop") {
            let parts = target.as_list().unwrap_or(&[]);
            expect_arity(parts, 3, "prop")?;
            let instance = self.gen_expr(&parts[1], env)?;
            let field = expect_symbol(&parts[2], "prop", "field")?;
            self.field_address(instance, field)?
        } else {
            let name = expect_symbol(target, "set", "variable")?;
            match env.lookup(name)?.clone() {
                Binding::Stack { slot, function } => {
                    self.check_local_access(name, function)?;
                    slot
                }
                Binding::Global(ptr) => ptr,
                Binding::Instance { .. } | Binding::Direct(_) => {
                    return Err(CompileError::malformed(
                        "set",
                        format!("`{}` is not an assignable variable", name),
                    ))
                }
            }
        };

        let slot_ty = ptr
            .ty()
            .pointee()
            .cloned()
            .ok_or_else(|| CompileError::internal("assignment target is not a pointer"))?;
        let value = self.coerce(value, &slot_ty, "set")?;
        self.builder.build_store(value.clone(), ptr)?;
        Ok(value)
    }

    /// `(begin ...)`: child scope; value of the last statement, `i32 0` when empty
    pub(super) fn gen_begin(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        let mut scope = env.child();
        let mut last = self.builder.const_i32(0);
        for stmt in &items[1..] {
            last = self.gen_expr(stmt, &mut scope)?;
        }
        Ok(last)
    }

    pub(super) fn gen_printf(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        if items.len() < 2 {
            return Err(CompileError::malformed("printf", "missing format string"));
        }

        let mut args = Vec::with_capacity(items.len() - 1);
        for item in &items[1..] {
            let value = self.gen_expr(item, env)?;
            // variadic arguments narrower than int are promoted
            let value = match value.ty() {
                IrType::I1 | IrType::I8 => {
                    self.builder.build_cast(CastOp::ZExt, value, IrType::I32)?
                }
                _ => value,
            };
            args.push(value);
        }

        let callee = self.builder.function_value(self.printf)?;
        let fn_ty = self.builder.function_type(self.printf)?;
        self.emit_call(callee, &fn_ty, args, "printf")
    }

    /// `(callee args...)`
    pub(super) fn gen_application(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        let callee = self.gen_expr(&items[0], env)?;
        let callee_ty = callee.ty();

        let mut args = Vec::with_capacity(items.len());
        let call_operator = self.classes.class_of_type(&callee_ty).map(|class| {
            class
                .method(CALL_OPERATOR)
                .ok_or_else(|| class.unknown_member(CALL_OPERATOR))
        });
        if let Some(call) = call_operator {
            // instance used as a function: `(p 1)` calls `Point___call__(p, 1)`
            let call = call?;
            args.push(callee);
            for item in &items[1..] {
                args.push(self.gen_expr(item, env)?);
            }
            return self.call_function(call, args, &items[0].to_string());
        }

        let Some(fn_ty) = callee_ty.pointee_function().cloned() else {
            return Err(CompileError::TypeMismatch {
                context: format!("call of `{}`", items[0]),
                expected: "function".to_string(),
                found: self.type_name(&callee_ty),
            });
        };
        for item in &items[1..] {
            args.push(self.gen_expr(item, env)?);
        }
        self.emit_call(callee, &fn_ty, args, &items[0].to_string())
    }

    /// Call a known function directly
    pub(super) fn call_function(
        &mut self,
        func: FunctionId,
        args: Vec<Value>,
        form: &str,
    ) -> CompileResult<Value> {
        let callee = self.builder.function_value(func)?;
        let fn_ty = self.builder.function_type(func)?;
        self.emit_call(callee, &fn_ty, args, form)
    }

    /// Check arity, cast each fixed argument to its parameter type, and call
    pub(super) fn emit_call(
        &mut self,
        callee: Value,
        fn_ty: &FunctionType,
        args: Vec<Value>,
        form: &str,
    ) -> CompileResult<Value> {
        let arity_ok = if fn_ty.variadic {
            args.len() >= fn_ty.params.len()
        } else {
            args.len() == fn_ty.params.len()
        };
        if !arity_ok {
            return Err(CompileError::malformed(
                form,
                format!(
                    "expected {}{} argument(s), found {}",
                    if fn_ty.variadic { "at least " } else { "" },
                    fn_ty.params.len(),
                    args.len()
                ),
            ));
        }

        let mut coerced = Vec::with_capacity(args.len());
        for (i, arg) in args.into_iter().enumerate() {
            match fn_ty.params.get(i) {
                Some(param) => coerced.push(self.coerce(arg, param, form)?),
                None => coerced.push(arg),
            }
        }
        self.builder.build_call(callee, fn_ty, coerced)
    }
}
