//! Expression tree to IR lowering
//!
//! A single recursive walk over `Expression`. Every sub-expression lowers to
//! an IR `Value`; special forms are dispatched on the head symbol of a list.

mod class;
mod control_flow;
mod expr;
mod function;
mod instance;

use super::class_layout::{ClassLayout, ClassRegistry};
use super::env::{Binding, Environment};
use super::error::{CompileError, CompileResult};
use super::ir::{
    CastOp, CmpOp, FunctionId, FunctionType, Initializer, InsertPoint, IrBuilder, IrModule, IrType,
    Value,
};
use super::CompilerOptions;
use crate::parser::Expression;

/// Output of one compilation
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub module: IrModule,
    /// Slot tables of every declared class, in declaration order
    pub classes: Vec<ClassLayout>,
}

/// Lowers one program to an `IrModule`.
///
/// Owns all per-program state: the module under construction, the class
/// registry and the class currently being declared. `compile` consumes the
/// compiler, so each program gets a fresh one.
pub struct Compiler {
    builder: IrBuilder,
    classes: ClassRegistry,
    /// Class whose declaration is being compiled
    current_class: Option<String>,
    /// True while directly inside a class body (not inside one of its methods)
    in_class_body: bool,
    /// Control-flow regions enclosing the insertion point; an `if` branch or
    /// loop body opens a new one
    regions: Vec<u32>,
    next_region: u32,
    printf: FunctionId,
    malloc: FunctionId,
}

impl Compiler {
    pub fn new(options: &CompilerOptions) -> Self {
        let mut builder = IrBuilder::new(&options.module_name, &options.target_triple);
        let printf = builder.declare_function(
            "printf",
            FunctionType::variadic(IrType::I32, vec![IrType::i8_ptr()]),
            vec!["format".to_string()],
        );
        let malloc = builder.declare_function(
            "malloc",
            FunctionType::new(IrType::i8_ptr(), vec![IrType::I64]),
            vec!["size".to_string()],
        );
        Self {
            builder,
            classes: ClassRegistry::new(),
            current_class: None,
            in_class_body: false,
            regions: vec![0],
            next_region: 1,
            printf,
            malloc,
        }
    }

    /// Compile a whole program into `main`
    pub fn compile(mut self, program: &Expression) -> CompileResult<CompiledProgram> {
        let main = self
            .builder
            .declare_function("main", FunctionType::new(IrType::I32, vec![]), vec![]);
        let entry = self.builder.append_block_to(main, "entry")?;
        self.builder.set_insert_point(Some(InsertPoint {
            function: main,
            block: entry,
        }));

        let version = self
            .builder
            .add_global("VERSION", IrType::I32, Initializer::Int(42), false);
        let mut globals = Environment::new();
        globals.define("VERSION", Binding::Global(self.builder.global_value(version)?));

        let result = {
            let mut top = globals.child();
            self.gen_expr(program, &mut top)?
        };
        let exit_code = self.coerce_return(result, &IrType::I32)?;
        self.builder.build_ret(Some(exit_code))?;

        let module = self.builder.finish();
        module
            .validate()
            .map_err(|errors| CompileError::InvalidModule { errors })?;
        log::debug!(
            "compiled module {}: {} functions, {} instructions",
            module.name,
            module.functions.len(),
            module.total_instruction_count()
        );

        let classes = self.classes.layouts(&module);
        Ok(CompiledProgram { module, classes })
    }

    pub(crate) fn gen_expr(
        &mut self,
        expr: &Expression,
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        match expr {
            Expression::Number(n) => Ok(self.builder.const_i32(*n)),
            Expression::String(s) => Ok(self.gen_string(s)),
            Expression::Symbol(name) => self.gen_symbol(name, env),
            Expression::List(items) => self.gen_list(expr, items, env),
        }
    }

    fn gen_list(
        &mut self,
        expr: &Expression,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        let Some(head) = items.first() else {
            return Err(CompileError::malformed("()", "empty list cannot be evaluated"));
        };

        let Some(op) = head.as_symbol() else {
            return self.gen_application(items, env);
        };

        match op {
            "+" | "-" | "*" | "/" => self.gen_arithmetic(op, items, env),
            ">" | "<" | "==" | "!=" | ">=" | "<=" => self.gen_comparison(op, items, env),
            "if" => self.gen_if(items, env),
            "while" => self.gen_while(items, env),
            "var" => self.gen_var(items, env),
            "set" => self.gen_set(items, env),
            "begin" => self.gen_begin(items, env),
            "printf" => self.gen_printf(items, env),
            "def" => self.gen_def(items, env),
            "class" => self.gen_class(items, env),
            "new" => self.gen_new(items, env),
            "prop" => self.gen_prop(items, env),
            "method" => self.gen_method(items, env),
            "super" => Err(CompileError::malformed(
                expr.to_string(),
                "`super` is only valid as the receiver of `method`",
            )),
            _ => self.gen_application(items, env),
        }
    }

    // ===== Shared helpers =====

    fn type_name(&self, ty: &IrType) -> String {
        self.builder.type_name(ty)
    }

    fn type_mismatch(
        &self,
        context: impl Into<String>,
        expected: &IrType,
        found: &IrType,
    ) -> CompileError {
        CompileError::TypeMismatch {
            context: context.into(),
            expected: self.type_name(expected),
            found: self.type_name(found),
        }
    }

    /// Cast `value` to `target`: integer resize or pointer bitcast
    fn coerce(&mut self, value: Value, target: &IrType, context: &str) -> CompileResult<Value> {
        let source = value.ty();
        if &source == target {
            return Ok(value);
        }

        match (source.int_bits(), target.int_bits()) {
            (Some(from), Some(to)) => {
                let op = if from > to {
                    CastOp::Trunc
                } else if from == 1 {
                    CastOp::ZExt
                } else {
                    CastOp::SExt
                };
                self.builder.build_cast(op, value, target.clone())
            }
            _ if source.is_ptr() && target.is_ptr() => {
                self.builder.build_cast(CastOp::BitCast, value, target.clone())
            }
            _ => Err(self.type_mismatch(context, target, &source)),
        }
    }

    /// Coerce a function result; a non-integer result of an integer function returns zero
    fn coerce_return(&mut self, value: Value, ret: &IrType) -> CompileResult<Value> {
        if ret.is_int() && !value.ty().is_int() {
            return Ok(self.builder.const_int(ret.clone(), 0));
        }
        self.coerce(value, ret, "return value")
    }

    /// Reduce a value to an `i1` branch condition
    fn to_condition(&mut self, value: Value, form: &str) -> CompileResult<Value> {
        let ty = value.ty();
        match ty {
            IrType::I1 => Ok(value),
            _ if ty.is_int() => {
                let zero = self.builder.const_int(ty, 0);
                self.builder.build_icmp(CmpOp::Ne, value, zero)
            }
            _ => Err(self.type_mismatch(format!("`{}` condition", form), &IrType::I1, &ty)),
        }
    }

    /// Stack slots may only be touched from the function that owns them
    fn check_local_access(&self, name: &str, owner: FunctionId) -> CompileResult<()> {
        if self.builder.current_function()? == owner {
            Ok(())
        } else {
            Err(CompileError::CapturedLocal {
                name: name.to_string(),
            })
        }
    }

    /// An instance register is usable only in its own function and only while
    /// the region it was defined in still dominates the insertion point
    fn check_instance_access(&self, name: &str, owner: FunctionId, region: u32) -> CompileResult<()> {
        self.check_local_access(name, owner)?;
        if self.regions.contains(&region) {
            Ok(())
        } else {
            Err(CompileError::ConditionalBinding {
                name: name.to_string(),
            })
        }
    }

    fn enter_region(&mut self) {
        self.regions.push(self.next_region);
        self.next_region += 1;
    }

    fn leave_region(&mut self) {
        self.regions.pop();
    }

    fn current_region(&self) -> u32 {
        self.regions.last().copied().unwrap_or(0)
    }
}

/// Fail unless `items` has exactly `expected` elements (head included)
fn expect_arity(items: &[Expression], expected: usize, form: &str) -> CompileResult<()> {
    if items.len() == expected {
        Ok(())
    } else {
        Err(CompileError::malformed(
            form,
            format!(
                "expected {} operand(s), found {}",
                expected - 1,
                items.len().saturating_sub(1)
            ),
        ))
    }
}

fn expect_symbol<'e>(expr: &'e Expression, form: &str, what: &str) -> CompileResult<&'e str> {
    expr.as_symbol().ok_or_else(|| {
        CompileError::malformed(form, format!("expected {} name, found `{}`", what, expr))
    })
}
