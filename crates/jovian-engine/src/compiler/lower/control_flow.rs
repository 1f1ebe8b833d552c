//! `if` and `while`

use super::{expect_arity, Compiler};
use crate::compiler::env::Environment;
use crate::compiler::error::CompileResult;
use crate::compiler::ir::Value;
use crate::parser::Expression;

impl Compiler {
    /// `(if cond then else)`: then/else blocks joined by a phi in the merge block
    pub(super) fn gen_if(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        expect_arity(items, 4, "if")?;

        let cond = self.gen_expr(&items[1], env)?;
        let cond = self.to_condition(cond, "if")?;

        let then_block = self.builder.append_block("then")?;
        let else_block = self.builder.append_block("else")?;
        let merge_block = self.builder.append_block("ifcont")?;
        self.builder.build_cond_br(cond, then_block, else_block)?;

        // Nested control flow may move the insertion point, so the phi is keyed
        // by the block each branch ends in, not the block it started in.
        self.builder.switch_to_block(then_block)?;
        self.enter_region();
        let then_value = self.gen_expr(&items[2], env)?;
        self.leave_region();
        let then_end = self.builder.current_block()?;
        self.builder.build_br(merge_block)?;

        self.builder.switch_to_block(else_block)?;
        self.enter_region();
        let else_value = self.gen_expr(&items[3], env)?;
        self.leave_region();
        let else_end = self.builder.current_block()?;
        self.builder.build_br(merge_block)?;

        let ty = then_value.ty();
        if else_value.ty() != ty {
            return Err(self.type_mismatch("`if` branches", &ty, &else_value.ty()));
        }

        self.builder.switch_to_block(merge_block)?;
        self.builder
            .build_phi(ty, vec![(then_value, then_end), (else_value, else_end)])
    }

    /// `(while cond body)`: always evaluates to `i32 0`
    pub(super) fn gen_while(
        &mut self,
        items: &[Expression],
        env: &mut Environment<'_>,
    ) -> CompileResult<Value> {
        expect_arity(items, 3, "while")?;

        let cond_block = self.builder.append_block("cond")?;
        let body_block = self.builder.append_block("body")?;
        let exit_block = self.builder.append_block("loopend")?;
        self.builder.build_br(cond_block)?;

        self.builder.switch_to_block(cond_block)?;
        let cond = self.gen_expr(&items[1], env)?;
        let cond = self.to_condition(cond, "while")?;
        self.builder.build_cond_br(cond, body_block, exit_block)?;

        self.builder.switch_to_block(body_block)?;
        self.enter_region();
        self.gen_expr(&items[2], env)?;
        self.leave_region();
        self.builder.build_br(cond_block)?;

        self.builder.switch_to_block(exit_block)?;
        Ok(self.builder.const_i32(0))
    }
}
