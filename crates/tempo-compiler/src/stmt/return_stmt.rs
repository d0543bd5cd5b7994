//! Return statements and tail calls.

use tempo_ast::{Binding, CallExpr, Expr, ExprKind, ReturnStmt};

use crate::bytecode::OpCode;
use crate::emit::{Emitter, FuncContext};
use crate::expr::is_direct;

use super::Result;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit `return [value]`.
    ///
    /// The value is pushed, the scopes nested in the function scope are
    /// released, and a jump to the epilogue is queued. A self-recursive call
    /// in tail position rewrites the parameters in place instead.
    ///
    /// Bytecode layout:
    /// ```text
    /// return v;           [v] [releases] Goto -> epilogue
    /// return f(a, b);     [a] [b] [releases] RegToMem{b} RegToMem{a} Goto -> entry
    /// ```
    pub(super) fn emit_return(&mut self, ret: &ReturnStmt<'ast>) -> Result<()> {
        if let Some(value) = ret.value {
            if let Some(call) = self.tail_call(value) {
                return self.emit_tail_call(call);
            }
            self.emit_expr(value, true)?;
        }
        let depth = self.code.func.as_ref().map_or(0, |func| func.body_depth + 1);
        self.unwind(depth);
        let pc = self.emit_op(OpCode::Goto, 0, 0);
        self.code.returns.push(pc);
        Ok(())
    }

    /// The call in `value` when it can reuse the current frame.
    fn tail_call(&self, value: &'ast Expr<'ast>) -> Option<&'ast CallExpr<'ast>> {
        let ctx = self.code.func.as_ref()?;
        let ExprKind::Call(call) = value.kind else {
            return None;
        };
        if value.info.cast_to.is_some() || !self.is_self_call(call, ctx) {
            return None;
        }
        Some(call)
    }

    fn is_self_call(&self, call: &CallExpr<'ast>, ctx: &FuncContext) -> bool {
        let named = matches!(
            call.callee.kind,
            ExprKind::Ident(ident) if matches!(ident.binding, Binding::Func(_))
        );
        let args_match = call.func.template_args.len() == ctx.template_args.len()
            && call
                .func
                .template_args
                .iter()
                .zip(&ctx.template_args)
                .all(|(arg, bound)| self.resolve_type(*arg) == *bound);
        call.func.hash == ctx.def_hash
            && named
            && is_direct(call)
            && !ctx.is_member
            && ctx.vararg_slot.is_none()
            && call.variadic_from.is_none()
            && call.args.len() == ctx.params.len()
            && args_match
    }

    fn emit_tail_call(&mut self, call: &CallExpr<'ast>) -> Result<()> {
        for arg in call.args {
            self.emit_expr(arg, true)?;
        }
        let Some(ctx) = self.code.func.clone() else {
            return Ok(());
        };
        self.unwind(ctx.body_depth);
        for &(offset, size) in ctx.params.iter().rev() {
            self.emit_op(OpCode::RegToMem, u64::from(offset), u64::from(size));
        }
        self.emit_op(OpCode::Goto, ctx.entry as u64, 0);
        Ok(())
    }
}
