//! Statement emission.
//!
//! [`Emitter::emit_stmt`] handles:
//! - Expression statements and blocks with their scopes
//! - if/else and switch
//! - while/until, do-while/until, counted, for and auto loops
//! - break, continue, return (with tail calls), goto and labels
//!
//! Every forward jump is emitted with a zero target and patched once the
//! target pc is known. Loops and switches collect their pending breaks and
//! continues on the code's [`JumpManager`](crate::emit::JumpManager).

mod auto_stmt;
mod for_stmt;
mod if_stmt;
mod jump_stmt;
mod loop_stmt;
mod return_stmt;
mod switch_stmt;
mod while_stmt;

use tempo_ast::{ExprStmt, Stmt};
use tempo_core::CompilationError;

use crate::bytecode::OpCode;
use crate::emit::Emitter;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit a statement.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn emit_stmt(&mut self, stmt: &Stmt<'ast>) -> Result<()> {
        self.code.set_line(stmt.span().line);
        match stmt {
            Stmt::Expr(expr_stmt) => self.emit_expr_stmt(expr_stmt),
            Stmt::Block(block) => self.emit_block(block.stmts),
            Stmt::If(if_stmt) => self.emit_if(if_stmt),
            Stmt::While(while_stmt) => self.emit_while(while_stmt),
            Stmt::DoWhile(while_stmt) => self.emit_do_while(while_stmt),
            Stmt::Loop(loop_stmt) => self.emit_loop(loop_stmt),
            Stmt::For(for_stmt) => self.emit_for(for_stmt),
            Stmt::Auto(auto_stmt) => self.emit_auto(auto_stmt),
            Stmt::Switch(switch) => self.emit_switch(switch),
            // Labels of a switch are consumed by the switch itself.
            Stmt::Case(case) => Err(CompilationError::CaseOutsideSwitch { span: case.span }),
            Stmt::Default(jump) => Err(CompilationError::CaseOutsideSwitch { span: jump.span }),
            Stmt::Break(jump) => self.emit_break(jump.span),
            Stmt::Continue(jump) => self.emit_continue(jump.span),
            Stmt::Return(ret) => self.emit_return(ret),
            Stmt::Goto(goto) => self.emit_goto(goto),
            Stmt::Label(label) => self.emit_label(label),
        }
    }

    /// Evaluate for side effects and drop the result.
    fn emit_expr_stmt(&mut self, expr_stmt: &ExprStmt<'ast>) -> Result<()> {
        let Some(expr) = expr_stmt.expr else {
            return Ok(());
        };
        // A bare declaration only initializes its slots.
        if let Some(decl) = expr.as_decl() {
            if expr.info.cast_to.is_none() {
                return self.emit_decl_vars(decl);
            }
        }
        self.emit_expr(expr, false)?;
        let size = self.pushed_size(expr)?;
        if size > 0 {
            self.emit_op(OpCode::RegPop, u64::from(size), 0);
        }
        Ok(())
    }

    /// `{ ... }` in its own scope.
    fn emit_block(&mut self, stmts: &[Stmt<'ast>]) -> Result<()> {
        self.enter_scope();
        for stmt in stmts {
            self.emit_stmt(stmt)?;
        }
        self.exit_scope()
    }

    /// Emit a branch or loop body in its own scope.
    pub(crate) fn emit_scoped(&mut self, stmt: &Stmt<'ast>) -> Result<()> {
        match stmt {
            Stmt::Block(block) => self.emit_block(block.stmts),
            other => {
                self.enter_scope();
                self.emit_stmt(other)?;
                self.exit_scope()
            }
        }
    }

    /// Open a loop whose body scopes start at the current depth.
    pub(crate) fn open_loop(&mut self) {
        let depth = self.code.frame.depth();
        self.code.jumps.enter_loop(depth);
    }

    /// Close the innermost loop: breaks go to the current pc, continues to
    /// `continue_target`.
    pub(crate) fn close_loop(&mut self, continue_target: usize) -> Result<()> {
        let exit = self.pc();
        let mut ctx = self
            .code
            .jumps
            .exit()
            .ok_or_else(|| CompilationError::internal("loop context underflow"))?;
        let patches: Vec<_> = ctx
            .breaks
            .drain_to(exit)
            .chain(ctx.continues.drain_to(continue_target))
            .collect();
        for (pc, target) in patches {
            self.patch(pc, target)?;
        }
        Ok(())
    }
}
