//! while/until and do-while/until loops.

use tempo_ast::WhileStmt;

use crate::bytecode::OpCode;
use crate::emit::Emitter;

use super::Result;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit a while (or until) loop. `continue` re-runs the test.
    ///
    /// Bytecode layout:
    /// ```text
    /// top:  [condition]
    ///       BranchEq* -> exit    BranchNeq* for until
    ///       [body]
    ///       Goto -> top
    /// exit:
    /// ```
    pub(super) fn emit_while(&mut self, while_stmt: &WhileStmt<'ast>) -> Result<()> {
        let top = self.pc();
        self.open_loop();
        self.emit_expr(while_stmt.cond, false)?;
        let exit = self.emit_branch(while_stmt.cond.info.final_type(), while_stmt.is_until, 0);
        self.emit_scoped(while_stmt.body)?;
        self.emit_op(OpCode::Goto, top as u64, 0);
        self.patch_here(exit)?;
        self.close_loop(top)
    }

    /// Emit a do-while (or do-until) loop. `continue` jumps to the test.
    ///
    /// Bytecode layout:
    /// ```text
    /// top:  [body]
    /// test: [condition]
    ///       BranchNeq* -> top    BranchEq* for until
    /// exit:
    /// ```
    pub(super) fn emit_do_while(&mut self, while_stmt: &WhileStmt<'ast>) -> Result<()> {
        let top = self.pc();
        self.open_loop();
        self.emit_scoped(while_stmt.body)?;
        let test = self.pc();
        self.emit_expr(while_stmt.cond, false)?;
        self.emit_branch(while_stmt.cond.info.final_type(), !while_stmt.is_until, top);
        self.close_loop(test)
    }
}
