//! Conditionals.

use tempo_ast::IfStmt;

use crate::bytecode::OpCode;
use crate::emit::Emitter;

use super::Result;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit an if statement. Each branch gets its own scope.
    ///
    /// Bytecode layout:
    /// ```text
    ///       [condition]
    ///       BranchEq* -> else
    ///       [then]
    ///       Goto -> end          only with an else branch
    /// else: [else]
    /// end:
    /// ```
    pub(super) fn emit_if(&mut self, if_stmt: &IfStmt<'ast>) -> Result<()> {
        self.emit_expr(if_stmt.cond, false)?;
        let to_else = self.emit_branch(if_stmt.cond.info.final_type(), false, 0);
        self.emit_scoped(if_stmt.then_stmt)?;

        match if_stmt.else_stmt {
            Some(else_stmt) => {
                let to_end = self.emit_op(OpCode::Goto, 0, 0);
                self.patch_here(to_else)?;
                self.emit_scoped(else_stmt)?;
                self.patch_here(to_end)?;
            }
            None => self.patch_here(to_else)?,
        }
        Ok(())
    }
}
