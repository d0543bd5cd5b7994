//! C-style for loops.

use tempo_ast::ForStmt;

use crate::bytecode::OpCode;
use crate::emit::Emitter;

use super::Result;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit a for loop. The initializer lives in the loop's scope and
    /// `continue` runs the update.
    ///
    /// Bytecode layout:
    /// ```text
    ///       [init]
    /// top:  [condition]
    ///       BranchEq* -> exit    only with a condition
    ///       [body]
    /// next: [update]
    ///       RegPop               when the update leaves a value
    ///       Goto -> top
    /// exit:
    /// ```
    pub(super) fn emit_for(&mut self, for_stmt: &ForStmt<'ast>) -> Result<()> {
        self.enter_scope();
        if let Some(init) = for_stmt.init {
            self.emit_stmt(init)?;
        }

        let top = self.pc();
        self.open_loop();
        let exit = match for_stmt.cond {
            Some(cond) => {
                self.emit_expr(cond, false)?;
                Some(self.emit_branch(cond.info.final_type(), false, 0))
            }
            None => None,
        };
        self.emit_scoped(for_stmt.body)?;

        let next = self.pc();
        if let Some(update) = for_stmt.update {
            self.emit_expr(update, false)?;
            let size = self.pushed_size(update)?;
            if size > 0 {
                self.emit_op(OpCode::RegPop, u64::from(size), 0);
            }
        }
        self.emit_op(OpCode::Goto, top as u64, 0);
        if let Some(exit) = exit {
            self.patch_here(exit)?;
        }
        self.close_loop(next)?;
        self.exit_scope()
    }
}
