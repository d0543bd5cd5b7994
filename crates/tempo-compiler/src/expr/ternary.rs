//! Conditional expressions.
//!
//! ```text
//!       <cond>
//!       BranchEq* -> else
//!       <if_true>
//!       Goto -> end
//! else: <if_false>
//! end:
//! ```

use tempo_ast::TernaryExpr;
use tempo_core::CompilationError;

use crate::bytecode::OpCode;
use crate::emit::Emitter;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Only one arm runs, so each arm applies `retain` itself.
    pub(super) fn emit_ternary(&mut self, ternary: &TernaryExpr<'ast>, retain: bool) -> Result<()> {
        self.emit_expr(ternary.cond, false)?;
        let to_else = self.emit_branch(ternary.cond.info.final_type(), false, 0);
        self.emit_expr(ternary.if_true, retain)?;
        let to_end = self.emit_op(OpCode::Goto, 0, 0);
        self.patch_here(to_else)?;
        self.emit_expr(ternary.if_false, retain)?;
        self.patch_here(to_end)?;
        Ok(())
    }
}
