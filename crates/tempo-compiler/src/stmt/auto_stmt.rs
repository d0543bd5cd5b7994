//! Ranged iteration.

use tempo_ast::AutoStmt;
use tempo_core::sizes::SZ_INT;

use crate::bytecode::OpCode;
use crate::emit::Emitter;

use super::Result;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit `for (auto x : coll)`.
    ///
    /// The collection is evaluated once and held in a hidden owned slot, the
    /// cursor follows it, then the loop value. The loop value borrows the
    /// element, so its slot is never released.
    ///
    /// Bytecode layout:
    /// ```text
    ///       [collection]          retained
    ///       RegToMem{coll}
    ///       MemSetImm{cursor}
    /// top:  AutoLoop{cursor, size}   AutoLoopPtr for `auto @x`
    ///       BranchEqInt -> exit
    ///       [body]
    ///       Goto -> top
    /// exit:
    /// ```
    pub(super) fn emit_auto(&mut self, auto: &AutoStmt<'ast>) -> Result<()> {
        self.enter_scope();
        self.emit_expr(auto.collection, true)?;
        let owned = self.is_managed(auto.collection.info.final_type());
        let collection = self.code.frame.allocate(SZ_INT, owned);
        self.emit_op(OpCode::RegToMem, u64::from(collection), u64::from(SZ_INT));
        let cursor = self.code.frame.allocate(SZ_INT, false);
        self.emit_op(OpCode::MemSetImm, u64::from(cursor), u64::from(SZ_INT));

        let value = auto.value;
        let (op, size) = if auto.is_ptr {
            (OpCode::AutoLoopPtr, SZ_INT)
        } else {
            (OpCode::AutoLoop, self.size_of(value.ty, auto.span)?)
        };
        self.code.frame.declare(value.id, size, false);

        self.open_loop();
        let top = self.emit_op(op, u64::from(cursor), u64::from(size));
        let exit = self.emit_op(OpCode::BranchEqInt, 0, 0);
        self.emit_scoped(auto.body)?;
        self.emit_op(OpCode::Goto, top as u64, 0);
        self.patch_here(exit)?;
        self.close_loop(top)?;
        self.exit_scope()
    }
}
