//! Counted loops.

use tempo_ast::LoopStmt;
use tempo_core::sizes::SZ_INT;

use crate::bytecode::OpCode;
use crate::emit::Emitter;

use super::Result;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit `repeat (n)`. The count is evaluated once into a hidden slot.
    ///
    /// Bytecode layout:
    /// ```text
    ///       [count]
    ///       RegToMem{counter}
    /// top:  LoopDecrement{counter}
    ///       BranchEqInt -> exit
    ///       [body]
    ///       Goto -> top
    /// exit:
    /// ```
    pub(super) fn emit_loop(&mut self, loop_stmt: &LoopStmt<'ast>) -> Result<()> {
        self.enter_scope();
        self.emit_expr(loop_stmt.count, false)?;
        let counter = self.code.frame.allocate(SZ_INT, false);
        self.emit_op(OpCode::RegToMem, u64::from(counter), u64::from(SZ_INT));

        self.open_loop();
        let top = self.emit_op(OpCode::LoopDecrement, u64::from(counter), 0);
        let exit = self.emit_op(OpCode::BranchEqInt, 0, 0);
        self.emit_scoped(loop_stmt.body)?;
        self.emit_op(OpCode::Goto, top as u64, 0);
        self.patch_here(exit)?;
        self.close_loop(top)?;
        self.exit_scope()
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use tempo_ast::{Ast, AstBuilder, Section};
    use tempo_registry::TypeRegistry;

    use crate::bytecode::OpCode;
    use crate::{Emitter, OperatorTable};

    #[test]
    fn counter_is_hidden_slot() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let body = b.block(&[b.break_stmt()]);
        let sections = b.slice(&[Section::Stmts(b.slice(&[b.loop_stmt(b.int(3), body)]))]);
        let program = Emitter::new(&registry, &operators)
            .emit_ast(&Ast {
                name: "t",
                sections,
            })
            .unwrap();
        program.main.assert_opcodes(&[
            OpCode::RegPushImm,
            OpCode::RegToMem,
            OpCode::LoopDecrement,
            OpCode::BranchEqInt,
            OpCode::Goto,
            OpCode::Goto,
            OpCode::Eoc,
        ]);
        assert_eq!(program.main.instrs[1].val, program.main.instrs[2].val);
        assert_eq!(program.main.instrs[3].val, 6);
        assert_eq!(program.main.instrs[4].val, 6);
        assert_eq!(program.main.instrs[5].val, 2);
        assert_eq!(program.main.frame_size, 8);
    }
}
