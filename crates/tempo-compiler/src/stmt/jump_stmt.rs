//! break, continue, goto and labels.

use tempo_ast::LabelStmt;
use tempo_core::{CompilationError, Span};

use crate::bytecode::OpCode;
use crate::emit::{Emitter, GotoTarget};

use super::Result;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Leave the innermost loop or switch.
    ///
    /// Objects owned by the scopes being left are released before the jump.
    pub(super) fn emit_break(&mut self, span: Span) -> Result<()> {
        let depth = self
            .code
            .jumps
            .break_depth()
            .map_err(|_| CompilationError::BreakOutsideLoop { span })?;
        self.unwind(depth);
        let pc = self.emit_op(OpCode::Goto, 0, 0);
        self.code.jumps.add_break(pc);
        Ok(())
    }

    /// Jump to the continue point of the innermost loop.
    pub(super) fn emit_continue(&mut self, span: Span) -> Result<()> {
        let depth = self
            .code
            .jumps
            .continue_depth()
            .map_err(|_| CompilationError::ContinueOutsideLoop { span })?;
        self.unwind(depth);
        let pc = self.emit_op(OpCode::Goto, 0, 0);
        self.code.jumps.add_continue(pc);
        Ok(())
    }

    pub(super) fn emit_goto(&mut self, goto: &LabelStmt<'ast>) -> Result<()> {
        let live = self.code.frame.live_owned();
        match self.code.labels.plan_goto(goto.name, &live) {
            GotoTarget::Backward { pc, release } => {
                self.release(&release);
                self.emit_op(OpCode::Goto, pc as u64, 0);
            }
            GotoTarget::Forward => {
                let pc = self.emit_op(OpCode::Goto, 0, 0);
                self.code.labels.add_forward(goto.name, pc, live, goto.span);
            }
        }
        Ok(())
    }

    pub(super) fn emit_label(&mut self, label: &LabelStmt<'ast>) -> Result<()> {
        let live = self.code.frame.live_owned();
        let pc = self.pc();
        let patches = self.code.labels.define(label.name, pc, live, label.span)?;
        for (from, to) in patches {
            self.patch(from, to)?;
        }
        Ok(())
    }
}
