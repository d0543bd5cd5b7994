//! Switch statements.
//!
//! Case labels are positions in the switch body, not nested statements.
//! Constant labels go into the jump table of `SwitchBranch`; labels the
//! checker could not fold are evaluated up front and matched by
//! `SwitchIni` before the table is consulted.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tempo_ast::{Stmt, SwitchStmt};
use tempo_core::CompilationError;

use crate::bytecode::{Extra, JumpTable, OpCode};
use crate::emit::Emitter;

use super::Result;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit a switch.
    ///
    /// Bytecode layout:
    /// ```text
    ///       [selector]
    ///       [dynamic case values]     only with dynamic labels
    ///       SwitchIni{n}              extra: value index -> pc
    ///       SwitchBranch -> default   extra: constant -> pc
    ///       [body, labels mark pcs]
    /// exit:
    /// ```
    ///
    /// Without a `default` label the fallback is the exit.
    pub(super) fn emit_switch(&mut self, switch: &SwitchStmt<'ast>) -> Result<()> {
        self.emit_expr(switch.selector, false)?;

        let mut seen = FxHashSet::default();
        let mut dynamic = Vec::new();
        for stmt in switch.body {
            if let Stmt::Case(case) = stmt {
                match case.constant {
                    Some(value) => {
                        if !seen.insert(value) {
                            return Err(CompilationError::DuplicateCase {
                                value,
                                span: case.span,
                            });
                        }
                    }
                    None => dynamic.push(case.value),
                }
            }
        }

        let ini = if dynamic.is_empty() {
            None
        } else {
            for value in &dynamic {
                self.emit_expr(value, false)?;
            }
            Some(self.emit_op(OpCode::SwitchIni, dynamic.len() as u64, 0))
        };
        let branch = self.emit_op(OpCode::SwitchBranch, 0, 0);

        self.code.jumps.enter_switch(self.code.frame.depth());
        self.enter_scope();
        let mut table = JumpTable::new();
        let mut dynamic_table = JumpTable::new();
        let mut next_dynamic = 0i64;
        let mut default = None;
        for stmt in switch.body {
            match stmt {
                Stmt::Case(case) => match case.constant {
                    Some(value) => {
                        table.insert(value, self.pc());
                    }
                    None => {
                        dynamic_table.insert(next_dynamic, self.pc());
                        next_dynamic += 1;
                    }
                },
                Stmt::Default(_) => default = Some(self.pc()),
                other => self.emit_stmt(other)?,
            }
        }
        self.exit_scope()?;

        let exit = self.pc();
        let mut ctx = self
            .code
            .jumps
            .exit()
            .ok_or_else(|| CompilationError::internal("switch context underflow"))?;
        let patches: Vec<_> = ctx.breaks.drain_to(exit).collect();
        for (pc, target) in patches {
            self.patch(pc, target)?;
        }

        self.patch(branch, default.unwrap_or(exit))?;
        self.code
            .patch_extra(branch, Extra::JumpTable(Arc::new(table)))?;
        if let Some(ini) = ini {
            self.code
                .patch_extra(ini, Extra::JumpTable(Arc::new(dynamic_table)))?;
        }
        Ok(())
    }
}
