//! Spork and fork.
//!
//! The spawned body becomes its own code. The spawning code copies what
//! the body needs into the new shred and schedules it:
//!
//! ```text
//! spork ~ { ...x... };         fork ~ f(a, b);
//!
//! <x>                          <a> <b>
//! SporkIni{0}  <spork~code:3>  SporkIni{1}  <fork~func:7>
//! [SporkThis]                  [SporkThis]
//! SporkExp{captured bytes}     SporkFunc{arg bytes}
//! SporkEnd                     ForkEnd{result size}
//! ```
//!
//! The new frame starts with `this` (when used), then the captured values
//! or call arguments, so the spawned code never addresses the spawning
//! frame.

use std::sync::Arc;

use tempo_ast::{CallExpr, Expr, SpawnBody, SpawnExpr, SpawnKind, Stmt};
use tempo_core::sizes::SZ_INT;
use tempo_core::{CompilationError, Span};

use crate::bytecode::{Extra, Instr, OpCode, SharedCode};
use crate::emit::Emitter;
use crate::expr::{is_direct, prelude_kind};

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn emit_spawn(&mut self, spawn: &'ast SpawnExpr<'ast>, expr: &Expr<'ast>) -> Result<()> {
        let (code, copy) = match spawn.body {
            SpawnBody::Block(stmts) => {
                let bytes = self.push_captures(spawn, expr.span)?;
                let name = self.spawn_name(spawn.kind, "code", expr.span);
                let code = self.emit_spawned_block(spawn, stmts, name, expr.span)?;
                (code, Instr::new(OpCode::SporkExp).with(u64::from(bytes), 0))
            }
            SpawnBody::Call(call) => {
                let mut slots = self.emit_call_args(call)?;
                if !is_direct(call) {
                    self.emit_expr(call.callee, false)?;
                    slots.push(SZ_INT);
                }
                let name = self.spawn_name(spawn.kind, "func", expr.span);
                let code = self.emit_spawned_call(spawn, call, &slots, name, expr.span)?;
                let bytes: u32 = slots.iter().sum();
                (code, Instr::new(OpCode::SporkFunc).with(u64::from(bytes), 0))
            }
        };

        let is_fork = spawn.kind == SpawnKind::Fork;
        self.emit(
            Instr::new(OpCode::SporkIni)
                .with(0, u64::from(is_fork))
                .with_extra(Extra::Code(code)),
        );
        if spawn.uses_this {
            self.emit_op(OpCode::SporkThis, 0, 0);
        }
        self.emit(copy);
        match spawn.kind {
            SpawnKind::Spork => {
                self.emit_op(OpCode::SporkEnd, 0, 0);
            }
            SpawnKind::Fork => {
                let result = self.ret_size(spawn.ret, expr.span)?;
                self.emit_op(OpCode::ForkEnd, u64::from(result), 0);
            }
        }
        self.clear_purity();
        Ok(())
    }

    /// `spork~code:12`, or `spork~code` without debug names.
    fn spawn_name(&self, kind: SpawnKind, form: &str, span: Span) -> String {
        let kind = match kind {
            SpawnKind::Spork => "spork",
            SpawnKind::Fork => "fork",
        };
        if self.options.debug_names {
            format!("{kind}~{form}:{}", span.line)
        } else {
            format!("{kind}~{form}")
        }
    }

    /// Push every captured value, retained. Returns the bytes pushed.
    fn push_captures(&mut self, spawn: &SpawnExpr<'ast>, span: Span) -> Result<u32> {
        let mut bytes = 0;
        for capture in spawn.captures {
            self.emit_value(capture, false, span)?;
            if !capture.is_ref && self.is_managed(capture.ty) {
                self.emit_op(OpCode::RegAddRef, 0, 0);
            }
            bytes += self.capture_size(capture, span)?;
        }
        Ok(bytes)
    }

    fn capture_size(&self, capture: &tempo_ast::Value<'_>, span: Span) -> Result<u32> {
        if capture.is_ref {
            Ok(SZ_INT)
        } else {
            self.size_of(capture.ty, span)
        }
    }

    /// Open the code of a spawned body and reserve `this` if it is used.
    fn open_spawned(&mut self, spawn: &SpawnExpr<'ast>, name: String) {
        self.push_code(name);
        self.enter_function(None);
        self.enter_scope();
        if spawn.uses_this {
            self.code.frame.allocate(SZ_INT, false);
        }
    }

    /// Close the code of a spawned body with `Eoc`.
    fn close_spawned(&mut self) -> Result<SharedCode> {
        self.exit_scope()?;
        self.code.resolve_returns()?;
        self.emit_op(OpCode::Eoc, 0, 0);
        self.exit_function();
        let code = self.pop_code()?.finish()?;
        Ok(Arc::new(code))
    }

    fn emit_spawned_block(
        &mut self,
        spawn: &SpawnExpr<'ast>,
        stmts: &'ast [Stmt<'ast>],
        name: String,
        span: Span,
    ) -> Result<SharedCode> {
        self.open_spawned(spawn, name);
        for capture in spawn.captures {
            let size = self.capture_size(capture, span)?;
            let owned = !capture.is_ref && self.is_managed(capture.ty);
            self.code.frame.declare(capture.id, size, owned);
        }
        self.code.stack_depth = self.code.frame.offset();
        for stmt in stmts {
            self.emit_stmt(stmt)?;
        }
        self.close_spawned()
    }

    /// The new code re-pushes the copied arguments from its frame and makes
    /// the call there.
    fn emit_spawned_call(
        &mut self,
        spawn: &SpawnExpr<'ast>,
        call: &CallExpr<'ast>,
        slots: &[u32],
        name: String,
        span: Span,
    ) -> Result<SharedCode> {
        self.open_spawned(spawn, name);
        let offsets: Vec<u32> = slots
            .iter()
            .map(|&size| self.code.frame.allocate(size, false))
            .collect();
        self.code.stack_depth = self.code.frame.offset();
        for (&offset, &size) in offsets.iter().zip(slots) {
            self.emit_op(OpCode::RegPushMem, u64::from(offset), u64::from(size));
        }

        let direct = is_direct(call);
        let arg_bytes: u32 = if direct {
            slots.iter().sum()
        } else {
            slots.iter().sum::<u32>() - SZ_INT
        };
        if direct {
            self.emit_callee(call, arg_bytes, span)?;
        }
        let ret = self.ret_size(spawn.ret, span)?;
        self.emit_prelude(prelude_kind(call), arg_bytes, ret);
        if spawn.kind == SpawnKind::Spork && ret > 0 {
            self.emit_op(OpCode::RegPop, u64::from(ret), 0);
        }
        self.close_spawned()
    }
}
