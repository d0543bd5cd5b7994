//! Calls, callees and lambdas.
//!
//! ```text
//! <receiver>                         method calls only
//! <arg0> ... <argN>                  retained
//! VarargIni{bytes} | RegPushImm 0    variadic tail
//! <callee>                           RegPushCode, DotFunc or a function value
//! Prelude*{arg bytes}
//! Overflow{arg bytes, return size}
//! ```

use std::sync::Arc;

use tempo_ast::{Binding, CallExpr, CalleeKind, Expr, ExprKind, FuncDef, FuncRef, Ident, MemberKind};
use tempo_core::sizes::SZ_INT;
use tempo_core::{CompilationError, FuncFlags, Span, TypeHash, primitives};

use crate::bytecode::{Callee, CodeFlags, Extra, Instr, OpCode};
use crate::emit::Emitter;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(super) fn emit_call(&mut self, call: &'ast CallExpr<'ast>, expr: &Expr<'ast>) -> Result<()> {
        let slots = self.emit_call_args(call)?;
        let arg_bytes: u32 = slots.iter().sum();
        if is_direct(call) {
            self.emit_callee(call, arg_bytes, expr.span)?;
        } else {
            self.emit_expr(call.callee, false)?;
        }
        let ret_size = self.ret_size(expr.info.ty, expr.span)?;
        self.emit_prelude(prelude_kind(call), arg_bytes, ret_size);
        if !self.is_pure_call(&call.func) {
            self.clear_purity();
        }
        Ok(())
    }

    /// Push the receiver, fixed arguments and variadic pack.
    ///
    /// Returns the byte size of every pushed slot, in push order.
    pub(crate) fn emit_call_args(&mut self, call: &CallExpr<'ast>) -> Result<Vec<u32>> {
        let mut slots = Vec::with_capacity(call.args.len() + 1);
        if let Some(receiver) = method_receiver(call) {
            self.emit_expr(receiver, false)?;
            slots.push(SZ_INT);
        }

        let split = call.variadic_from.unwrap_or(call.args.len()).min(call.args.len());
        for arg in &call.args[..split] {
            self.emit_expr(arg, true)?;
            slots.push(self.pushed_size(arg)?);
        }

        if call.variadic_from.is_some() {
            let tail = &call.args[split..];
            if tail.is_empty() {
                self.emit_op(OpCode::RegPushImm, 0, u64::from(SZ_INT));
            } else {
                let mut sizes = Vec::with_capacity(tail.len());
                for arg in tail {
                    self.emit_expr(arg, true)?;
                    sizes.push(self.pushed_size(arg)?);
                }
                let total: u32 = sizes.iter().sum();
                self.emit(
                    Instr::new(OpCode::VarargIni)
                        .with(u64::from(total), 0)
                        .with_extra(Extra::ArgSizes(sizes.into())),
                );
            }
            slots.push(SZ_INT);
        }
        Ok(slots)
    }

    /// Push a directly named callee. `arg_bytes` locates the receiver of a
    /// method call.
    pub(crate) fn emit_callee(&mut self, call: &CallExpr<'ast>, arg_bytes: u32, span: Span) -> Result<()> {
        match call.callee.kind {
            ExprKind::Member(member) => match member.kind {
                MemberKind::Method { vt_index } => {
                    self.emit_op(OpCode::DotFunc, u64::from(vt_index), u64::from(arg_bytes));
                }
                MemberKind::StaticFunc(func) => self.push_callee(&func, span)?,
                _ => self.emit_expr(call.callee, false)?,
            },
            ExprKind::Ident(Ident {
                binding: Binding::Func(func),
                ..
            }) => self.push_callee(&func, span)?,
            _ => self.emit_expr(call.callee, false)?,
        }
        Ok(())
    }

    fn push_callee(&mut self, func: &FuncRef<'ast>, span: Span) -> Result<()> {
        let callee = self.callee_for(func, span)?;
        self.emit(Instr::new(OpCode::RegPushCode).with_extra(Extra::Callee(callee)));
        Ok(())
    }

    pub(crate) fn emit_prelude(&mut self, kind: CalleeKind, arg_bytes: u32, ret_size: u32) {
        let prelude = match kind {
            CalleeKind::Script => OpCode::PreludeScript,
            CalleeKind::Native => OpCode::PreludeNative,
            CalleeKind::Indirect => OpCode::PreludeIndirect,
        };
        self.emit_op(prelude, u64::from(arg_bytes), 0);
        self.emit_op(OpCode::Overflow, u64::from(arg_bytes), u64::from(ret_size));
    }

    /// Stack size of a call result.
    pub(crate) fn ret_size(&self, ty: TypeHash, span: Span) -> Result<u32> {
        if self.resolve_type(ty) == primitives::VOID {
            Ok(0)
        } else {
            self.size_of(ty, span)
        }
    }

    // ==========================================================================
    // Callee resolution
    // ==========================================================================

    /// Code (or placeholder) for a named function.
    pub(crate) fn callee_for(&mut self, func: &FuncRef<'_>, span: Span) -> Result<Callee> {
        if func.kind == CalleeKind::Native {
            return Ok(Callee::Native(func.hash));
        }
        if func.is_template_use() {
            return self.specialize_function(func, span);
        }
        let key = self.templates.method_key(func.hash).unwrap_or(func.hash);
        Ok(self.callee_for_hash(key, func.name, span))
    }

    /// Code for `key` if it exists, a host callback if the registry has one,
    /// and otherwise a ticket filled when the definition is emitted.
    pub(crate) fn callee_for_hash(&mut self, key: TypeHash, name: &str, span: Span) -> Callee {
        if let Some(code) = self.lookup_code(key) {
            return Callee::Code(code);
        }
        if self
            .registry
            .function(key)
            .is_some_and(|f| f.flags.contains(FuncFlags::BUILTIN))
        {
            return Callee::Native(key);
        }
        Callee::Pending(self.tickets.ticket(key, name, span))
    }

    /// Whether a call keeps the caller pure.
    fn is_pure_call(&self, func: &FuncRef<'_>) -> bool {
        func.is_pure
            || self.registry.function(func.hash).is_some_and(|f| f.is_pure())
            || self
                .lookup_code(func.hash)
                .is_some_and(|code| code.flags.contains(CodeFlags::PURE))
    }

    /// A lambda is emitted in place and pushed as a function value.
    pub(super) fn emit_lambda(&mut self, def: &'ast FuncDef<'ast>) -> Result<()> {
        let code = self.emit_function_body(def, def.hash, &[])?;
        self.install_function(def.hash, Arc::clone(&code));
        self.emit(Instr::new(OpCode::RegPushCode).with_extra(Extra::Callee(Callee::Code(code))));
        Ok(())
    }
}

/// The receiver of a method call.
fn method_receiver<'ast>(call: &CallExpr<'ast>) -> Option<&'ast Expr<'ast>> {
    match call.callee.kind {
        ExprKind::Member(member) if matches!(member.kind, MemberKind::Method { .. }) => {
            Some(member.base)
        }
        _ => None,
    }
}

/// Whether the callee is known statically (named function or virtual
/// method) rather than a function value computed at runtime.
pub(crate) fn is_direct(call: &CallExpr<'_>) -> bool {
    if call.func.kind == CalleeKind::Indirect {
        return false;
    }
    match call.callee.kind {
        ExprKind::Member(member) => matches!(
            member.kind,
            MemberKind::Method { .. } | MemberKind::StaticFunc(_)
        ),
        ExprKind::Ident(ident) => matches!(ident.binding, Binding::Func(_)),
        _ => false,
    }
}

/// Prelude used for a call.
pub(crate) fn prelude_kind(call: &CallExpr<'_>) -> CalleeKind {
    if is_direct(call) {
        call.func.kind
    } else {
        CalleeKind::Indirect
    }
}
