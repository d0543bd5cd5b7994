//! Emitting a resolved operator.

use tempo_core::{CompilationError, Span, TypeHash, primitives};

use super::{OperatorImpl, OperatorKey};
use crate::bytecode::{Callee, Extra, Instr, OpCode};
use crate::emit::Emitter;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit the implementation registered for `key`.
    ///
    /// The operands are already on the stack. `symbol` is only used for the
    /// error message.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit_operator(
        &mut self,
        key: OperatorKey,
        symbol: &str,
        span: Span,
    ) -> Result<OperatorImpl> {
        let key = OperatorKey {
            lhs: self.resolve_type(key.lhs),
            rhs: self.resolve_type(key.rhs),
            ..key
        };
        let imp = self
            .operators
            .resolve(self.registry, key)
            .ok_or_else(|| CompilationError::NoOperator {
                op: symbol.to_string(),
                left: self.operand_name(key.lhs),
                right: self.operand_name(key.rhs),
                span,
            })?;

        match imp {
            OperatorImpl::Instr(op, val) => {
                self.emit(Instr::new(op).with(val, 0));
            }
            OperatorImpl::Overload { func, ret } => {
                let callee = self.callee_for_hash(func, symbol, span);
                self.emit_operator_call(key, callee, OpCode::PreludeScript, ret, span)?;
                if !self.registry.function(func).is_some_and(|f| f.is_pure()) {
                    self.clear_purity();
                }
            }
            OperatorImpl::Native { func, ret } => {
                self.emit_operator_call(key, Callee::Native(func), OpCode::PreludeNative, ret, span)?;
                if !self.registry.function(func).is_some_and(|f| f.is_pure()) {
                    self.clear_purity();
                }
            }
            OperatorImpl::Identity => {}
        }
        Ok(imp)
    }

    fn emit_operator_call(
        &mut self,
        key: OperatorKey,
        callee: Callee,
        prelude: OpCode,
        ret: TypeHash,
        span: Span,
    ) -> Result<()> {
        let mut arg_bytes = 0;
        for operand in [key.lhs, key.rhs] {
            if !operand.is_empty() {
                arg_bytes += self.size_of(operand, span)?;
            }
        }
        let ret_size = if ret == primitives::VOID {
            0
        } else {
            self.size_of(ret, span)?
        };
        self.emit(Instr::new(OpCode::RegPushCode).with_extra(Extra::Callee(callee)));
        self.emit_op(prelude, u64::from(arg_bytes), 0);
        self.emit_op(OpCode::Overflow, u64::from(arg_bytes), u64::from(ret_size));
        Ok(())
    }

    fn operand_name(&self, ty: TypeHash) -> String {
        if ty.is_empty() {
            "none".to_string()
        } else {
            self.registry.name_of(ty)
        }
    }
}
