//! Binary operators.
//!
//! Both operands are emitted left to right and the operator table decides
//! what runs. There is no operator-specific code here.

use tempo_ast::{BinaryExpr, Expr};
use tempo_core::CompilationError;

use crate::emit::Emitter;
use crate::operators::OperatorKey;

type Result<T> = std::result::Result<T, CompilationError>;

/// Handle assignment: the stored reference is owned by its target.
const REF_ASSIGN: &str = "@=>";

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    pub(super) fn emit_binary(&mut self, binary: &BinaryExpr<'ast>, expr: &Expr<'ast>) -> Result<()> {
        self.emit_expr(binary.lhs, binary.op == REF_ASSIGN)?;
        self.emit_expr(binary.rhs, false)?;
        let key = OperatorKey::new(
            binary.op,
            binary.lhs.info.final_type(),
            binary.rhs.info.final_type(),
        );
        self.emit_operator(key, binary.op, expr.span)?;
        Ok(())
    }
}
