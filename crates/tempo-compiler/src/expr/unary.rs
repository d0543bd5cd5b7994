//! Prefix and postfix operators.

use tempo_ast::{Expr, PostfixExpr, UnaryExpr};
use tempo_core::CompilationError;

use crate::emit::Emitter;
use crate::operators::OperatorKey;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    pub(super) fn emit_unary(&mut self, unary: &UnaryExpr<'ast>, expr: &Expr<'ast>) -> Result<()> {
        self.emit_expr(unary.operand, false)?;
        let key = OperatorKey::prefix(unary.op, unary.operand.info.final_type());
        self.emit_operator(key, unary.op, expr.span)?;
        Ok(())
    }

    /// `x++`: the operand is an address.
    pub(super) fn emit_postfix(&mut self, postfix: &PostfixExpr<'ast>, expr: &Expr<'ast>) -> Result<()> {
        self.emit_expr(postfix.operand, false)?;
        let key = OperatorKey::postfix(postfix.op, postfix.operand.info.final_type());
        self.emit_operator(key, postfix.op, expr.span)?;
        Ok(())
    }
}
