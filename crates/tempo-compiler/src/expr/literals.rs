//! Literals and aggregate constructors.

use std::sync::Arc;

use tempo_ast::{Expr, Literal, VectorExpr};
use tempo_core::sizes::SZ_INT;
use tempo_core::{CompilationError, TypeHash};

use crate::bytecode::{Extra, Instr, OpCode};
use crate::emit::Emitter;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    pub(super) fn emit_literal(&mut self, literal: Literal<'_>) -> Result<()> {
        match literal {
            Literal::Int(value) => {
                self.emit_op(OpCode::RegPushImm, value as u64, u64::from(SZ_INT));
            }
            Literal::Char(c) => {
                self.emit_op(OpCode::RegPushImm, u64::from(c), u64::from(SZ_INT));
            }
            Literal::Float(value) => {
                self.emit_op(OpCode::RegPushFloat, value.to_bits(), 0);
            }
            Literal::Str(s) => {
                self.emit(Instr::new(OpCode::RegPushStr).with_extra(Extra::Str(Arc::from(s))));
            }
            // nil has type void and pushes nothing.
            Literal::Nil => {}
        }
        Ok(())
    }

    /// `[a, b, c]`: items are retained by the new array.
    pub(super) fn emit_array_literal(&mut self, items: &[Expr<'ast>], expr: &Expr<'ast>) -> Result<()> {
        let mut item_size = SZ_INT;
        for item in items {
            self.emit_expr(item, true)?;
            item_size = self.pushed_size(item)?;
        }
        let ty = self.resolve_type(expr.info.ty);
        self.emit(
            Instr::new(OpCode::ArrayInit)
                .with(items.len() as u64, u64::from(item_size))
                .with_extra(Extra::Type(ty)),
        );
        Ok(())
    }

    pub(super) fn emit_tuple(&mut self, items: &[Expr<'ast>]) -> Result<()> {
        let mut bytes = 0;
        let mut types = Vec::with_capacity(items.len());
        for item in items {
            self.emit_expr(item, true)?;
            bytes += self.pushed_size(item)?;
            types.push(self.resolve_type(item.info.final_type()));
        }
        self.emit(
            Instr::new(OpCode::TupleCtor)
                .with(u64::from(bytes), 0)
                .with_extra(Extra::Types(types.into())),
        );
        Ok(())
    }

    /// Vector literals push one float per component; missing trailing
    /// components are zero.
    pub(super) fn emit_vector(&mut self, vector: &VectorExpr<'ast>) -> Result<()> {
        for item in vector.items {
            self.emit_expr(item, false)?;
        }
        for _ in vector.items.len()..vector.kind.dimensions() {
            self.emit_op(OpCode::RegPushFloat, 0f64.to_bits(), 0);
        }
        Ok(())
    }

    pub(super) fn emit_gack(&mut self, items: &[Expr<'ast>]) -> Result<()> {
        let mut types: Vec<TypeHash> = Vec::with_capacity(items.len());
        for item in items {
            self.emit_expr(item, false)?;
            types.push(self.resolve_type(item.info.final_type()));
        }
        self.emit(
            Instr::new(OpCode::Gack)
                .with(items.len() as u64, 0)
                .with_extra(Extra::Types(types.into())),
        );
        Ok(())
    }

    /// `typeof(e)` pushes the static type; `e` is not evaluated.
    pub(super) fn emit_typeof(&mut self, operand: &Expr<'ast>) -> Result<()> {
        let ty = self.resolve_type(operand.info.ty);
        self.emit(Instr::new(OpCode::RegPushType).with_extra(Extra::Type(ty)));
        Ok(())
    }
}
