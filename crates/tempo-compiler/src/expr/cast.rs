//! Explicit casts.

use tempo_ast::{CastExpr, Expr};
use tempo_core::CompilationError;

use crate::emit::Emitter;
use crate::operators::{EXPLICIT_CAST, OperatorKey};

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// `e $ T`. A cast to the value's own type emits nothing.
    pub(super) fn emit_cast(&mut self, cast: &CastExpr<'ast>, expr: &Expr<'ast>) -> Result<()> {
        self.emit_expr(cast.expr, false)?;
        let from = self.resolve_type(cast.expr.info.final_type());
        if from == self.resolve_type(cast.target) {
            return Ok(());
        }
        self.emit_operator(OperatorKey::cast(EXPLICIT_CAST, from, cast.target), EXPLICIT_CAST, expr.span)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use tempo_ast::{Ast, AstBuilder, CastExpr, ExprKind, Section};
    use tempo_core::{CompilationError, primitives};
    use tempo_registry::TypeRegistry;

    use crate::bytecode::OpCode;
    use crate::{Emitter, OperatorTable};

    #[test]
    fn float_to_int() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let cast = b.alloc(CastExpr {
            expr: b.alloc(b.float(2.5)),
            target: primitives::INT,
        });
        let same = b.alloc(CastExpr {
            expr: b.alloc(b.int(2)),
            target: primitives::INT,
        });
        let stmts = [
            b.expr_stmt(b.expr(ExprKind::Cast(cast), primitives::INT)),
            b.expr_stmt(b.expr(ExprKind::Cast(same), primitives::INT)),
        ];
        let sections = b.slice(&[Section::Stmts(b.slice(&stmts))]);
        let program = Emitter::new(&registry, &operators)
            .emit_ast(&Ast {
                name: "t",
                sections,
            })
            .unwrap();
        program.main.assert_opcodes(&[
            OpCode::RegPushFloat,
            OpCode::CastFloatToInt,
            OpCode::RegPop,
            OpCode::RegPushImm,
            OpCode::RegPop,
            OpCode::Eoc,
        ]);
    }

    #[test]
    fn unknown_conversion() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let cast = b.alloc(CastExpr {
            expr: b.alloc(b.int(1)),
            target: primitives::STRING,
        });
        let stmts = [b.expr_stmt(b.expr(ExprKind::Cast(cast), primitives::STRING))];
        let sections = b.slice(&[Section::Stmts(b.slice(&stmts))]);
        let err = Emitter::new(&registry, &operators)
            .emit_ast(&Ast {
                name: "t",
                sections,
            })
            .unwrap_err();
        assert!(matches!(err, CompilationError::NoOperator { ref op, .. } if op == "$"));
    }
}
