//! Subscripts and member access.

use tempo_ast::{Expr, IndexExpr, MemberExpr, MemberKind};
use tempo_core::CompilationError;

use crate::bytecode::{Extra, Instr, OpCode};
use crate::emit::Emitter;
use crate::operators::OperatorKey;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// `a[i][j]` or a fixed tuple slot.
    ///
    /// ```text
    /// <a> <i> ArrayCheck{0} ArrayFetch <j> ArrayCheck{1} ArrayGet{size}
    /// ```
    pub(super) fn emit_index(&mut self, index: &IndexExpr<'ast>, expr: &Expr<'ast>) -> Result<()> {
        self.emit_expr(index.base, false)?;
        let size = self.size_of(expr.info.ty, expr.span)?;

        if let Some(offset) = index.tuple_offset {
            if expr.info.addr {
                self.emit_op(OpCode::DotTupleAddr, u64::from(offset), 0);
            } else {
                self.emit_op(OpCode::DotTuple, u64::from(offset), u64::from(size));
            }
            return Ok(());
        }

        let last = index.indices.len().saturating_sub(1);
        for (dim, idx) in index.indices.iter().enumerate() {
            self.emit_expr(idx, false)?;
            self.emit_op(OpCode::ArrayCheck, dim as u64, 0);
            if dim < last {
                self.emit_op(OpCode::ArrayFetch, 0, 0);
            }
        }
        if expr.info.addr {
            self.emit_op(OpCode::ArrayAddr, u64::from(size), 0);
        } else {
            self.emit_op(OpCode::ArrayGet, u64::from(size), 0);
        }
        Ok(())
    }

    pub(super) fn emit_member(&mut self, member: &MemberExpr<'ast>, expr: &Expr<'ast>) -> Result<()> {
        match member.kind {
            MemberKind::Field { offset } => {
                self.emit_expr(member.base, false)?;
                let size = self.size_of(expr.info.ty, expr.span)?;
                self.emit_field(offset, size, expr.info.addr);
            }
            MemberKind::Static { owner, offset } => {
                // The base names a type and is not evaluated.
                let size = self.size_of(expr.info.ty, expr.span)?;
                self.emit_static(owner, offset, size, expr.info.addr);
            }
            MemberKind::Method { vt_index } => {
                self.emit_expr(member.base, false)?;
                self.emit_op(OpCode::DotFunc, u64::from(vt_index), 0);
            }
            MemberKind::StaticFunc(func) => {
                let callee = self.callee_for(&func, expr.span)?;
                self.emit(Instr::new(OpCode::RegPushCode).with_extra(Extra::Callee(callee)));
            }
            MemberKind::Component { index } => {
                self.emit_expr(member.base, false)?;
                self.emit_op(OpCode::VecMember, u64::from(index), u64::from(expr.info.addr));
            }
            MemberKind::Builtin => {
                self.emit_expr(member.base, false)?;
                let owner = self.resolve_type(member.base.info.final_type());
                self.emit_operator(OperatorKey::member(owner, member.name), member.name, expr.span)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use tempo_ast::{Ast, AstBuilder, Binding, ExprKind, Ident, IndexExpr, MemberKind, Section, Stmt};
    use tempo_core::{TypeHash, primitives};
    use tempo_registry::TypeRegistry;

    use crate::bytecode::OpCode;
    use crate::{Emitter, OperatorTable, Program};

    fn emit<'a>(b: &AstBuilder<'a>, stmts: &[Stmt<'a>]) -> Program {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let sections = b.slice(&[Section::Stmts(b.slice(stmts))]);
        Emitter::new(&registry, &operators)
            .emit_ast(&Ast {
                name: "t",
                sections,
            })
            .unwrap()
    }

    #[test]
    fn two_dimensional_read() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let grid = b.local("grid", primitives::ARRAY);
        let index = b.alloc(IndexExpr {
            base: b.alloc(b.ident(grid)),
            indices: b.slice(&[b.int(1), b.int(2)]),
            tuple_offset: None,
        });
        let read = b.expr(ExprKind::Index(index), primitives::FLOAT);
        let program = emit(&b, &[b.expr_stmt(b.decl(grid)), b.expr_stmt(read)]);
        program.main.assert_contains_opcodes(&[
            OpCode::RegPushMem,
            OpCode::RegPushImm,
            OpCode::ArrayCheck,
            OpCode::ArrayFetch,
            OpCode::RegPushImm,
            OpCode::ArrayCheck,
            OpCode::ArrayGet,
            OpCode::RegPop,
        ]);
        assert_eq!(program.main.count(OpCode::ArrayFetch), 1);
    }

    #[test]
    fn indexed_assignment_target_is_address() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let list = b.local("list", primitives::ARRAY);
        let index = b.alloc(IndexExpr {
            base: b.alloc(b.ident(list)),
            indices: b.slice(&[b.int(0)]),
            tuple_offset: None,
        });
        let target = b.expr(ExprKind::Index(index), primitives::INT);
        let store = b.binary(b.int(5), "=>", b.addr(target), primitives::INT);
        let program = emit(&b, &[b.expr_stmt(b.decl(list)), b.expr_stmt(store)]);
        program.main.assert_contains_opcodes(&[OpCode::ArrayAddr, OpCode::IntAssign]);
        assert_eq!(program.main.count(OpCode::ArrayGet), 0);
    }

    #[test]
    fn tuple_slot_is_fixed_offset() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let pair = b.local("pair", primitives::TUPLE);
        let index = b.alloc(IndexExpr {
            base: b.alloc(b.ident(pair)),
            indices: b.slice(&[b.int(1)]),
            tuple_offset: Some(8),
        });
        let read = b.expr(ExprKind::Index(index), primitives::FLOAT);
        let program = emit(&b, &[b.expr_stmt(b.decl(pair)), b.expr_stmt(read)]);
        let at = program.main.find(OpCode::DotTuple).unwrap();
        assert_eq!(program.main.instrs[at].val, 8);
        assert_eq!(program.main.count(OpCode::ArrayCheck), 0);
    }

    #[test]
    fn vector_component() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let v = b.local("v", primitives::VEC3);
        let y = b.member(b.ident(v), "y", MemberKind::Component { index: 1 }, primitives::FLOAT);
        let program = emit(&b, &[b.expr_stmt(b.decl(v)), b.expr_stmt(y)]);
        let at = program.main.find(OpCode::VecMember).unwrap();
        assert_eq!(program.main.instrs[at].val, 1);
        assert_eq!(program.main.instrs[at].val2, 0);
    }

    #[test]
    fn builtin_member_goes_through_table() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let s = b.local("s", primitives::STRING);
        let len = b.member(b.ident(s), "length", MemberKind::Builtin, primitives::INT);
        let program = emit(&b, &[b.expr_stmt(b.decl(s)), b.expr_stmt(len)]);
        program.main.assert_contains_opcodes(&[OpCode::RegPushMem, OpCode::DotMember]);
    }

    #[test]
    fn static_member_skips_base() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let owner = TypeHash::from_name("Osc");
        let base = b.expr(
            ExprKind::Ident(Ident {
                name: "Osc",
                binding: Binding::Type(owner),
            }),
            primitives::CLASS,
        );
        let count = b.member(base, "count", MemberKind::Static { owner, offset: 0 }, primitives::INT);
        let program = emit(&b, &[b.expr_stmt(count)]);
        program.main.assert_opcodes(&[OpCode::RegPushStatic, OpCode::RegPop, OpCode::Eoc]);
    }
}
