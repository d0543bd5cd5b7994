//! Expression emission.
//!
//! [`Emitter::emit_expr`] dispatches on the expression kind, then applies
//! the post-steps every expression shares:
//!
//! ```text
//! <kind-specific code>
//! <implicit cast>      if the checker attached a conversion
//! RegAddRef            if a retained reference to a borrowed object is wanted
//! ```
//!
//! Purity is cleared by the call and operator paths themselves.

mod access;
mod binary;
mod calls;
mod cast;
mod decl;
mod identifiers;
mod literals;
mod ternary;
mod unary;
mod vararg;

pub(crate) use calls::{is_direct, prelude_kind};

use tempo_ast::{Binding, Expr, ExprKind, MemberKind};
use tempo_core::sizes::SZ_INT;
use tempo_core::{CompilationError, primitives};

use crate::bytecode::OpCode;
use crate::emit::Emitter;
use crate::operators::{IMPLICIT_CAST, OperatorKey};

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit an expression, leaving its value (or address) on the stack.
    ///
    /// With `retain`, a borrowed object value gets an extra reference so the
    /// consumer can own it.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn emit_expr(&mut self, expr: &Expr<'ast>, retain: bool) -> Result<()> {
        self.code.set_line(expr.span.line);
        match expr.kind {
            ExprKind::Literal(literal) => self.emit_literal(literal),
            ExprKind::Ident(ident) => self.emit_ident(&ident, expr),
            ExprKind::Array(items) => self.emit_array_literal(items, expr),
            ExprKind::Index(index) => self.emit_index(index, expr),
            ExprKind::Tuple(items) => self.emit_tuple(items),
            ExprKind::Vector(vector) => self.emit_vector(vector),
            ExprKind::Gack(items) => self.emit_gack(items),
            ExprKind::Lambda(def) => self.emit_lambda(def),
            ExprKind::TypeOf(operand) => self.emit_typeof(operand),
            ExprKind::Binary(binary) => self.emit_binary(binary, expr),
            ExprKind::Unary(unary) => self.emit_unary(unary, expr),
            ExprKind::Postfix(postfix) => self.emit_postfix(postfix, expr),
            ExprKind::Cast(cast) => self.emit_cast(cast, expr),
            ExprKind::Ternary(ternary) => self.emit_ternary(ternary, retain),
            ExprKind::Call(call) => self.emit_call(call, expr),
            ExprKind::Member(member) => self.emit_member(member, expr),
            ExprKind::Decl(decl) => self.emit_decl(decl, expr),
            ExprKind::Spawn(spawn) => self.emit_spawn(spawn, expr),
            ExprKind::Vararg(access) => self.emit_vararg(access, expr),
        }?;

        if let Some(to) = expr.info.cast_to {
            if self.resolve_type(to) != self.resolve_type(expr.info.ty) {
                let key = OperatorKey::cast(IMPLICIT_CAST, expr.info.ty, to);
                self.emit_operator(key, IMPLICIT_CAST, expr.span)?;
            }
        }

        if retain
            && !expr.info.addr
            && is_borrowed(expr)
            && self.is_managed(expr.info.final_type())
        {
            self.emit_op(OpCode::RegAddRef, 0, 0);
        }
        Ok(())
    }

    /// Bytes an emitted expression leaves on the stack.
    pub(crate) fn pushed_size(&self, expr: &Expr<'ast>) -> Result<u32> {
        if expr.info.addr {
            return Ok(SZ_INT);
        }
        let ty = expr.info.final_type();
        if self.resolve_type(ty) == primitives::VOID {
            return Ok(0);
        }
        self.size_of(ty, expr.span)
    }
}

/// Whether the expression reads storage someone else owns, as opposed to
/// producing a fresh reference (calls, instantiation, literals).
fn is_borrowed(expr: &Expr<'_>) -> bool {
    match expr.kind {
        ExprKind::Ident(ident) => matches!(ident.binding, Binding::Value(_)),
        ExprKind::Member(member) => {
            matches!(member.kind, MemberKind::Field { .. } | MemberKind::Static { .. })
        }
        ExprKind::Index(_) | ExprKind::Vararg(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use tempo_ast::{Ast, AstBuilder, Section, Stmt};
    use tempo_registry::TypeRegistry;

    use crate::Program;
    use crate::operators::OperatorTable;

    fn emit<'a>(b: &AstBuilder<'a>, stmts: &[Stmt<'a>]) -> Program {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let sections = b.slice(&[Section::Stmts(b.slice(stmts))]);
        let mut emitter = Emitter::new(&registry, &operators);
        emitter
            .emit_ast(&Ast {
                name: "t",
                sections,
            })
            .unwrap()
    }

    #[test]
    fn implicit_cast_follows_value() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = emit(&b, &[b.expr_stmt(b.implicit(b.int(2), primitives::FLOAT))]);
        program.main.assert_opcodes(&[
            OpCode::RegPushImm,
            OpCode::CastIntToFloat,
            OpCode::RegPop,
            OpCode::Eoc,
        ]);
    }

    #[test]
    fn retained_object_read_adds_reference() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let s = b.local("s", primitives::STRING);
        let t = b.local("t", primitives::STRING);
        let assign = b.binary(b.ident(s), "@=>", b.addr(b.ident(t)), primitives::STRING);
        let program = emit(
            &b,
            &[b.expr_stmt(b.decl(s)), b.expr_stmt(b.decl(t)), b.expr_stmt(assign)],
        );
        program.main.assert_contains_opcodes(&[
            OpCode::RegPushMem,
            OpCode::RegAddRef,
            OpCode::RegPushMemAddr,
            OpCode::ObjectAssign,
        ]);
    }

    #[test]
    fn plain_values_are_never_retained() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let x = b.local("x", primitives::INT);
        let y = b.local("y", primitives::INT);
        let assign = b.binary(b.ident(x), "=>", b.addr(b.ident(y)), primitives::INT);
        let program = emit(
            &b,
            &[b.expr_stmt(b.decl(x)), b.expr_stmt(b.decl(y)), b.expr_stmt(assign)],
        );
        assert_eq!(program.main.count(OpCode::RegAddRef), 0);
    }

    #[test]
    fn void_statement_is_not_popped() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = emit(&b, &[b.expr_stmt(b.expr(ExprKind::Gack(&[]), primitives::VOID))]);
        program.main.assert_opcodes(&[OpCode::Gack, OpCode::Eoc]);
    }
}
