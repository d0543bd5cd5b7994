//! The variadic argument block.
//!
//! A variadic function walks its packed arguments between `vararg.start`
//! and `vararg.end`:
//!
//! ```text
//! top:  VarargTop{slot, exit}       jump to exit when no argument is left
//!       ... VarargMember{slot, size} ...
//!       VarargEnd{slot, top}        step to the next argument, loop to top
//! exit:
//! ```

use tempo_ast::{Expr, VarargAccess};
use tempo_core::CompilationError;

use crate::bytecode::OpCode;
use crate::emit::{Emitter, VarargRegion};

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    pub(super) fn emit_vararg(&mut self, access: VarargAccess<'ast>, expr: &Expr<'ast>) -> Result<()> {
        let span = expr.span;
        let mut region = self
            .varargs
            .last()
            .copied()
            .flatten()
            .ok_or_else(|| CompilationError::internal(format!("vararg outside a variadic function at {span}")))?;

        match access.member {
            "start" => {
                if region.top.is_some() {
                    return Err(CompilationError::VarargRestart { span });
                }
                region.top = Some(self.emit_op(OpCode::VarargTop, u64::from(region.slot), 0));
            }
            "end" => {
                let Some(top) = region.top else {
                    return Err(CompilationError::VarargEndWithoutStart { span });
                };
                if region.ended {
                    return Err(CompilationError::VarargAfterEnd {
                        member: access.member.to_string(),
                        span,
                    });
                }
                let end = self.emit_op(OpCode::VarargEnd, u64::from(region.slot), top as u64);
                self.code.patch_val2(top, end as u64 + 1)?;
                region.ended = true;
            }
            member => {
                if region.top.is_none() {
                    return Err(CompilationError::VarargBeforeStart {
                        member: member.to_string(),
                        span,
                    });
                }
                if region.ended {
                    return Err(CompilationError::VarargAfterEnd {
                        member: member.to_string(),
                        span,
                    });
                }
                let size = self.size_of(expr.info.ty, span)?;
                self.emit_op(OpCode::VarargMember, u64::from(region.slot), u64::from(size));
            }
        }

        self.store_region(region);
        Ok(())
    }

    fn store_region(&mut self, region: VarargRegion) {
        if let Some(slot) = self.varargs.last_mut() {
            *slot = Some(region);
        }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use tempo_ast::{Ast, AstBuilder, ExprKind, FuncDef, Section, Stmt, VarargAccess};
    use tempo_core::{CompilationError, FuncFlags, Span, TypeHash, primitives};
    use tempo_registry::TypeRegistry;

    use crate::bytecode::OpCode;
    use crate::{Emitter, OperatorTable, Program};

    fn vararg<'a>(b: &AstBuilder<'a>, member: &str, ty: TypeHash) -> Stmt<'a> {
        b.expr_stmt(b.expr(
            ExprKind::Vararg(VarargAccess {
                member: b.str(member),
            }),
            ty,
        ))
    }

    fn variadic<'a>(b: &AstBuilder<'a>, body: &[Stmt<'a>]) -> Result<Program, CompilationError> {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let def = b.alloc(FuncDef {
            name: "sum",
            hash: TypeHash::from_function("sum", &[primitives::VARARG]),
            params: &[],
            ret: primitives::VOID,
            body: Some(b.slice(body)),
            flags: FuncFlags::VARIADIC,
            owner: None,
            template_params: &[],
            span: Span::default(),
        });
        let sections = b.slice(&[Section::Func(def)]);
        Emitter::new(&registry, &operators).emit_ast(&Ast {
            name: "t",
            sections,
        })
    }

    #[test]
    fn walk_is_patched() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = variadic(
            &b,
            &[
                vararg(&b, "start", primitives::VOID),
                vararg(&b, "i", primitives::INT),
                vararg(&b, "end", primitives::VOID),
            ],
        )
        .unwrap();
        let code = program.function(TypeHash::from_function("sum", &[primitives::VARARG])).unwrap();
        let top = code.find(OpCode::VarargTop).unwrap();
        let end = code.find(OpCode::VarargEnd).unwrap();
        assert_eq!(code.instrs[top].val2, end as u64 + 1);
        assert_eq!(code.instrs[end].val2, top as u64);
        let member = code.find(OpCode::VarargMember).unwrap();
        assert_eq!(code.instrs[member].val2, 8);
    }

    #[test]
    fn restart_is_rejected() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let err = variadic(
            &b,
            &[vararg(&b, "start", primitives::VOID), vararg(&b, "start", primitives::VOID)],
        )
        .unwrap_err();
        assert!(matches!(err, CompilationError::VarargRestart { .. }));
    }

    #[test]
    fn end_without_start() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let err = variadic(&b, &[vararg(&b, "end", primitives::VOID)]).unwrap_err();
        assert!(matches!(err, CompilationError::VarargEndWithoutStart { .. }));
    }

    #[test]
    fn member_outside_walk() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let before = variadic(&b, &[vararg(&b, "f", primitives::FLOAT)]).unwrap_err();
        assert!(matches!(before, CompilationError::VarargBeforeStart { ref member, .. } if member == "f"));

        let after = variadic(
            &b,
            &[
                vararg(&b, "start", primitives::VOID),
                vararg(&b, "end", primitives::VOID),
                vararg(&b, "i", primitives::INT),
            ],
        )
        .unwrap_err();
        assert!(matches!(after, CompilationError::VarargAfterEnd { .. }));
    }

    #[test]
    fn unused_block_is_invalid() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let err = variadic(&b, &[]).unwrap_err();
        assert!(matches!(err, CompilationError::InvalidVariadic { ref name, .. } if name == "sum"));
    }
}
