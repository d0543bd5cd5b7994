//! Variable declarations.
//!
//! ```text
//! int x;           MemSetImm{x, 8}
//! Osc o;           ObjectInstantiate [PreCtor] RegToMem{o, 8}
//! int a[4][2];     <4> <2> ArrayAlloc{2} RegToMem{a, 8}
//! Osc a[4];        <4> ArrayAlloc{1, 1} <element loop> RegToMem{a, 8}
//! float @r;        MemSetImm{r, 8}
//! global           GlobalSetImm / RegToGlobal
//! field / static   MemberInit / StaticInit, after any allocation
//! ```
//!
//! Slots holding an array or an instantiated object are owned by the frame
//! and released when their scope closes. Globals live in the global segment
//! for the rest of the program.

use tempo_ast::{DeclExpr, Expr, Storage, VarDecl};
use tempo_core::sizes::SZ_INT;
use tempo_core::{CompilationError, TypeHash, primitives};

use crate::bytecode::{Extra, Instr, OpCode};
use crate::emit::Emitter;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// A declaration used as a value pushes its last variable.
    pub(super) fn emit_decl(&mut self, decl: &DeclExpr<'ast>, expr: &Expr<'ast>) -> Result<()> {
        self.emit_decl_vars(decl)?;
        if let Some(last) = decl.vars.last() {
            self.emit_value(last.value, expr.info.addr, last.span)?;
        }
        Ok(())
    }

    /// Declare and initialize every variable, pushing nothing.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn emit_decl_vars(&mut self, decl: &DeclExpr<'ast>) -> Result<()> {
        for var in decl.vars {
            self.emit_var_decl(var)?;
        }
        Ok(())
    }

    pub(crate) fn emit_var_decl(&mut self, var: &VarDecl<'ast>) -> Result<()> {
        let value = var.value;
        let is_array = !var.array_dims.is_empty();
        // A reference binding never allocates; it starts out null.
        let allocates = !value.is_ref && (is_array || self.is_object(value.ty));
        let size = if value.is_ref || is_array {
            SZ_INT
        } else {
            self.size_of(value.ty, var.span)?
        };
        let stored = if is_array {
            primitives::ARRAY
        } else {
            self.resolve_type(value.ty)
        };

        if allocates {
            if is_array {
                self.emit_array_alloc(var)?;
            } else {
                self.emit_instantiate(value.ty, var)?;
            }
        }

        match value.storage {
            Storage::Local => {
                let owned = allocates && self.is_managed(stored);
                let offset = self.code.frame.declare(value.id, size, owned);
                if allocates {
                    self.emit_op(OpCode::RegToMem, u64::from(offset), u64::from(SZ_INT));
                } else {
                    self.emit_op(OpCode::MemSetImm, u64::from(offset), u64::from(size));
                }
            }
            Storage::Global => {
                let offset = self.declare_global(value.id, size);
                if allocates {
                    self.emit_op(OpCode::RegToGlobal, u64::from(offset), u64::from(SZ_INT));
                } else {
                    self.emit_op(OpCode::GlobalSetImm, u64::from(offset), u64::from(size));
                }
            }
            Storage::Member { offset } => {
                self.emit(
                    Instr::new(OpCode::MemberInit)
                        .with(u64::from(offset), u64::from(size))
                        .with_extra(Extra::Type(stored)),
                );
            }
            Storage::Static { offset } => {
                let owner = self.resolve_type(value.owner.unwrap_or(TypeHash::EMPTY));
                self.emit(
                    Instr::new(OpCode::StaticInit)
                        .with(u64::from(offset), u64::from(size))
                        .with_extra(Extra::Types(vec![owner, stored].into())),
                );
            }
        }
        Ok(())
    }

    /// `<dims...> ArrayAlloc{ndims, object elements}`, then the class
    /// initializer of every element when the element class has one:
    ///
    /// ```text
    /// top:  ArrayTop -> exit
    ///       PreCtor <initializer>
    ///       ArrayBottom
    ///       Goto -> top
    /// exit: ArrayPost
    /// ```
    fn emit_array_alloc(&mut self, var: &VarDecl<'ast>) -> Result<()> {
        for dim in var.array_dims {
            self.emit_expr(dim, false)?;
        }
        let elem = self.resolve_type(var.value.ty);
        let objects = self.is_managed(elem);
        self.emit(
            Instr::new(OpCode::ArrayAlloc)
                .with(var.array_dims.len() as u64, u64::from(objects))
                .with_extra(Extra::Type(elem)),
        );
        if !objects {
            return Ok(());
        }
        if let Some(record) = self.ensure_class(elem, var.span)? {
            let top = self.emit(Instr::new(OpCode::ArrayTop).with_extra(Extra::Type(elem)));
            self.emit(Instr::new(OpCode::PreCtor).with_extra(Extra::Code(record.initializer)));
            self.emit_op(OpCode::ArrayBottom, 0, 0);
            self.emit_op(OpCode::Goto, top as u64, 0);
            self.patch_here(top)?;
            self.emit_op(OpCode::ArrayPost, 0, 0);
        }
        Ok(())
    }

    /// Allocate an object and run its class initializer, if it has one.
    fn emit_instantiate(&mut self, ty: TypeHash, var: &VarDecl<'ast>) -> Result<()> {
        let ty = self.resolve_type(ty);
        let record = self.ensure_class(ty, var.span)?;
        self.emit(Instr::new(OpCode::ObjectInstantiate).with_extra(Extra::Type(ty)));
        if let Some(record) = record {
            self.emit(Instr::new(OpCode::PreCtor).with_extra(Extra::Code(record.initializer)));
        }
        Ok(())
    }
}
