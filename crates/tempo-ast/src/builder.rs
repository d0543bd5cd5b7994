//! Arena-backed construction helpers.
//!
//! The type checker (and tests) build annotated trees through [`AstBuilder`].
//! Every node lives in the caller's [`Bump`] and is freed with it.
//!
//! ```
//! use bumpalo::Bump;
//! use tempo_ast::AstBuilder;
//! use tempo_core::primitives;
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let sum = b.binary(b.int(1), "+", b.int(1), primitives::INT);
//! let stmt = b.expr_stmt(sum);
//! assert!(matches!(stmt, tempo_ast::Stmt::Expr(_)));
//! ```

use std::cell::Cell;

use bumpalo::Bump;
use tempo_core::{Span, TypeHash, primitives};

use crate::expr::*;
use crate::stmt::*;
use crate::value::{Binding, FuncRef, SpecialId, Storage, Value, ValueId};

/// Allocates annotated AST nodes in an arena.
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    next_id: Cell<u32>,
    span: Cell<Span>,
}

impl<'ast> AstBuilder<'ast> {
    /// Create a builder over an arena.
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            next_id: Cell::new(0),
            span: Cell::new(Span::new(1, 1, 0)),
        }
    }

    /// The backing arena.
    pub fn arena(&self) -> &'ast Bump {
        self.arena
    }

    /// Set the span attached to subsequently built nodes.
    pub fn at(&self, line: u32, col: u32) -> &Self {
        self.span.set(Span::new(line, col, 1));
        self
    }

    /// The span attached to new nodes.
    pub fn span(&self) -> Span {
        self.span.get()
    }

    /// Move a value into the arena.
    pub fn alloc<T>(&self, value: T) -> &'ast T {
        self.arena.alloc(value)
    }

    /// Copy a slice into the arena.
    pub fn slice<T: Copy>(&self, items: &[T]) -> &'ast [T] {
        self.arena.alloc_slice_copy(items)
    }

    /// Copy a string into the arena.
    pub fn str(&self, s: &str) -> &'ast str {
        self.arena.alloc_str(s)
    }

    // =========================================================================
    // Values
    // =========================================================================

    fn fresh_id(&self) -> ValueId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        ValueId(id)
    }

    /// A value with the given storage.
    pub fn value(&self, name: &str, ty: TypeHash, storage: Storage) -> &'ast Value<'ast> {
        self.alloc(Value {
            id: self.fresh_id(),
            name: self.str(name),
            ty,
            storage,
            is_ref: false,
            owner: None,
            constant: None,
        })
    }

    /// A plain local.
    pub fn local(&self, name: &str, ty: TypeHash) -> &'ast Value<'ast> {
        self.value(name, ty, Storage::Local)
    }

    /// A reference-binding local.
    pub fn ref_local(&self, name: &str, ty: TypeHash) -> &'ast Value<'ast> {
        let value = *self.local(name, ty);
        self.alloc(Value {
            is_ref: true,
            ..value
        })
    }

    /// An instance field of `owner`.
    pub fn field(&self, name: &str, ty: TypeHash, owner: TypeHash, offset: u32) -> &'ast Value<'ast> {
        let value = *self.value(name, ty, Storage::Member { offset });
        self.alloc(Value {
            owner: Some(owner),
            ..value
        })
    }

    /// A class-static field of `owner`.
    pub fn static_field(
        &self,
        name: &str,
        ty: TypeHash,
        owner: TypeHash,
        offset: u32,
    ) -> &'ast Value<'ast> {
        let value = *self.value(name, ty, Storage::Static { offset });
        self.alloc(Value {
            owner: Some(owner),
            ..value
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// An expression of the given kind and type.
    pub fn expr(&self, kind: ExprKind<'ast>, ty: TypeHash) -> Expr<'ast> {
        Expr::new(kind, ExprInfo::of(ty), self.span())
    }

    /// Mark an expression as an assignment target.
    pub fn addr(&self, expr: Expr<'ast>) -> Expr<'ast> {
        Expr {
            info: ExprInfo {
                addr: true,
                ..expr.info
            },
            ..expr
        }
    }

    /// Attach an implicit cast.
    pub fn implicit(&self, expr: Expr<'ast>, to: TypeHash) -> Expr<'ast> {
        Expr {
            info: ExprInfo {
                cast_to: Some(to),
                ..expr.info
            },
            ..expr
        }
    }

    /// Integer literal.
    pub fn int(&self, value: i64) -> Expr<'ast> {
        self.expr(ExprKind::Literal(Literal::Int(value)), primitives::INT)
    }

    /// Float literal.
    pub fn float(&self, value: f64) -> Expr<'ast> {
        self.expr(ExprKind::Literal(Literal::Float(value)), primitives::FLOAT)
    }

    /// String literal.
    pub fn string(&self, value: &str) -> Expr<'ast> {
        self.expr(
            ExprKind::Literal(Literal::Str(self.str(value))),
            primitives::STRING,
        )
    }

    /// Identifier bound to a value.
    pub fn ident(&self, value: &'ast Value<'ast>) -> Expr<'ast> {
        self.expr(
            ExprKind::Ident(Ident {
                name: value.name,
                binding: Binding::Value(value),
            }),
            value.ty,
        )
    }

    /// Identifier bound to a function.
    pub fn func_ident(&self, func: FuncRef<'ast>) -> Expr<'ast> {
        self.expr(
            ExprKind::Ident(Ident {
                name: func.name,
                binding: Binding::Func(func),
            }),
            primitives::FUNCTION,
        )
    }

    /// Special identifier.
    pub fn special(&self, name: &str, id: SpecialId, ty: TypeHash) -> Expr<'ast> {
        self.expr(
            ExprKind::Ident(Ident {
                name: self.str(name),
                binding: Binding::Special(id),
            }),
            ty,
        )
    }

    /// Binary operation.
    pub fn binary(&self, lhs: Expr<'ast>, op: &str, rhs: Expr<'ast>, ty: TypeHash) -> Expr<'ast> {
        self.expr(
            ExprKind::Binary(self.alloc(BinaryExpr {
                lhs: self.alloc(lhs),
                op: self.str(op),
                rhs: self.alloc(rhs),
            })),
            ty,
        )
    }

    /// Prefix unary operation.
    pub fn unary(&self, op: &str, operand: Expr<'ast>, ty: TypeHash) -> Expr<'ast> {
        self.expr(
            ExprKind::Unary(self.alloc(UnaryExpr {
                op: self.str(op),
                operand: self.alloc(operand),
            })),
            ty,
        )
    }

    /// Postfix operation.
    pub fn postfix(&self, operand: Expr<'ast>, op: &str) -> Expr<'ast> {
        let ty = operand.info.ty;
        self.expr(
            ExprKind::Postfix(self.alloc(PostfixExpr {
                operand: self.alloc(operand),
                op: self.str(op),
            })),
            ty,
        )
    }

    /// Declaration of a single variable.
    pub fn decl(&self, value: &'ast Value<'ast>) -> Expr<'ast> {
        self.decl_array(value, &[])
    }

    /// Declaration of an array variable.
    pub fn decl_array(&self, value: &'ast Value<'ast>, dims: &[Expr<'ast>]) -> Expr<'ast> {
        let var = VarDecl {
            value,
            array_dims: self.slice(dims),
            span: self.span(),
        };
        self.expr(
            ExprKind::Decl(self.alloc(DeclExpr {
                ty: value.ty,
                vars: self.slice(&[var]),
            })),
            value.ty,
        )
    }

    /// Call through an identifier.
    pub fn call(&self, func: FuncRef<'ast>, args: &[Expr<'ast>], ret: TypeHash) -> Expr<'ast> {
        let callee = self.func_ident(func);
        self.call_with(callee, func, args, ret)
    }

    /// Call through an arbitrary callee expression.
    pub fn call_with(
        &self,
        callee: Expr<'ast>,
        func: FuncRef<'ast>,
        args: &[Expr<'ast>],
        ret: TypeHash,
    ) -> Expr<'ast> {
        self.expr(
            ExprKind::Call(self.alloc(CallExpr {
                callee: self.alloc(callee),
                args: self.slice(args),
                func,
                variadic_from: None,
            })),
            ret,
        )
    }

    /// Member access.
    pub fn member(
        &self,
        base: Expr<'ast>,
        name: &str,
        kind: MemberKind<'ast>,
        ty: TypeHash,
    ) -> Expr<'ast> {
        self.expr(
            ExprKind::Member(self.alloc(MemberExpr {
                base: self.alloc(base),
                name: self.str(name),
                kind,
            })),
            ty,
        )
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Expression statement.
    pub fn expr_stmt(&self, expr: Expr<'ast>) -> Stmt<'ast> {
        Stmt::Expr(ExprStmt {
            expr: Some(self.alloc(expr)),
            span: self.span(),
        })
    }

    /// Block statement.
    pub fn block(&self, stmts: &[Stmt<'ast>]) -> Stmt<'ast> {
        Stmt::Block(Block {
            stmts: self.slice(stmts),
            span: self.span(),
        })
    }

    /// If statement.
    pub fn if_stmt(
        &self,
        cond: Expr<'ast>,
        then_stmt: Stmt<'ast>,
        else_stmt: Option<Stmt<'ast>>,
    ) -> Stmt<'ast> {
        Stmt::If(self.alloc(IfStmt {
            cond: self.alloc(cond),
            then_stmt: self.alloc(then_stmt),
            else_stmt: else_stmt.map(|s| self.alloc(s)),
            span: self.span(),
        }))
    }

    /// while (or until) loop.
    pub fn while_stmt(&self, cond: Expr<'ast>, body: Stmt<'ast>, is_until: bool) -> Stmt<'ast> {
        Stmt::While(self.alloc(WhileStmt {
            cond: self.alloc(cond),
            body: self.alloc(body),
            is_until,
            span: self.span(),
        }))
    }

    /// do-while (or do-until) loop.
    pub fn do_while_stmt(&self, body: Stmt<'ast>, cond: Expr<'ast>, is_until: bool) -> Stmt<'ast> {
        Stmt::DoWhile(self.alloc(WhileStmt {
            cond: self.alloc(cond),
            body: self.alloc(body),
            is_until,
            span: self.span(),
        }))
    }

    /// for loop.
    pub fn for_stmt(
        &self,
        init: Option<Stmt<'ast>>,
        cond: Option<Expr<'ast>>,
        update: Option<Expr<'ast>>,
        body: Stmt<'ast>,
    ) -> Stmt<'ast> {
        Stmt::For(self.alloc(ForStmt {
            init: init.map(|s| self.alloc(s)),
            cond: cond.map(|e| self.alloc(e)),
            update: update.map(|e| self.alloc(e)),
            body: self.alloc(body),
            span: self.span(),
        }))
    }

    /// Counted loop.
    pub fn loop_stmt(&self, count: Expr<'ast>, body: Stmt<'ast>) -> Stmt<'ast> {
        Stmt::Loop(self.alloc(LoopStmt {
            count: self.alloc(count),
            body: self.alloc(body),
            span: self.span(),
        }))
    }

    /// Switch statement.
    pub fn switch_stmt(&self, selector: Expr<'ast>, body: &[Stmt<'ast>]) -> Stmt<'ast> {
        Stmt::Switch(self.alloc(SwitchStmt {
            selector: self.alloc(selector),
            body: self.slice(body),
            span: self.span(),
        }))
    }

    /// `case n:` with a constant value.
    pub fn case_int(&self, value: i64) -> Stmt<'ast> {
        Stmt::Case(CaseStmt {
            value: self.alloc(self.int(value)),
            constant: Some(value),
            span: self.span(),
        })
    }

    /// `case e:` with a runtime value.
    pub fn case_dyn(&self, value: Expr<'ast>) -> Stmt<'ast> {
        Stmt::Case(CaseStmt {
            value: self.alloc(value),
            constant: None,
            span: self.span(),
        })
    }

    /// `default:`
    pub fn default_stmt(&self) -> Stmt<'ast> {
        Stmt::Default(JumpStmt { span: self.span() })
    }

    /// `break;`
    pub fn break_stmt(&self) -> Stmt<'ast> {
        Stmt::Break(JumpStmt { span: self.span() })
    }

    /// `continue;`
    pub fn continue_stmt(&self) -> Stmt<'ast> {
        Stmt::Continue(JumpStmt { span: self.span() })
    }

    /// Return statement.
    pub fn return_stmt(&self, value: Option<Expr<'ast>>) -> Stmt<'ast> {
        Stmt::Return(ReturnStmt {
            value: value.map(|e| self.alloc(e)),
            span: self.span(),
        })
    }

    /// `goto name;`
    pub fn goto_stmt(&self, name: &str) -> Stmt<'ast> {
        Stmt::Goto(LabelStmt {
            name: self.str(name),
            span: self.span(),
        })
    }

    /// `name:`
    pub fn label_stmt(&self, name: &str) -> Stmt<'ast> {
        Stmt::Label(LabelStmt {
            name: self.str(name),
            span: self.span(),
        })
    }
}
