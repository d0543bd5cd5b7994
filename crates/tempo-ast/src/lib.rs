//! Annotated abstract syntax tree consumed by the emitter.
//!
//! All nodes are `Copy` and borrow from a [`bumpalo::Bump`] arena owned by
//! the compilation unit; the whole tree is freed when the arena is dropped.
//! The type checker fills in every annotation ([`ExprInfo`], [`Binding`],
//! [`Storage`]) before the tree reaches emission.

mod builder;
mod decl;
mod expr;
mod stmt;
mod value;

pub use builder::AstBuilder;
pub use decl::{Ast, ClassDef, EnumDef, FuncDef, Section, TypeAliasDef, UnionDef};
pub use expr::{
    BinaryExpr, CallExpr, CastExpr, DeclExpr, Expr, ExprInfo, ExprKind, Ident, IndexExpr,
    Literal, MemberExpr, MemberKind, PostfixExpr, SpawnBody, SpawnExpr, SpawnKind, TernaryExpr,
    UnaryExpr, VarDecl, VarargAccess, VectorExpr, VectorKind,
};
pub use stmt::{
    AutoStmt, Block, CaseStmt, ExprStmt, ForStmt, IfStmt, JumpStmt, LabelStmt, LoopStmt,
    ReturnStmt, Stmt, SwitchStmt, WhileStmt,
};
pub use value::{Binding, CalleeKind, ConstValue, FuncRef, SpecialId, Storage, Value, ValueId};
