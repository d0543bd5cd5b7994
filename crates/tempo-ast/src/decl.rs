//! Top-level sections and definitions.

use tempo_core::{FuncFlags, Span, TypeHash};

use crate::stmt::Stmt;
use crate::value::Value;

/// A compilation unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ast<'ast> {
    /// Unit name, usually the source file.
    pub name: &'ast str,
    /// Sections in source order.
    pub sections: &'ast [Section<'ast>],
}

/// One top-level (or class-body) item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section<'ast> {
    /// A run of statements.
    Stmts(&'ast [Stmt<'ast>]),
    /// Function definition.
    Func(&'ast FuncDef<'ast>),
    /// Class definition.
    Class(&'ast ClassDef<'ast>),
    /// Enum definition.
    Enum(&'ast EnumDef<'ast>),
    /// Union definition.
    Union(&'ast UnionDef<'ast>),
    /// Type alias.
    TypeAlias(&'ast TypeAliasDef<'ast>),
}

/// Function definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuncDef<'ast> {
    /// Function name.
    pub name: &'ast str,
    /// Function identity.
    pub hash: TypeHash,
    /// Parameters in order.
    pub params: &'ast [&'ast Value<'ast>],
    /// Return type.
    pub ret: TypeHash,
    /// Body; absent for host-provided functions.
    pub body: Option<&'ast [Stmt<'ast>]>,
    /// Flags.
    pub flags: FuncFlags,
    /// Owning class for methods.
    pub owner: Option<TypeHash>,
    /// Type parameters of a generic function.
    pub template_params: &'ast [TypeHash],
    /// Source location.
    pub span: Span,
}

impl FuncDef<'_> {
    /// Whether slot 0 holds a receiver.
    pub fn is_member(&self) -> bool {
        self.flags.contains(FuncFlags::MEMBER) && !self.flags.contains(FuncFlags::STATIC)
    }

    /// Whether emission waits for a concrete use.
    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty()
    }
}

/// Class definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDef<'ast> {
    /// Class name.
    pub name: &'ast str,
    /// Class identity.
    pub ty: TypeHash,
    /// Parent class.
    pub parent: Option<TypeHash>,
    /// Body: fields, methods and nested definitions.
    pub body: &'ast [Section<'ast>],
    /// Type parameters of a generic class.
    pub template_params: &'ast [TypeHash],
    /// Source location.
    pub span: Span,
}

impl ClassDef<'_> {
    /// Whether emission waits for a concrete instantiation.
    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty()
    }
}

/// Enum definition. Values carry their constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumDef<'ast> {
    /// Enum name.
    pub name: &'ast str,
    /// Enum identity.
    pub ty: TypeHash,
    /// Enumerators.
    pub values: &'ast [&'ast Value<'ast>],
    /// Source location.
    pub span: Span,
}

/// Union definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnionDef<'ast> {
    /// Union identity.
    pub ty: TypeHash,
    /// Alternatives, all at offset 0.
    pub members: &'ast [&'ast Value<'ast>],
    /// Declared instance, e.g. `union { int i; float f; } u;`.
    pub instance: Option<&'ast Value<'ast>>,
    /// Source location.
    pub span: Span,
}

/// Type alias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeAliasDef<'ast> {
    /// Alias name.
    pub name: &'ast str,
    /// Aliased type.
    pub ty: TypeHash,
    /// Class body to emit when the alias names a class specialization.
    pub class: Option<&'ast ClassDef<'ast>>,
    /// Source location.
    pub span: Span,
}
