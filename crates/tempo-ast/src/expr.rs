//! Expression AST nodes.
//!
//! Every [`Expr`] carries the annotations the type checker attaches in
//! [`ExprInfo`]: the resolved type, whether the expression is used as an
//! address (assignment target), and an optional implicit cast target.

use tempo_core::{Span, TypeHash};

use crate::decl::FuncDef;
use crate::stmt::Stmt;
use crate::value::{Binding, FuncRef, Value};

/// Type-checker annotations for one expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprInfo {
    /// Resolved type of the expression.
    pub ty: TypeHash,
    /// The expression is used as an assignment target; emit its address.
    pub addr: bool,
    /// Implicit conversion the checker requires after evaluation.
    pub cast_to: Option<TypeHash>,
}

impl ExprInfo {
    /// An rvalue of the given type.
    pub fn of(ty: TypeHash) -> Self {
        Self {
            ty,
            addr: false,
            cast_to: None,
        }
    }

    /// An lvalue (address) of the given type.
    pub fn addr_of(ty: TypeHash) -> Self {
        Self {
            ty,
            addr: true,
            cast_to: None,
        }
    }

    /// The type left on the stack once any implicit cast has run.
    pub fn final_type(&self) -> TypeHash {
        self.cast_to.unwrap_or(self.ty)
    }
}

/// An annotated expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expr<'ast> {
    /// The kind of expression.
    pub kind: ExprKind<'ast>,
    /// Checker annotations.
    pub info: ExprInfo,
    /// Source location.
    pub span: Span,
}

impl<'ast> Expr<'ast> {
    /// Create an expression.
    pub fn new(kind: ExprKind<'ast>, info: ExprInfo, span: Span) -> Self {
        Self { kind, info, span }
    }

    /// The call node, if this expression is a call.
    pub fn as_call(&self) -> Option<&'ast CallExpr<'ast>> {
        match self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// The declaration node, if this expression is a declaration.
    pub fn as_decl(&self) -> Option<&'ast DeclExpr<'ast>> {
        match self.kind {
            ExprKind::Decl(decl) => Some(decl),
            _ => None,
        }
    }
}

/// Expression kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExprKind<'ast> {
    /// Literal value.
    Literal(Literal<'ast>),
    /// Identifier.
    Ident(Ident<'ast>),
    /// Array literal `[a, b, c]`.
    Array(&'ast [Expr<'ast>]),
    /// Subscript `base[i][j]`.
    Index(&'ast IndexExpr<'ast>),
    /// Tuple literal.
    Tuple(&'ast [Expr<'ast>]),
    /// complex, polar, vec3 or vec4 literal.
    Vector(&'ast VectorExpr<'ast>),
    /// Print expression `<<< a, b >>>`.
    Gack(&'ast [Expr<'ast>]),
    /// Anonymous function.
    Lambda(&'ast FuncDef<'ast>),
    /// Type query `typeof(e)`.
    TypeOf(&'ast Expr<'ast>),
    /// Binary operation.
    Binary(&'ast BinaryExpr<'ast>),
    /// Prefix unary operation.
    Unary(&'ast UnaryExpr<'ast>),
    /// Postfix operation.
    Postfix(&'ast PostfixExpr<'ast>),
    /// Explicit cast `e $ T`.
    Cast(&'ast CastExpr<'ast>),
    /// Conditional `c ? a : b`.
    Ternary(&'ast TernaryExpr<'ast>),
    /// Function call.
    Call(&'ast CallExpr<'ast>),
    /// Member access `base.name`.
    Member(&'ast MemberExpr<'ast>),
    /// Variable declaration.
    Decl(&'ast DeclExpr<'ast>),
    /// spork / fork.
    Spawn(&'ast SpawnExpr<'ast>),
    /// `vararg.<member>` inside a variadic function.
    Vararg(VarargAccess<'ast>),
}

/// Literal values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'ast> {
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Character literal, emitted as its code point.
    Char(char),
    /// String literal.
    Str(&'ast str),
    /// The null handle.
    Nil,
}

/// An identifier and what it is bound to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ident<'ast> {
    /// Source name.
    pub name: &'ast str,
    /// Resolved binding.
    pub binding: Binding<'ast>,
}

/// Subscript expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    /// The indexed array or tuple.
    pub base: &'ast Expr<'ast>,
    /// One index per dimension.
    pub indices: &'ast [Expr<'ast>],
    /// Byte offset of the element when `base` is a tuple of known shape.
    pub tuple_offset: Option<u32>,
}

/// The four built-in vector kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    /// `#(re, im)`
    Complex,
    /// `%(mod, phase)`
    Polar,
    /// `@(x, y, z)`
    Vec3,
    /// `@(x, y, z, w)`
    Vec4,
}

impl VectorKind {
    /// Number of float components.
    pub fn dimensions(self) -> usize {
        match self {
            VectorKind::Complex | VectorKind::Polar => 2,
            VectorKind::Vec3 => 3,
            VectorKind::Vec4 => 4,
        }
    }
}

/// Vector literal. Missing trailing components are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorExpr<'ast> {
    /// Vector kind.
    pub kind: VectorKind,
    /// Components, already converted to float by the checker.
    pub items: &'ast [Expr<'ast>],
}

/// Binary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    /// Left operand.
    pub lhs: &'ast Expr<'ast>,
    /// Operator symbol, e.g. `+` or `=>`.
    pub op: &'ast str,
    /// Right operand.
    pub rhs: &'ast Expr<'ast>,
}

/// Prefix unary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    /// Operator symbol.
    pub op: &'ast str,
    /// Operand.
    pub operand: &'ast Expr<'ast>,
}

/// Postfix operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostfixExpr<'ast> {
    /// Operand.
    pub operand: &'ast Expr<'ast>,
    /// Operator symbol, `++` or `--`.
    pub op: &'ast str,
}

/// Explicit cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    /// Casted expression.
    pub expr: &'ast Expr<'ast>,
    /// Target type.
    pub target: TypeHash,
}

/// Conditional expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TernaryExpr<'ast> {
    /// Condition.
    pub cond: &'ast Expr<'ast>,
    /// Value when true.
    pub if_true: &'ast Expr<'ast>,
    /// Value when false.
    pub if_false: &'ast Expr<'ast>,
}

/// Function call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    /// Callee expression: identifier, member or function pointer.
    pub callee: &'ast Expr<'ast>,
    /// Arguments in source order.
    pub args: &'ast [Expr<'ast>],
    /// Resolved callee.
    pub func: FuncRef<'ast>,
    /// Number of declared parameters when the callee is variadic.
    ///
    /// Arguments past this count are packed into the vararg block.
    pub variadic_from: Option<usize>,
}

/// How a member access resolves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemberKind<'ast> {
    /// Instance field.
    Field {
        /// Byte offset in the object.
        offset: u32,
    },
    /// Class-level field; the base is not evaluated.
    Static {
        /// Owning class.
        owner: TypeHash,
        /// Byte offset in static storage.
        offset: u32,
    },
    /// Virtual method looked up through the receiver.
    Method {
        /// Index in the owner's method table.
        vt_index: u32,
    },
    /// Static method; the base is not evaluated.
    StaticFunc(FuncRef<'ast>),
    /// Component of a complex, polar or vector value.
    Component {
        /// Component index.
        index: u32,
    },
    /// Host-provided member, emitted through the operator table.
    Builtin,
}

/// Member access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    /// Receiver or type expression.
    pub base: &'ast Expr<'ast>,
    /// Member name.
    pub name: &'ast str,
    /// Resolution.
    pub kind: MemberKind<'ast>,
}

/// One declared variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl<'ast> {
    /// The declared value.
    pub value: &'ast Value<'ast>,
    /// Array dimension sizes, outermost first. Empty for scalars; otherwise
    /// the value's type is the element type.
    pub array_dims: &'ast [Expr<'ast>],
    /// Source location.
    pub span: Span,
}

/// Declaration of one or more variables of one type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeclExpr<'ast> {
    /// Declared type (element type for arrays).
    pub ty: TypeHash,
    /// Declared variables.
    pub vars: &'ast [VarDecl<'ast>],
}

impl DeclExpr<'_> {
    /// Whether every declared variable is class-static.
    pub fn is_static(&self) -> bool {
        !self.vars.is_empty()
            && self
                .vars
                .iter()
                .all(|v| matches!(v.value.storage, crate::Storage::Static { .. }))
    }
}

/// Spawn-and-continue or spawn-and-join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    /// `spork ~`: the caller keeps running.
    Spork,
    /// `fork ~`: the caller may join and receive a value.
    Fork,
}

/// What a spawn runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnBody<'ast> {
    /// A deferred call.
    Call(&'ast CallExpr<'ast>),
    /// An inline block.
    Block(&'ast [Stmt<'ast>]),
}

/// Concurrent invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnExpr<'ast> {
    /// Spork or fork.
    pub kind: SpawnKind,
    /// Body.
    pub body: SpawnBody<'ast>,
    /// The body refers to the enclosing method's receiver.
    pub uses_this: bool,
    /// Outer values the block body reads. Copied into the new frame.
    pub captures: &'ast [&'ast Value<'ast>],
    /// Result type of a deferred call; void for a block.
    pub ret: TypeHash,
}

/// Access to the variadic argument block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarargAccess<'ast> {
    /// `start`, `end`, or a typed read such as `i` or `f`.
    pub member: &'ast str,
}
