//! Statement AST nodes.
//!
//! Provides nodes for:
//! - Expression statements and blocks
//! - Conditionals (if, switch/case/default)
//! - Loops (while/until, do-while/until, counted, for, auto)
//! - Jumps (break, continue, return, goto and labels)

use tempo_core::Span;

use crate::expr::Expr;
use crate::value::Value;

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// Expression statement (`expr;` or `;`).
    Expr(ExprStmt<'ast>),
    /// Block statement.
    Block(Block<'ast>),
    /// If statement.
    If(&'ast IfStmt<'ast>),
    /// while / until loop.
    While(&'ast WhileStmt<'ast>),
    /// do-while / do-until loop.
    DoWhile(&'ast WhileStmt<'ast>),
    /// Counted loop `repeat (n)`.
    Loop(&'ast LoopStmt<'ast>),
    /// C-style for loop.
    For(&'ast ForStmt<'ast>),
    /// Ranged iteration `for (auto x : coll)`.
    Auto(&'ast AutoStmt<'ast>),
    /// Switch statement.
    Switch(&'ast SwitchStmt<'ast>),
    /// `case value:` label.
    Case(CaseStmt<'ast>),
    /// `default:` label.
    Default(JumpStmt),
    /// Break statement.
    Break(JumpStmt),
    /// Continue statement.
    Continue(JumpStmt),
    /// Return statement.
    Return(ReturnStmt<'ast>),
    /// `goto name;`
    Goto(LabelStmt<'ast>),
    /// `name:`
    Label(LabelStmt<'ast>),
}

impl<'ast> Stmt<'ast> {
    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Self::Expr(s) => s.span,
            Self::Block(s) => s.span,
            Self::If(s) => s.span,
            Self::While(s) => s.span,
            Self::DoWhile(s) => s.span,
            Self::Loop(s) => s.span,
            Self::For(s) => s.span,
            Self::Auto(s) => s.span,
            Self::Switch(s) => s.span,
            Self::Case(s) => s.span,
            Self::Default(s) => s.span,
            Self::Break(s) => s.span,
            Self::Continue(s) => s.span,
            Self::Return(s) => s.span,
            Self::Goto(s) => s.span,
            Self::Label(s) => s.span,
        }
    }

    /// Whether this statement only declares class-static values.
    ///
    /// Such statements run once where the class is defined, not per instance.
    pub fn is_static_decl(&self) -> bool {
        match self {
            Self::Expr(ExprStmt {
                expr: Some(expr), ..
            }) => expr.as_decl().is_some_and(|decl| decl.is_static()),
            _ => false,
        }
    }
}

/// An expression statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    /// The expression (None for the empty statement `;`).
    pub expr: Option<&'ast Expr<'ast>>,
    /// Source location.
    pub span: Span,
}

/// A block of statements. Opens a scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    /// Statements in the block.
    pub stmts: &'ast [Stmt<'ast>],
    /// Source location.
    pub span: Span,
}

/// An if statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    /// Condition.
    pub cond: &'ast Expr<'ast>,
    /// Then branch.
    pub then_stmt: &'ast Stmt<'ast>,
    /// Optional else branch.
    pub else_stmt: Option<&'ast Stmt<'ast>>,
    /// Source location.
    pub span: Span,
}

/// while/until and do-while/do-until.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    /// Condition.
    pub cond: &'ast Expr<'ast>,
    /// Body.
    pub body: &'ast Stmt<'ast>,
    /// `until`: loop while the condition is false.
    pub is_until: bool,
    /// Source location.
    pub span: Span,
}

/// Counted loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopStmt<'ast> {
    /// Iteration count, evaluated once.
    pub count: &'ast Expr<'ast>,
    /// Body.
    pub body: &'ast Stmt<'ast>,
    /// Source location.
    pub span: Span,
}

/// C-style for loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForStmt<'ast> {
    /// Initializer.
    pub init: Option<&'ast Stmt<'ast>>,
    /// Condition; absent means forever.
    pub cond: Option<&'ast Expr<'ast>>,
    /// Increment, run before each re-test.
    pub update: Option<&'ast Expr<'ast>>,
    /// Body.
    pub body: &'ast Stmt<'ast>,
    /// Source location.
    pub span: Span,
}

/// Ranged iteration over an array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoStmt<'ast> {
    /// The per-iteration binding.
    pub value: &'ast Value<'ast>,
    /// The iterated collection.
    pub collection: &'ast Expr<'ast>,
    /// Body.
    pub body: &'ast Stmt<'ast>,
    /// `auto @x`: bind a reference to the element instead of a copy.
    pub is_ptr: bool,
    /// Source location.
    pub span: Span,
}

/// Switch statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchStmt<'ast> {
    /// Selector, evaluated once.
    pub selector: &'ast Expr<'ast>,
    /// Body containing case/default labels.
    pub body: &'ast [Stmt<'ast>],
    /// Source location.
    pub span: Span,
}

/// `case value:` label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseStmt<'ast> {
    /// Case value expression.
    pub value: &'ast Expr<'ast>,
    /// Value when the checker could fold it to an integer constant.
    pub constant: Option<i64>,
    /// Source location.
    pub span: Span,
}

/// break, continue and default: a keyword with a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpStmt {
    /// Source location.
    pub span: Span,
}

/// Return statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    /// Optional return value.
    pub value: Option<&'ast Expr<'ast>>,
    /// Source location.
    pub span: Span,
}

/// goto and label statements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelStmt<'ast> {
    /// Label name.
    pub name: &'ast str,
    /// Source location.
    pub span: Span,
}
