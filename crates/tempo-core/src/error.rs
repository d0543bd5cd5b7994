//! Error types for emission and pass execution.
//!
//! Every emission function returns `Result<T, CompilationError>` and callers
//! propagate with `?`. The first error aborts the compilation unit.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while populating the type registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A referenced type was not found.
    #[error("type not found: {0}")]
    TypeNotFound(String),

    /// A type with this name already exists.
    #[error("duplicate type: {0}")]
    DuplicateType(String),

    /// A class would inherit from itself.
    #[error("circular inheritance for '{0}'")]
    CircularInheritance(String),
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Errors detected while emitting a compilation unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// A `case` or `default` label outside any switch.
    #[error("at {span}: illegal case")]
    CaseOutsideSwitch {
        /// Where the label appeared.
        span: Span,
    },

    /// Two constant case labels with the same value.
    #[error("at {span}: duplicate case value '{value}'")]
    DuplicateCase {
        /// The duplicated value.
        value: i64,
        /// Where the second label appeared.
        span: Span,
    },

    /// `break` outside a loop or switch.
    #[error("at {span}: 'break' outside of loop or switch")]
    BreakOutsideLoop {
        /// Where the statement appeared.
        span: Span,
    },

    /// `continue` outside a loop.
    #[error("at {span}: 'continue' outside of loop")]
    ContinueOutsideLoop {
        /// Where the statement appeared.
        span: Span,
    },

    /// A label no jump refers to.
    #[error("at {span}: label '{name}' defined but not used")]
    UnusedLabel {
        /// The label name.
        name: String,
        /// Where the label was defined.
        span: Span,
    },

    /// A jump to a label that is never defined in the same function.
    #[error("at {span}: undefined label '{name}'")]
    UndefinedLabel {
        /// The label name.
        name: String,
        /// Where the jump appeared.
        span: Span,
    },

    /// A forward jump that would skip the release of live objects.
    #[error("at {span}: goto '{name}' leaves a scope holding objects")]
    GotoCrossesScope {
        /// The label name.
        name: String,
        /// Where the jump appeared.
        span: Span,
    },

    /// `vararg.start` used twice in one function.
    #[error("at {span}: vararg.start already used")]
    VarargRestart {
        /// Where the second start appeared.
        span: Span,
    },

    /// `vararg.end` without a preceding `vararg.start`.
    #[error("at {span}: vararg.start not used before vararg.end")]
    VarargEndWithoutStart {
        /// Where the end appeared.
        span: Span,
    },

    /// A vararg member read before `vararg.start`.
    #[error("at {span}: vararg.{member} used before vararg.start")]
    VarargBeforeStart {
        /// The member name.
        member: String,
        /// Where the read appeared.
        span: Span,
    },

    /// A vararg member read after `vararg.end`.
    #[error("at {span}: vararg.{member} used after vararg.end")]
    VarargAfterEnd {
        /// The member name.
        member: String,
        /// Where the read appeared.
        span: Span,
    },

    /// A variadic function whose body does not walk its arguments.
    #[error("at {span}: invalid variadic use in '{name}'")]
    InvalidVariadic {
        /// The function name.
        name: String,
        /// Where the function was defined.
        span: Span,
    },

    /// No operator registered for the operand types.
    #[error("at {span}: no operator '{op}' for types '{left}' and '{right}'")]
    NoOperator {
        /// The operator symbol.
        op: String,
        /// Left operand type name.
        left: String,
        /// Right operand type name.
        right: String,
        /// Where the operation occurred.
        span: Span,
    },

    /// A referenced type is not registered.
    #[error("at {span}: unknown type '{name}'")]
    UnknownType {
        /// The type name or hash.
        name: String,
        /// Where the type was referenced.
        span: Span,
    },

    /// A called function has neither compiled code nor a definition in the unit.
    #[error("at {span}: unknown function '{name}'")]
    UnknownFunction {
        /// The function name.
        name: String,
        /// Where the function was referenced.
        span: Span,
    },

    /// A generic was used with concrete types but nothing can be specialized.
    #[error("at {span}: missing template definition for '{name}'")]
    MissingSpecialization {
        /// The template name.
        name: String,
        /// Where the specialization was requested.
        span: Span,
    },

    /// A custom pass reported failure.
    #[error("pass '{pass}' failed: {message}")]
    PassFailed {
        /// The pass name.
        pass: String,
        /// The failure message.
        message: String,
    },

    /// Internal invariant violation.
    #[error("internal error: {message}")]
    Internal {
        /// The error message.
        message: String,
    },
}

impl CompilationError {
    /// The source location of this error, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::CaseOutsideSwitch { span }
            | Self::DuplicateCase { span, .. }
            | Self::BreakOutsideLoop { span }
            | Self::ContinueOutsideLoop { span }
            | Self::UnusedLabel { span, .. }
            | Self::UndefinedLabel { span, .. }
            | Self::GotoCrossesScope { span, .. }
            | Self::VarargRestart { span }
            | Self::VarargEndWithoutStart { span }
            | Self::VarargBeforeStart { span, .. }
            | Self::VarargAfterEnd { span, .. }
            | Self::InvalidVariadic { span, .. }
            | Self::NoOperator { span, .. }
            | Self::UnknownType { span, .. }
            | Self::UnknownFunction { span, .. }
            | Self::MissingSpecialization { span, .. } => Some(*span),
            Self::PassFailed { .. } | Self::Internal { .. } => None,
        }
    }

    /// Shorthand for an internal invariant violation.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
