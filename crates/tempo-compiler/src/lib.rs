//! Tempo bytecode emitter.
//!
//! Turns a type-checked [`tempo_ast::Ast`] into linear bytecode for the
//! stack VM that runs tempo's shreds.
//!
//! ## Architecture
//!
//! - **Emitter**: one context per unit; a stack of open codes, one per
//!   function body, class initializer and spawned body
//! - **Passes**: a named pass registry, `check` then `emit` by default
//!
//! ## Modules
//!
//! - [`bytecode`]: Instructions, opcodes and finished [`Code`](bytecode::Code)
//! - [`frame`]: Slot allocation and scope-exit release lists
//! - [`pending`]: Forward branches waiting for their target
//! - [`emit`]: The emission context, jump and label bookkeeping
//! - [`operators`]: The operator table shared by builtins and overloads
//! - [`template`]: Lazy specialization of generic functions and classes
//! - [`ticket`]: Placeholders for code referenced before it is emitted
//! - [`passes`]: The pass pipeline
//! - [`diagnostics`]: Errors and warnings for the user

pub mod bytecode;
mod class;
pub mod diagnostics;
pub mod emit;
mod expr;
pub mod frame;
mod function;
pub mod operators;
pub mod options;
pub mod passes;
pub mod pending;
pub mod program;
mod spawn;
mod stmt;
pub mod template;
pub mod ticket;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use emit::Emitter;
pub use frame::Frame;
pub use operators::{OperatorImpl, OperatorKey, OperatorTable};
pub use options::{EmitterOptions, PipelineOptions};
pub use passes::{Hook, Pass, Pipeline, PipelineError};
pub use pending::PendingBranches;
pub use program::{ClassRecord, Program};
pub use ticket::Ticket;

// Re-export CompilationError from core for convenience
pub use tempo_core::CompilationError;
