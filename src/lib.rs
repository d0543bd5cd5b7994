//! Tempo: the emission back end of a concurrent, time-aware scripting
//! language.
//!
//! This crate re-exports the workspace crates:
//!
//! - [`core`]: spans, type hashes, flags and errors
//! - [`ast`]: the annotated arena AST produced by the type checker
//! - [`registry`]: type and function descriptors
//! - [`compiler`]: the emitter and the pass pipeline
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use tempo::prelude::*;
//!
//! let registry = TypeRegistry::with_builtins();
//! let operators = OperatorTable::with_builtins();
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//!
//! let x = b.local("x", primitives::INT);
//! let stmts = b.slice(&[b.expr_stmt(b.decl(x))]);
//! let ast = Ast { name: "demo.tm", sections: b.slice(&[Section::Stmts(stmts)]) };
//!
//! let mut pipeline = Pipeline::new(&registry, &operators, PipelineOptions::default());
//! let program = pipeline.run(&ast).unwrap().unwrap();
//! assert_eq!(program.main.name, "demo.tm");
//! ```

pub use tempo_ast as ast;
pub use tempo_compiler as compiler;
pub use tempo_core as core;
pub use tempo_registry as registry;

pub use tempo_compiler::{
    ClassRecord, CompilationError, Diagnostics, Emitter, EmitterOptions, OperatorTable, Pass,
    Pipeline, PipelineOptions, Program,
};

/// Everything needed to build a unit by hand and emit it.
pub mod prelude {
    pub use tempo_ast::{Ast, AstBuilder, Section, Stmt};
    pub use tempo_compiler::bytecode::{Code, Instr, OpCode};
    pub use tempo_compiler::{
        CompilationError, Diagnostics, Emitter, EmitterOptions, OperatorTable, Pass, Pipeline,
        PipelineOptions, Program,
    };
    pub use tempo_core::{Span, TypeHash, primitives};
    pub use tempo_registry::TypeRegistry;
}
