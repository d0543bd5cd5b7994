//! The compilation pass pipeline.
//!
//! A unit runs through an ordered sequence of named passes. The default
//! sequence is:
//!
//! - `check`: semantic analysis, supplied by the front end as a hook
//! - `emit`: bytecode emission through the [`Emitter`]
//!
//! Further passes are registered by name and placed in the sequence with
//! [`Pipeline::set_active_sequence`]. The first failing pass stops the unit.

use std::fmt;

use rustc_hash::FxHashMap;
use tempo_ast::Ast;
use tempo_core::CompilationError;
use tempo_registry::TypeRegistry;
use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::emit::Emitter;
use crate::operators::OperatorTable;
use crate::options::{DEFAULT_PASSES, PipelineOptions};
use crate::program::Program;

type Result<T> = std::result::Result<T, CompilationError>;

/// A pass body supplied from outside the emitter.
pub type Hook = Box<dyn Fn(&Ast<'_>, &mut Diagnostics) -> Result<()>>;

/// One compilation pass.
pub enum Pass {
    /// Semantic analysis. Without a hook the unit is taken as already checked.
    Check(Option<Hook>),
    /// Bytecode emission.
    Emit,
    /// Any other pass.
    Custom(Hook),
}

impl fmt::Debug for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Check(hook) => f
                .debug_tuple("Check")
                .field(&hook.as_ref().map(|_| "<hook>"))
                .finish(),
            Pass::Emit => f.write_str("Emit"),
            Pass::Custom(_) => f.write_str("Custom(<hook>)"),
        }
    }
}

/// Errors configuring a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A name in the requested sequence was never registered.
    #[error("unknown compilation pass '{name}'")]
    UnknownPass {
        /// The unknown name.
        name: String,
    },
}

/// Named passes plus the active sequence, over one emitter.
pub struct Pipeline<'reg, 'ast> {
    passes: FxHashMap<String, Pass>,
    active: Vec<String>,
    emitter: Emitter<'reg, 'ast>,
    diagnostics: Diagnostics,
}

impl<'reg, 'ast> Pipeline<'reg, 'ast> {
    /// Create a pipeline with the default passes registered.
    ///
    /// An unknown name in `options.passes` falls back to the default
    /// sequence with a warning.
    pub fn new(
        registry: &'reg TypeRegistry,
        operators: &'reg OperatorTable,
        options: PipelineOptions,
    ) -> Self {
        let mut passes = FxHashMap::default();
        passes.insert("check".to_string(), Pass::Check(None));
        passes.insert("emit".to_string(), Pass::Emit);
        let mut pipeline = Self {
            passes,
            active: Vec::new(),
            emitter: Emitter::new(registry, operators).with_options(options.emitter),
            diagnostics: Diagnostics::new(),
        };
        let _ = pipeline.set_active_sequence(&options.passes);
        pipeline
    }

    /// Register a pass under `name`, returning the pass it replaces.
    pub fn register(&mut self, name: impl Into<String>, pass: Pass) -> Option<Pass> {
        self.passes.insert(name.into(), pass)
    }

    /// Choose the passes to run, in order.
    ///
    /// If any name is unknown the default sequence is restored, a warning is
    /// reported and the error names the first unknown pass.
    pub fn set_active_sequence<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> std::result::Result<(), PipelineError> {
        if let Some(unknown) = names
            .iter()
            .map(AsRef::as_ref)
            .find(|name| !self.passes.contains_key(*name))
        {
            let err = PipelineError::UnknownPass {
                name: unknown.to_string(),
            };
            self.diagnostics.warn(
                None,
                format!("{err}; falling back to the default passes"),
            );
            self.active = DEFAULT_PASSES.iter().map(|s| s.to_string()).collect();
            return Err(err);
        }
        self.active = names.iter().map(|s| s.as_ref().to_string()).collect();
        Ok(())
    }

    /// Names of the passes that run, in order.
    pub fn active_sequence(&self) -> &[String] {
        &self.active
    }

    /// Run every active pass over one unit.
    ///
    /// Returns the emitted program, or `None` when the sequence has no emit
    /// pass. The first failure stops the unit and is also recorded in the
    /// diagnostics. Only a unit that passes every active pass becomes
    /// callable from later units.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&mut self, ast: &Ast<'ast>) -> Result<Option<Program>> {
        match self.run_passes(ast) {
            Ok(program) => {
                if let Some(program) = &program {
                    self.emitter.commit(program);
                }
                Ok(program)
            }
            Err(err) => {
                self.emitter.discard();
                Err(err)
            }
        }
    }

    fn run_passes(&mut self, ast: &Ast<'ast>) -> Result<Option<Program>> {
        let mut program = None;
        for name in &self.active {
            let Some(pass) = self.passes.get(name) else {
                return Err(CompilationError::internal(format!("pass '{name}' vanished")));
            };
            #[cfg(feature = "profiling")]
            profiling::scope!("pass", name.as_str());
            match pass {
                Pass::Check(None) => {}
                Pass::Check(Some(hook)) | Pass::Custom(hook) => {
                    if let Err(err) = hook(ast, &mut self.diagnostics) {
                        self.diagnostics.error(&err);
                        return Err(err);
                    }
                }
                Pass::Emit => {
                    let result = self.emitter.emit_ast(ast);
                    self.diagnostics.append(&mut self.emitter.take_diagnostics());
                    program = Some(result?);
                }
            }
        }
        Ok(program)
    }

    /// Diagnostics of every unit run so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Take the collected diagnostics, leaving none.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// The emitter behind the `emit` pass.
    pub fn emitter(&self) -> &Emitter<'reg, 'ast> {
        &self.emitter
    }
}
