//! The emission context.
//!
//! An [`Emitter`] turns one annotated [`Ast`] at a time into a [`Program`].
//! It keeps the code being built in `code` and suspends the enclosing code
//! whenever a nested body (function, class initializer, spawned body,
//! specialization) starts:
//!
//! ```text
//! main ──push──> fun f ──push──> spork~code:4
//!   ^              ^                   │
//!   │              └──────pop──────────┘   SporkIni <spork~code:4>
//!   └──────pop─────┘                       f installed, ticket filled
//! ```
//!
//! The expression, statement, spawn, class and template emitters are
//! `impl Emitter` blocks in their own modules.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use tempo_ast::{Ast, AstBuilder, Section};
//! use tempo_compiler::bytecode::OpCode;
//! use tempo_compiler::{Emitter, OperatorTable};
//! use tempo_core::primitives;
//! use tempo_registry::TypeRegistry;
//!
//! let registry = TypeRegistry::with_builtins();
//! let operators = OperatorTable::with_builtins();
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//!
//! let stmts = b.slice(&[b.expr_stmt(b.binary(b.int(1), "+", b.int(1), primitives::INT))]);
//! let sections = b.slice(&[Section::Stmts(stmts)]);
//! let ast = Ast { name: "demo.tm", sections };
//!
//! let mut emitter = Emitter::new(&registry, &operators);
//! let program = emitter.emit_ast(&ast).unwrap();
//! program.main.assert_opcodes(&[
//!     OpCode::RegPushImm,
//!     OpCode::RegPushImm,
//!     OpCode::IntPlus,
//!     OpCode::RegPop,
//!     OpCode::Eoc,
//! ]);
//! ```

mod builder;
mod jumps;
mod labels;

pub use builder::{CodeBuilder, FuncContext};
pub use jumps::{BreakError, BreakableContext, BreakableKind, JumpManager};
pub use labels::{GotoTarget, LabelTable, LiveOwned};

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tempo_ast::{Ast, Section, ValueId};
use tempo_core::primitives::{DUR, FLOAT, TIME};
use tempo_core::{CompilationError, Span, TypeHash};
use tempo_registry::TypeRegistry;

use crate::bytecode::{Instr, OpCode, SharedCode};
use crate::diagnostics::Diagnostics;
use crate::operators::OperatorTable;
use crate::options::EmitterOptions;
use crate::program::{ClassRecord, Program};
use crate::template::Templates;
use crate::ticket::TicketBook;

type Result<T> = std::result::Result<T, CompilationError>;

/// Walk state of the variadic block of one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarargRegion {
    /// Frame slot holding the pack.
    pub slot: u32,
    /// pc of `VarargTop`, once `vararg.start` was emitted.
    pub top: Option<usize>,
    /// `vararg.end` was emitted.
    pub ended: bool,
}

impl VarargRegion {
    fn new(slot: u32) -> Self {
        Self {
            slot,
            top: None,
            ended: false,
        }
    }
}

/// Codes produced by the unit being emitted.
#[derive(Debug, Default)]
struct UnitOutput {
    functions: FxHashMap<TypeHash, SharedCode>,
    classes: FxHashMap<TypeHash, ClassRecord>,
    specializations: FxHashMap<TypeHash, SharedCode>,
}

/// Turns annotated units into bytecode.
///
/// One emitter can compile many units in sequence. A unit's functions and
/// classes become callable from later units once it is [committed]; an
/// uncommitted unit is dropped when the next one starts.
///
/// [committed]: Emitter::commit
pub struct Emitter<'reg, 'ast> {
    pub(crate) registry: &'reg TypeRegistry,
    pub(crate) operators: &'reg OperatorTable,
    pub(crate) options: EmitterOptions,
    /// The code being built.
    pub(crate) code: CodeBuilder,
    /// Enclosing codes, outermost first.
    suspended: Vec<CodeBuilder>,
    /// One flag per open function: no impure call emitted yet.
    purity: Vec<bool>,
    /// One entry per open function; `None` for non-variadic ones.
    pub(crate) varargs: Vec<Option<VarargRegion>>,
    pub(crate) templates: Templates<'ast>,
    pub(crate) tickets: TicketBook,
    /// Offsets of the unit's globals in the global segment.
    pub(crate) globals: FxHashMap<ValueId, u32>,
    /// End of the global segment, this unit included.
    globals_size: u32,
    /// End of the global segment after the last committed unit.
    committed_globals_size: u32,
    unit: UnitOutput,
    installed: FxHashMap<TypeHash, SharedCode>,
    installed_classes: FxHashMap<TypeHash, ClassRecord>,
    diagnostics: Diagnostics,
    pub(crate) unit_name: String,
    active: bool,
}

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Create an emitter over a populated registry and operator table.
    pub fn new(registry: &'reg TypeRegistry, operators: &'reg OperatorTable) -> Self {
        Self {
            registry,
            operators,
            options: EmitterOptions::default(),
            code: CodeBuilder::new(""),
            suspended: Vec::new(),
            purity: Vec::new(),
            varargs: Vec::new(),
            templates: Templates::new(),
            tickets: TicketBook::new(),
            globals: FxHashMap::default(),
            globals_size: 0,
            committed_globals_size: 0,
            unit: UnitOutput::default(),
            installed: FxHashMap::default(),
            installed_classes: FxHashMap::default(),
            diagnostics: Diagnostics::new(),
            unit_name: String::new(),
            active: false,
        }
    }

    /// Set the emitter options.
    pub fn with_options(mut self, options: EmitterOptions) -> Self {
        self.options = options;
        self
    }

    /// Options in effect.
    pub fn options(&self) -> EmitterOptions {
        self.options
    }

    /// Diagnostics collected so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Take the collected diagnostics, leaving none.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Number of codes currently open, the current one included.
    ///
    /// Zero between units.
    pub fn open_codes(&self) -> usize {
        self.suspended.len() + usize::from(self.active)
    }

    /// Number of distinct generic function specializations emitted.
    pub fn specialization_count(&self) -> usize {
        self.templates.cache.function_count()
    }

    // ==========================================================================
    // Units
    // ==========================================================================

    /// Emit one compilation unit.
    ///
    /// The program is not visible to later units until it is passed to
    /// [`Emitter::commit`]. On failure every open code is released, the
    /// error is recorded in the diagnostics, and the emitter is ready for the
    /// next unit.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit_ast(&mut self, ast: &Ast<'ast>) -> Result<Program> {
        if self.active {
            return Err(CompilationError::internal(
                "emit_ast called while a unit is being emitted",
            ));
        }
        self.begin_unit(ast.name);
        let result = self.emit_unit(ast);
        match result {
            Ok(program) => {
                self.active = false;
                Ok(program)
            }
            Err(err) => {
                self.abort();
                self.diagnostics.error(&err);
                Err(err)
            }
        }
    }

    /// Make the functions, specializations and classes of an emitted unit
    /// callable from later units.
    pub fn commit(&mut self, program: &Program) {
        for (key, code) in program.functions.iter().chain(&program.specializations) {
            self.installed.insert(*key, code.clone());
        }
        for (ty, record) in &program.classes {
            self.installed_classes.insert(*ty, record.clone());
        }
        self.committed_globals_size = self.committed_globals_size.max(program.globals_size);
        self.templates.commit();
    }

    /// Forget an emitted unit that will not be committed.
    pub fn discard(&mut self) {
        self.templates.reset();
    }

    /// Drop every open code and per-unit state.
    pub fn abort(&mut self) {
        self.suspended.clear();
        self.code = CodeBuilder::new("");
        self.purity.clear();
        self.varargs.clear();
        self.templates.reset();
        self.tickets.clear();
        self.globals.clear();
        self.globals_size = self.committed_globals_size;
        self.unit = UnitOutput::default();
        self.active = false;
    }

    fn begin_unit(&mut self, name: &str) {
        self.templates.reset();
        self.active = true;
        self.unit_name = name.to_string();
        self.code = CodeBuilder::new(name);
        self.code.frame.enter_scope();
        self.purity = vec![true];
        self.varargs = vec![None];
        self.tickets.clear();
        self.globals.clear();
        self.globals_size = self.committed_globals_size;
        self.unit = UnitOutput::default();
    }

    fn emit_unit(&mut self, ast: &Ast<'ast>) -> Result<Program> {
        self.templates.collect(ast.sections);
        for section in ast.sections {
            self.emit_section(section)?;
        }
        // A top-level `return` has already released the unit scope.
        self.exit_scope()?;
        self.code.resolve_returns()?;
        self.emit_op(OpCode::Eoc, 0, 0);

        if !self.suspended.is_empty() {
            return Err(CompilationError::internal(format!(
                "{} codes still open at end of unit",
                self.suspended.len()
            )));
        }
        self.tickets.check_resolved()?;

        let main = std::mem::replace(&mut self.code, CodeBuilder::new("")).finish()?;
        let unit = std::mem::take(&mut self.unit);
        self.purity.clear();
        self.varargs.clear();
        Ok(Program {
            name: ast.name.to_string(),
            main: Arc::new(main),
            functions: unit.functions,
            classes: unit.classes,
            specializations: unit.specializations,
            globals_size: self.globals_size,
        })
    }

    /// Emit one top-level or class-body section into the current code.
    pub(crate) fn emit_section(&mut self, section: &Section<'ast>) -> Result<()> {
        match *section {
            Section::Stmts(stmts) => {
                for stmt in stmts {
                    self.emit_stmt(stmt)?;
                }
                Ok(())
            }
            Section::Func(def) => self.emit_func_def(def).map(|_| ()),
            Section::Class(def) => self.emit_class_def(def),
            Section::Enum(def) => self.emit_enum(def),
            Section::Union(def) => self.emit_union(def),
            Section::TypeAlias(def) => self.emit_alias(def),
        }
    }

    // ==========================================================================
    // Code stack
    // ==========================================================================

    /// Suspend the current code and start a new one.
    pub(crate) fn push_code(&mut self, name: impl Into<String>) {
        let outer = std::mem::replace(&mut self.code, CodeBuilder::new(name));
        self.suspended.push(outer);
    }

    /// Finish building the current code and resume the enclosing one.
    pub(crate) fn pop_code(&mut self) -> Result<CodeBuilder> {
        let outer = self
            .suspended
            .pop()
            .ok_or_else(|| CompilationError::internal("code stack underflow"))?;
        Ok(std::mem::replace(&mut self.code, outer))
    }

    /// Run `f` with the unit's main code as the current code.
    pub(crate) fn in_main_code<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let Some(main) = self.suspended.first_mut() else {
            return f(self);
        };
        std::mem::swap(&mut self.code, main);
        self.purity.push(true);
        self.varargs.push(None);
        let result = f(self);
        self.varargs.pop();
        self.purity.pop();
        if let Some(main) = self.suspended.first_mut() {
            std::mem::swap(&mut self.code, main);
        }
        result
    }

    pub(crate) fn enter_function(&mut self, vararg_slot: Option<u32>) {
        self.purity.push(true);
        self.varargs.push(vararg_slot.map(VarargRegion::new));
    }

    /// Leave a function; returns whether it stayed pure and its vararg state.
    pub(crate) fn exit_function(&mut self) -> (bool, Option<VarargRegion>) {
        let pure = self.purity.pop().unwrap_or(false);
        let region = self.varargs.pop().flatten();
        (pure, region)
    }

    /// The current function made an impure call.
    pub(crate) fn clear_purity(&mut self) {
        if let Some(pure) = self.purity.last_mut() {
            *pure = false;
        }
    }

    // ==========================================================================
    // Instructions
    // ==========================================================================

    /// Append an instruction to the current code.
    pub(crate) fn emit(&mut self, instr: Instr) -> usize {
        self.code.emit(instr)
    }

    /// Append an instruction without auxiliary operand.
    pub(crate) fn emit_op(&mut self, op: OpCode, val: u64, val2: u64) -> usize {
        self.code.emit(Instr::new(op).with(val, val2))
    }

    /// Index of the next instruction.
    pub(crate) fn pc(&self) -> usize {
        self.code.pc()
    }

    /// Point the branch at `pc` to `target`.
    pub(crate) fn patch(&mut self, pc: usize, target: usize) -> Result<()> {
        self.code.patch(pc, target)
    }

    /// Point the branch at `pc` to the next instruction.
    pub(crate) fn patch_here(&mut self, pc: usize) -> Result<()> {
        let here = self.pc();
        self.code.patch(pc, here)
    }

    /// Conditional branch taken when a value of type `ty` is zero
    /// (`on_true == false`) or non-zero (`on_true == true`).
    pub(crate) fn emit_branch(&mut self, ty: TypeHash, on_true: bool, target: usize) -> usize {
        let float = matches!(self.resolve_type(ty), FLOAT | DUR | TIME);
        let op = match (float, on_true) {
            (false, false) => OpCode::BranchEqInt,
            (false, true) => OpCode::BranchNeqInt,
            (true, false) => OpCode::BranchEqFloat,
            (true, true) => OpCode::BranchNeqFloat,
        };
        self.emit_op(op, target as u64, 0)
    }

    // ==========================================================================
    // Scopes
    // ==========================================================================

    /// Open a lexical scope in the current frame.
    pub(crate) fn enter_scope(&mut self) {
        self.code.frame.enter_scope();
    }

    /// Close the innermost scope, releasing its owned slots.
    pub(crate) fn exit_scope(&mut self) -> Result<()> {
        let owned = self
            .code
            .frame
            .exit_scope()
            .ok_or_else(|| CompilationError::internal("scope stack underflow"))?;
        self.release(&owned);
        Ok(())
    }

    /// Release the given owned slots, in order.
    pub(crate) fn release(&mut self, offsets: &[u32]) {
        for &offset in offsets {
            self.emit_op(OpCode::ObjectRelease, u64::from(offset), 0);
        }
    }

    /// Reserve a slot of the global segment for a declared value.
    ///
    /// Globals live outside every frame and are never released by a scope.
    pub(crate) fn declare_global(&mut self, id: ValueId, size: u32) -> u32 {
        let offset = self.globals_size;
        self.globals_size += size;
        self.globals.insert(id, offset);
        offset
    }

    /// Release every owned slot of the scopes opened at or after `depth`
    /// without closing them.
    pub(crate) fn unwind(&mut self, depth: usize) {
        let owned = self.code.frame.owned_since(depth);
        self.release(&owned);
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// Apply the active template substitution.
    pub(crate) fn resolve_type(&self, ty: TypeHash) -> TypeHash {
        self.templates.resolve(ty)
    }

    /// Stack size of a value of type `ty`.
    pub(crate) fn size_of(&self, ty: TypeHash, span: Span) -> Result<u32> {
        let resolved = self.resolve_type(ty);
        self.registry
            .size_of(resolved)
            .ok_or_else(|| CompilationError::UnknownType {
                name: self.registry.name_of(resolved),
                span,
            })
    }

    /// Whether values of `ty` are reference-counted.
    pub(crate) fn is_object(&self, ty: TypeHash) -> bool {
        self.registry.is_object(self.resolve_type(ty))
    }

    /// Whether `ty` is reference-counted and not a shred.
    pub(crate) fn is_managed(&self, ty: TypeHash) -> bool {
        let ty = self.resolve_type(ty);
        self.registry.is_object(ty) && !self.registry.is_shred(ty)
    }

    // ==========================================================================
    // Emitted code lookup
    // ==========================================================================

    /// Finished code for a function or specialization key.
    pub(crate) fn lookup_code(&self, key: TypeHash) -> Option<SharedCode> {
        self.unit
            .functions
            .get(&key)
            .or_else(|| self.unit.specializations.get(&key))
            .or_else(|| self.installed.get(&key))
            .cloned()
    }

    /// Record a finished function and fill its ticket.
    pub(crate) fn install_function(&mut self, key: TypeHash, code: SharedCode) {
        self.tickets.resolve(key, &code);
        self.unit.functions.insert(key, code);
    }

    /// Record a finished specialization and fill its ticket.
    pub(crate) fn install_specialization(&mut self, key: TypeHash, code: SharedCode) {
        self.tickets.resolve(key, &code);
        self.unit.specializations.insert(key, code);
    }

    /// Record of a class emitted by this or an earlier unit.
    pub(crate) fn class_record(&self, ty: TypeHash) -> Option<&ClassRecord> {
        self.unit
            .classes
            .get(&ty)
            .or_else(|| self.installed_classes.get(&ty))
    }

    pub(crate) fn install_class(&mut self, record: ClassRecord) {
        self.unit.classes.insert(record.ty, record);
    }

    /// Report a warning.
    pub(crate) fn warn(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.warn(Some(span), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::OpCode;
    use bumpalo::Bump;
    use tempo_ast::AstBuilder;
    use tempo_core::primitives;

    #[test]
    fn expression_statement_pops_value() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let stmts = b.slice(&[b.expr_stmt(b.binary(b.int(1), "+", b.int(1), primitives::INT))]);
        let sections = b.slice(&[Section::Stmts(stmts)]);
        let ast = Ast {
            name: "t",
            sections,
        };

        let mut emitter = Emitter::new(&registry, &operators);
        let program = emitter.emit_ast(&ast).unwrap();
        program.main.assert_opcodes(&[
            OpCode::RegPushImm,
            OpCode::RegPushImm,
            OpCode::IntPlus,
            OpCode::RegPop,
            OpCode::Eoc,
        ]);
        assert_eq!(program.main.instrs[3].val, 8);
        assert_eq!(emitter.open_codes(), 0);
    }

    #[test]
    fn top_level_objects_released_before_eoc() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let s = b.local("s", primitives::STRING);
        let stmts = b.slice(&[b.expr_stmt(b.decl(s))]);
        let ast = Ast {
            name: "t",
            sections: b.slice(&[Section::Stmts(stmts)]),
        };

        let program = Emitter::new(&registry, &operators).emit_ast(&ast).unwrap();
        let main = &program.main;
        let eoc = main.instrs.len() - 1;
        assert_eq!(main.instrs[eoc].op, OpCode::Eoc);
        assert_eq!(main.instrs[eoc - 1].op, OpCode::ObjectRelease);
        assert_eq!(main.instrs[eoc - 1].val, 0);
        assert_eq!(main.count(OpCode::ObjectRelease), 1);
    }

    #[test]
    fn push_and_pop_code() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let mut emitter = Emitter::new(&registry, &operators);
        emitter.push_code("inner");
        assert_eq!(emitter.suspended.len(), 1);
        assert_eq!(emitter.code.name(), "inner");
        let inner = emitter.pop_code().unwrap();
        assert_eq!(inner.name(), "inner");
        assert!(emitter.pop_code().is_err());
    }

    #[test]
    fn abort_clears_open_codes() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let mut emitter = Emitter::new(&registry, &operators);
        emitter.begin_unit("t");
        emitter.push_code("a");
        emitter.push_code("b");
        assert_eq!(emitter.open_codes(), 3);
        emitter.abort();
        assert_eq!(emitter.open_codes(), 0);
    }

    #[test]
    fn scope_exit_releases_owned() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let mut emitter = Emitter::new(&registry, &operators);
        emitter.enter_scope();
        emitter.code.frame.allocate(8, true);
        emitter.code.frame.allocate(8, false);
        emitter.code.frame.allocate(8, true);
        emitter.exit_scope().unwrap();
        let offsets: Vec<u64> = emitter.code.instrs().iter().map(|i| i.val).collect();
        assert_eq!(offsets, vec![16, 0]);
        assert!(emitter.exit_scope().is_err());
    }

    #[test]
    fn float_conditions_use_float_branches() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let mut emitter = Emitter::new(&registry, &operators);
        emitter.emit_branch(primitives::DUR, false, 0);
        emitter.emit_branch(primitives::INT, true, 0);
        let ops: Vec<OpCode> = emitter.code.instrs().iter().map(|i| i.op).collect();
        assert_eq!(ops, vec![OpCode::BranchEqFloat, OpCode::BranchNeqInt]);
    }
}
