//! Class, enum, union and alias definitions.
//!
//! A class produces one initializer code and one code per method:
//!
//! ```text
//! main code:        [static initializers] [enum values] [nested classes]
//! class Osc:        RegPushMem{this} PreCtor<class Parent> RegPop   with a parent initializer
//!                   [field initializers, in order]
//!                   FuncReturn                                      CTOR
//! ```
//!
//! Generic classes are skipped here and emitted per instance by
//! [`Emitter::ensure_class`].

use tempo_ast::{ClassDef, ConstValue, EnumDef, Section, Storage, TypeAliasDef, UnionDef, VarDecl};
use tempo_core::sizes::SZ_INT;
use tempo_core::{CompilationError, FuncFlags, TypeHash};

use crate::bytecode::{CodeFlags, Extra, Instr, OpCode, SharedCode};
use crate::emit::Emitter;
use crate::program::ClassRecord;

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    pub(crate) fn emit_class_def(&mut self, def: &'ast ClassDef<'ast>) -> Result<()> {
        if def.is_template() {
            return Ok(());
        }
        self.emit_class(def, def.ty, &[]).map(|_| ())
    }

    /// Emit the initializer and methods of `def` as class `ty`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn emit_class(
        &mut self,
        def: &'ast ClassDef<'ast>,
        ty: TypeHash,
        args: &[TypeHash],
    ) -> Result<ClassRecord> {
        // Class-level parts run once, in the unit's main code, even when a
        // specialization is first used inside a function or spawned body.
        self.in_main_code(|this| {
            for section in def.body {
                match *section {
                    Section::Stmts(stmts) => {
                        for stmt in stmts.iter().filter(|s| s.is_static_decl()) {
                            this.emit_stmt(stmt)?;
                        }
                    }
                    Section::Enum(enum_def) => this.emit_enum(enum_def)?,
                    Section::Class(nested) => this.emit_class_def(nested)?,
                    _ => {}
                }
            }
            Ok(())
        })?;

        let parent = match def.parent {
            Some(parent) => self.ensure_class(parent, def.span)?,
            None => None,
        };

        let name = self.registry.name_of(ty);
        self.push_code(format!("class {name}"));
        self.enter_function(None);
        self.enter_scope();
        self.code.frame.allocate(SZ_INT, false);
        self.code.stack_depth = SZ_INT;
        if let Some(parent) = parent {
            self.emit_op(OpCode::RegPushMem, 0, u64::from(SZ_INT));
            self.emit(Instr::new(OpCode::PreCtor).with_extra(Extra::Code(parent.initializer)));
            self.emit_op(OpCode::RegPop, u64::from(SZ_INT), 0);
        }

        if !args.is_empty() {
            self.templates.push_method_keys(def.body, args);
        }
        let result = self.emit_class_body(def.body);
        if !args.is_empty() {
            self.templates.pop_method_keys();
        }
        let dtor = result?;

        self.exit_scope()?;
        self.emit_op(OpCode::FuncReturn, 0, 0);
        self.exit_function();
        self.code.flags |= CodeFlags::CTOR;
        let initializer = self.pop_code()?.finish()?;

        let (instance_size, static_size) = self
            .registry
            .get(ty)
            .map_or((0, 0), |entry| (entry.instance_size, entry.static_size));
        let record = ClassRecord {
            name,
            ty,
            initializer: initializer.into(),
            dtor,
            instance_size,
            static_size,
        };
        self.install_class(record.clone());
        Ok(record)
    }

    /// Per-instance parts of a class body. Returns the destructor, if any.
    fn emit_class_body(&mut self, body: &'ast [Section<'ast>]) -> Result<Option<SharedCode>> {
        let mut dtor = None;
        for section in body {
            match *section {
                Section::Stmts(stmts) => {
                    for stmt in stmts.iter().filter(|s| !s.is_static_decl()) {
                        self.emit_stmt(stmt)?;
                    }
                }
                Section::Func(func) => {
                    let code = self.emit_func_def(func)?;
                    if func.flags.contains(FuncFlags::DTOR) {
                        dtor = code;
                    }
                }
                Section::Union(union_def) => self.emit_union(union_def)?,
                Section::TypeAlias(alias) => self.emit_alias(alias)?,
                Section::Enum(_) | Section::Class(_) => {}
            }
        }
        Ok(dtor)
    }

    /// Write enumerator values into their owner's static storage.
    ///
    /// Enumerators without static storage are plain constants and emit
    /// nothing here.
    pub(crate) fn emit_enum(&mut self, def: &EnumDef<'ast>) -> Result<()> {
        for value in def.values {
            let Storage::Static { offset } = value.storage else {
                continue;
            };
            let imm = match value.constant {
                Some(ConstValue::Int(v)) => v as u64,
                Some(ConstValue::Float(v)) => v.to_bits(),
                None => {
                    return Err(CompilationError::internal(format!(
                        "enumerator '{}' has no value at {}",
                        value.name, def.span
                    )));
                }
            };
            let owner = self.resolve_type(value.owner.unwrap_or(def.ty));
            self.emit(
                Instr::new(OpCode::StaticSetImm)
                    .with(u64::from(offset), imm)
                    .with_extra(Extra::Type(owner)),
            );
        }
        Ok(())
    }

    /// Reserve the slot of a declared union instance.
    pub(crate) fn emit_union(&mut self, def: &UnionDef<'ast>) -> Result<()> {
        if let Some(instance) = def.instance {
            self.emit_var_decl(&VarDecl {
                value: instance,
                array_dims: &[],
                span: def.span,
            })?;
        }
        Ok(())
    }

    /// An alias naming a generic class instance emits that instance.
    pub(crate) fn emit_alias(&mut self, alias: &TypeAliasDef<'ast>) -> Result<()> {
        if alias.class.is_some() && self.registry.template_of(alias.ty).is_some() {
            self.ensure_class(alias.ty, alias.span)?;
        }
        Ok(())
    }
}
