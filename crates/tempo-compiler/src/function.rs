//! Function bodies.
//!
//! Every function gets its own code and frame:
//!
//! ```text
//! slot 0          this          member functions only
//! ...             parameters    in declaration order
//! ...             vararg pack   variadic functions only
//!
//!        MemoizeCall{arg bytes}     pure functions, with memoization on
//! entry: [body]
//!        RegPushImm 0               non-void functions, falling off the end
//!        Goto -> epi
//! epi:   [function scope releases]
//!        MemoizeStore{ret size}     with MemoizeCall
//!        FuncReturn | DtorEoc
//! ```
//!
//! `return` jumps to `epi`. A body-less definition stands for a host
//! callback and produces code with no instructions.

use std::sync::Arc;

use tempo_ast::FuncDef;
use tempo_core::sizes::SZ_INT;
use tempo_core::{CompilationError, FuncFlags, TypeHash};

use crate::bytecode::{Code, CodeFlags, OpCode, SharedCode};
use crate::emit::{Emitter, FuncContext};

type Result<T> = std::result::Result<T, CompilationError>;

impl<'reg, 'ast> Emitter<'reg, 'ast> {
    /// Emit a function definition and record its code.
    ///
    /// Generic definitions produce nothing here; their specializations are
    /// emitted on first use.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn emit_func_def(&mut self, def: &'ast FuncDef<'ast>) -> Result<Option<SharedCode>> {
        if def.is_template() {
            return Ok(None);
        }
        let key = self.templates.method_key(def.hash).unwrap_or(def.hash);
        let code = match def.body {
            Some(_) => self.emit_function_body(def, key, &[])?,
            None => Arc::new(Code::native(def.name, def.hash)),
        };
        self.install_function(key, Arc::clone(&code));
        Ok(Some(code))
    }

    /// Emit the body of `def` into a fresh code named after it.
    ///
    /// `key` identifies the result (the definition hash, or a specialization
    /// key) and `args` are the concrete type arguments of a specialization.
    pub(crate) fn emit_function_body(
        &mut self,
        def: &'ast FuncDef<'ast>,
        key: TypeHash,
        args: &[TypeHash],
    ) -> Result<SharedCode> {
        let name = self.function_name(def, args);
        let ret_size = self.ret_size(def.ret, def.span)?;
        self.push_code(name.clone());

        let body_depth = self.code.frame.depth();
        self.enter_scope();
        let is_member = def.is_member();
        if is_member {
            self.code.frame.allocate(SZ_INT, false);
        }
        let mut params = Vec::with_capacity(def.params.len());
        for param in def.params {
            let size = if param.is_ref {
                SZ_INT
            } else {
                self.size_of(param.ty, def.span)?
            };
            let owned = !param.is_ref && self.is_managed(param.ty);
            let offset = self.code.frame.declare(param.id, size, owned);
            params.push((offset, size));
        }
        let vararg_slot = def
            .flags
            .contains(FuncFlags::VARIADIC)
            .then(|| self.code.frame.allocate(SZ_INT, false));
        self.enter_function(vararg_slot);

        let arg_bytes = self.code.frame.offset();
        self.code.stack_depth = arg_bytes;
        let memoize = self.options.memoize && def.flags.contains(FuncFlags::PURE);
        if memoize {
            self.emit_op(OpCode::MemoizeCall, u64::from(arg_bytes), 0);
        }

        let entry = self.pc();
        self.code.func = Some(FuncContext {
            hash: key,
            def_hash: def.hash,
            name,
            params,
            entry,
            body_depth,
            ret_size,
            template_args: args.to_vec(),
            is_member,
            vararg_slot,
        });
        for stmt in def.body.unwrap_or(&[]) {
            self.emit_stmt(stmt)?;
        }
        if ret_size > 0 {
            self.emit_op(OpCode::RegPushImm, 0, u64::from(ret_size));
            let pc = self.emit_op(OpCode::Goto, 0, 0);
            self.code.returns.push(pc);
        }

        self.code.resolve_returns()?;
        self.exit_scope()?;
        if memoize {
            self.emit_op(OpCode::MemoizeStore, u64::from(ret_size), 0);
        }
        let is_dtor = def.flags.contains(FuncFlags::DTOR);
        self.emit_op(if is_dtor { OpCode::DtorEoc } else { OpCode::FuncReturn }, 0, 0);

        let (pure, region) = self.exit_function();
        if vararg_slot.is_some() && !region.is_some_and(|r| r.top.is_some() && r.ended) {
            return Err(CompilationError::InvalidVariadic {
                name: def.name.to_string(),
                span: def.span,
            });
        }

        if pure {
            self.code.flags |= CodeFlags::PURE;
        } else if def.flags.contains(FuncFlags::PURE) {
            self.warn(
                def.span,
                format!("function '{}' is declared pure but calls impure code", def.name),
            );
        }
        if memoize {
            self.code.flags |= CodeFlags::MEMOIZE;
        }
        if is_dtor {
            self.code.flags |= CodeFlags::DTOR;
        }

        let code = self.pop_code()?.finish()?;
        Ok(Arc::new(code))
    }

    /// `name` or `name<int,float>` for a specialization.
    fn function_name(&self, def: &FuncDef<'_>, args: &[TypeHash]) -> String {
        if args.is_empty() {
            return def.name.to_string();
        }
        let names: Vec<String> = args.iter().map(|&arg| self.registry.name_of(arg)).collect();
        format!("{}<{}>", def.name, names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use tempo_ast::{Ast, AstBuilder, CalleeKind, FuncDef, FuncRef, Section, Stmt, Value};
    use tempo_core::{CompilationError, FuncFlags, Span, TypeHash, primitives};
    use tempo_registry::{FunctionEntry, TypeRegistry};

    use crate::bytecode::{CodeFlags, OpCode};
    use crate::options::EmitterOptions;
    use crate::{Emitter, OperatorTable};

    fn def<'a>(
        b: &AstBuilder<'a>,
        name: &str,
        params: &[&'a Value<'a>],
        ret: TypeHash,
        flags: FuncFlags,
        body: Option<&[Stmt<'a>]>,
    ) -> &'a FuncDef<'a> {
        let types: Vec<TypeHash> = params.iter().map(|p| p.ty).collect();
        b.alloc(FuncDef {
            name: b.str(name),
            hash: TypeHash::from_function(name, &types),
            params: b.slice(params),
            ret,
            body: body.map(|stmts| b.slice(stmts)),
            flags,
            owner: None,
            template_params: &[],
            span: Span::default(),
        })
    }

    fn ast<'a>(b: &AstBuilder<'a>, sections: &[Section<'a>]) -> Ast<'a> {
        Ast {
            name: "t",
            sections: b.slice(sections),
        }
    }

    #[test]
    fn parameters_take_slots_in_order() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let a = b.local("a", primitives::INT);
        let v = b.local("v", primitives::VEC3);
        let s = b.local("s", primitives::STRING);
        let f = def(
            &b,
            "f",
            &[a, v, s],
            primitives::VOID,
            FuncFlags::empty(),
            Some(&[b.expr_stmt(b.ident(s))]),
        );
        let program = Emitter::new(&registry, &operators)
            .emit_ast(&ast(&b, &[Section::Func(f)]))
            .unwrap();
        let code = program.function(f.hash).unwrap();
        assert_eq!(code.stack_depth, 40);
        assert_eq!(code.frame_size, 40);
        code.assert_opcodes(&[
            OpCode::RegPushMem,
            OpCode::RegPop,
            OpCode::ObjectRelease,
            OpCode::FuncReturn,
        ]);
        assert_eq!(code.instrs[0].val, 32);
        assert_eq!(code.instrs[2].val, 32);
        assert!(code.flags.contains(CodeFlags::PURE));
    }

    #[test]
    fn impure_call_clears_purity_and_warns() {
        let mut registry = TypeRegistry::with_builtins();
        let print = TypeHash::from_function("print", &[]);
        registry
            .register_function(FunctionEntry::native("print", print, primitives::VOID))
            .unwrap();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let native = FuncRef {
            kind: CalleeKind::Native,
            ..FuncRef::script(print, "print")
        };
        let f = def(
            &b,
            "f",
            &[],
            primitives::VOID,
            FuncFlags::PURE,
            Some(&[b.expr_stmt(b.call(native, &[], primitives::VOID))]),
        );
        let mut emitter = Emitter::new(&registry, &operators);
        let program = emitter.emit_ast(&ast(&b, &[Section::Func(f)])).unwrap();
        assert!(!program.function(f.hash).unwrap().flags.contains(CodeFlags::PURE));
        assert_eq!(emitter.diagnostics().len(), 1);
        assert!(!emitter.diagnostics().has_errors());
    }

    #[test]
    fn memoized_pure_function() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let x = b.local("x", primitives::INT);
        let sq = def(
            &b,
            "sq",
            &[x],
            primitives::INT,
            FuncFlags::PURE,
            Some(&[b.return_stmt(Some(b.binary(b.ident(x), "*", b.ident(x), primitives::INT)))]),
        );
        let program = Emitter::new(&registry, &operators)
            .with_options(EmitterOptions::default().with_memoize(true))
            .emit_ast(&ast(&b, &[Section::Func(sq)]))
            .unwrap();
        let code = program.function(sq.hash).unwrap();
        code.assert_opcodes(&[
            OpCode::MemoizeCall,
            OpCode::RegPushMem,
            OpCode::RegPushMem,
            OpCode::IntMul,
            OpCode::Goto,
            OpCode::RegPushImm,
            OpCode::Goto,
            OpCode::MemoizeStore,
            OpCode::FuncReturn,
        ]);
        assert_eq!(code.instrs[0].val, 8);
        assert_eq!(code.instrs[4].val, 7);
        assert_eq!(code.instrs[6].val, 7);
        assert!(code.flags.contains(CodeFlags::PURE | CodeFlags::MEMOIZE));
    }

    #[test]
    fn destructor_ends_with_dtor_eoc() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let dtor = def(
            &b,
            "@dtor",
            &[],
            primitives::VOID,
            FuncFlags::MEMBER | FuncFlags::DTOR,
            Some(&[]),
        );
        let program = Emitter::new(&registry, &operators)
            .emit_ast(&ast(&b, &[Section::Func(dtor)]))
            .unwrap();
        let code = program.function(dtor.hash).unwrap();
        code.assert_opcodes(&[OpCode::DtorEoc]);
        assert!(code.flags.contains(CodeFlags::DTOR));
        assert_eq!(code.stack_depth, 8);
    }

    #[test]
    fn bodiless_definition_is_native() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let host = def(&b, "host", &[], primitives::VOID, FuncFlags::empty(), None);
        let program = Emitter::new(&registry, &operators)
            .emit_ast(&ast(&b, &[Section::Func(host)]))
            .unwrap();
        let code = program.function(host.hash).unwrap();
        assert!(code.is_empty());
        assert_eq!(code.native, Some(host.hash));
    }

    #[test]
    fn nested_failure_leaves_no_open_code() {
        let registry = TypeRegistry::with_builtins();
        let operators = OperatorTable::with_builtins();
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let bad = def(
            &b,
            "bad",
            &[],
            primitives::VOID,
            FuncFlags::empty(),
            Some(&[b.break_stmt()]),
        );
        let mut emitter = Emitter::new(&registry, &operators);
        let err = emitter.emit_ast(&ast(&b, &[Section::Func(bad)])).unwrap_err();
        assert!(matches!(err, CompilationError::BreakOutsideLoop { .. }));
        assert_eq!(emitter.open_codes(), 0);
        assert!(emitter.diagnostics().has_errors());
    }
}
