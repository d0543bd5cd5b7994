//! Integration tests for tempo using the pass pipeline as the entry point.
//!
//! Each test builds a unit the way the type checker would hand it over and
//! runs it through `check` then `emit`.

use bumpalo::Bump;
use tempo::ast::{
    CalleeKind, ClassDef, ExprKind, FuncDef, FuncRef, SpawnBody, SpawnExpr, SpawnKind,
    TypeAliasDef, Value,
};
use tempo::compiler::bytecode::SharedCode;
use tempo::core::{FuncFlags, TypeFlags};
use tempo::prelude::*;
use tempo::registry::{FunctionEntry, TypeEntry};

fn func<'a>(
    b: &AstBuilder<'a>,
    name: &str,
    params: &[&'a Value<'a>],
    ret: TypeHash,
    flags: FuncFlags,
    body: &[Stmt<'a>],
) -> &'a FuncDef<'a> {
    let types: Vec<TypeHash> = params.iter().map(|p| p.ty).collect();
    b.alloc(FuncDef {
        name: b.str(name),
        hash: TypeHash::from_function(name, &types),
        params: b.slice(params),
        ret,
        body: Some(b.slice(body)),
        flags,
        owner: None,
        template_params: &[],
        span: Span::default(),
    })
}

fn unit<'a>(b: &AstBuilder<'a>, name: &'a str, sections: &[Section<'a>]) -> Ast<'a> {
    Ast {
        name,
        sections: b.slice(sections),
    }
}

/// Every branch of `code` lands inside it.
fn assert_branches_resolved(code: &SharedCode) {
    for (pc, instr) in code.instrs.iter().enumerate() {
        if instr.op.is_branch() && instr.op != OpCode::SwitchBranch {
            assert!(
                (instr.val as usize) <= code.instrs.len(),
                "{}: branch at {pc} targets {} past the end",
                code.name,
                instr.val
            );
        }
    }
}

// =============================================================================
// Control Flow
// =============================================================================

#[test]
fn test_loops_and_jumps() {
    let registry = TypeRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let i = b.local("i", primitives::INT);
    let s = b.local("s", primitives::STRING);
    let counter = b.addr(b.ident(i));
    let body = b.block(&[
        b.expr_stmt(b.decl(s)),
        b.expr_stmt(b.postfix(counter, "++")),
        b.if_stmt(
            b.binary(b.ident(i), "==", b.int(5), primitives::INT),
            b.break_stmt(),
            None,
        ),
        b.if_stmt(
            b.binary(b.ident(i), "==", b.int(2), primitives::INT),
            b.continue_stmt(),
            None,
        ),
    ]);
    let stmts = [
        b.expr_stmt(b.decl(i)),
        b.while_stmt(b.binary(b.ident(i), "<", b.int(10), primitives::INT), body, false),
        b.loop_stmt(b.int(3), b.block(&[])),
    ];
    let ast = unit(&b, "loops.tm", &[Section::Stmts(b.slice(&stmts))]);

    let mut pipeline = Pipeline::new(&registry, &operators, PipelineOptions::default());
    let program = pipeline.run(&ast).unwrap().unwrap();
    let main = &program.main;
    assert_eq!(main.instrs.last().map(|i| i.op), Some(OpCode::Eoc));
    assert_branches_resolved(main);
    // The string is released on the break, the continue and the normal
    // end of the body.
    assert_eq!(main.count(OpCode::ObjectRelease), 3);
}

#[test]
fn test_switch_with_goto() {
    let registry = TypeRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let n = b.local("n", primitives::INT);
    let stmts = [
        b.expr_stmt(b.decl(n)),
        b.switch_stmt(
            b.ident(n),
            &[
                b.case_int(0),
                b.goto_stmt("done"),
                b.case_int(1),
                b.break_stmt(),
                b.default_stmt(),
                b.break_stmt(),
            ],
        ),
        b.label_stmt("done"),
    ];
    let ast = unit(&b, "switch.tm", &[Section::Stmts(b.slice(&stmts))]);

    let mut pipeline = Pipeline::new(&registry, &operators, PipelineOptions::default());
    let program = pipeline.run(&ast).unwrap().unwrap();
    program.main.assert_contains_opcodes(&[
        OpCode::SwitchIni,
        OpCode::SwitchBranch,
        OpCode::Goto,
        OpCode::Goto,
        OpCode::Goto,
        OpCode::Eoc,
    ]);
    assert_branches_resolved(&program.main);
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_recursive_function_and_forward_call() {
    let registry = TypeRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let n = b.local("n", primitives::INT);
    let hash = TypeHash::from_function("count", &[primitives::INT]);
    let this_call = |arg| b.call(FuncRef::script(hash, "count"), &[arg], primitives::INT);
    let count = func(
        &b,
        "count",
        &[n],
        primitives::INT,
        FuncFlags::empty(),
        &[
            b.if_stmt(
                b.binary(b.ident(n), "==", b.int(0), primitives::INT),
                b.return_stmt(Some(b.int(0))),
                None,
            ),
            b.return_stmt(Some(this_call(b.binary(b.ident(n), "-", b.int(1), primitives::INT)))),
        ],
    );
    // Main calls `count` before its definition.
    let main = b.slice(&[b.expr_stmt(this_call(b.int(3)))]);
    let ast = unit(&b, "count.tm", &[Section::Stmts(main), Section::Func(count)]);

    let mut pipeline = Pipeline::new(&registry, &operators, PipelineOptions::default());
    let program = pipeline.run(&ast).unwrap().unwrap();
    let code = program.function(hash).unwrap();
    assert_branches_resolved(code);
    // The self call in return position becomes a jump back to the entry.
    assert_eq!(code.count(OpCode::PreludeScript), 0);
    assert_eq!(code.count(OpCode::RegToMem), 1);

    let at = program.main.find(OpCode::RegPushCode).unwrap();
    let callee = program.main.instrs[at].callee().unwrap();
    assert!(std::sync::Arc::ptr_eq(&callee.code().unwrap(), code));
}

#[test]
fn test_memoize_only_adds_memo_instructions() {
    let registry = TypeRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let x = b.local("x", primitives::FLOAT);
    let square = func(
        &b,
        "square",
        &[x],
        primitives::FLOAT,
        FuncFlags::PURE,
        &[b.return_stmt(Some(b.binary(b.ident(x), "*", b.ident(x), primitives::FLOAT)))],
    );
    let ast = unit(&b, "memo.tm", &[Section::Func(square)]);

    let emit = |memoize: bool| {
        let options = PipelineOptions::default()
            .with_emitter(EmitterOptions::default().with_memoize(memoize));
        let mut pipeline = Pipeline::new(&registry, &operators, options);
        let program = pipeline.run(&ast).unwrap().unwrap();
        program.function(square.hash).unwrap().clone()
    };
    let plain = emit(false);
    let memoized = emit(true);

    let strip = |code: &SharedCode| -> Vec<OpCode> {
        code.opcodes()
            .into_iter()
            .filter(|op| !matches!(op, OpCode::MemoizeCall | OpCode::MemoizeStore))
            .collect()
    };
    assert_eq!(memoized.count(OpCode::MemoizeCall), 1);
    assert_eq!(memoized.count(OpCode::MemoizeStore), 1);
    assert_eq!(plain.count(OpCode::MemoizeCall), 0);
    assert_eq!(strip(&plain), strip(&memoized));
}

// =============================================================================
// Classes and Generics
// =============================================================================

#[test]
fn test_class_chain() {
    let mut registry = TypeRegistry::with_builtins();
    let base = registry
        .register_type(TypeEntry::class("Voice", Some(primitives::OBJECT)).with_layout(8, 0))
        .unwrap();
    let lead = registry
        .register_type(TypeEntry::class("Lead", Some(base)).with_layout(16, 0))
        .unwrap();
    let operators = OperatorTable::with_builtins();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let gain = b.field("gain", primitives::FLOAT, base, 0);
    let name = b.field("name", primitives::STRING, lead, 8);
    let voice = b.alloc(ClassDef {
        name: "Voice",
        ty: base,
        parent: Some(primitives::OBJECT),
        body: b.slice(&[Section::Stmts(b.slice(&[b.expr_stmt(b.decl(gain))]))]),
        template_params: &[],
        span: Span::default(),
    });
    let lead_def = b.alloc(ClassDef {
        name: "Lead",
        ty: lead,
        parent: Some(base),
        body: b.slice(&[Section::Stmts(b.slice(&[b.expr_stmt(b.decl(name))]))]),
        template_params: &[],
        span: Span::default(),
    });
    let ast = unit(&b, "voices.tm", &[Section::Class(voice), Section::Class(lead_def)]);

    let mut pipeline = Pipeline::new(&registry, &operators, PipelineOptions::default());
    let program = pipeline.run(&ast).unwrap().unwrap();
    let parent = program.class(base).unwrap();
    let child = program.class(lead).unwrap();
    assert_eq!(child.instance_size, 16);

    let pre = child.initializer.find(OpCode::PreCtor).unwrap();
    let chained = child.initializer.instrs[pre].code().unwrap();
    assert!(std::sync::Arc::ptr_eq(chained, &parent.initializer));
    assert_eq!(child.initializer.instrs.last().map(|i| i.op), Some(OpCode::FuncReturn));
}

#[test]
fn test_generic_function_specialized_once() {
    let registry = TypeRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let t = TypeHash::from_name("T");
    let x = b.local("x", t);
    let identity = b.alloc(FuncDef {
        template_params: b.slice(&[t]),
        ..*func(&b, "identity", &[x], t, FuncFlags::empty(), &[b.return_stmt(Some(b.ident(x)))])
    });
    let use_with = |ty: TypeHash, arg| {
        b.expr_stmt(b.call(
            FuncRef {
                template_args: b.slice(&[ty]),
                ..FuncRef::script(identity.hash, "identity")
            },
            &[arg],
            ty,
        ))
    };
    let stmts = [
        use_with(primitives::INT, b.int(1)),
        use_with(primitives::INT, b.int(2)),
        use_with(primitives::FLOAT, b.float(0.5)),
    ];
    let ast = unit(
        &b,
        "generic.tm",
        &[Section::Func(identity), Section::Stmts(b.slice(&stmts))],
    );

    let mut pipeline = Pipeline::new(&registry, &operators, PipelineOptions::default());
    let program = pipeline.run(&ast).unwrap().unwrap();
    assert_eq!(program.specializations.len(), 2);
    assert_eq!(pipeline.emitter().specialization_count(), 2);
    let int_key = TypeHash::from_template_instance(identity.hash, &[primitives::INT]);
    assert_eq!(program.specialization(int_key).unwrap().name, "identity<int>");
}

#[test]
fn test_generic_class_alias() {
    let mut registry = TypeRegistry::with_builtins();
    let boxed = registry
        .register_type(
            TypeEntry::class("Box", Some(primitives::OBJECT))
                .with_flags(TypeFlags::TEMPLATE)
                .with_layout(8, 0),
        )
        .unwrap();
    let instance = registry.instantiate(boxed, &[primitives::FLOAT]).unwrap();
    let operators = OperatorTable::with_builtins();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let t = TypeHash::from_name("T");
    let item = b.field("item", t, boxed, 0);
    let class = b.alloc(ClassDef {
        name: "Box",
        ty: boxed,
        parent: Some(primitives::OBJECT),
        body: b.slice(&[Section::Stmts(b.slice(&[b.expr_stmt(b.decl(item))]))]),
        template_params: b.slice(&[t]),
        span: Span::default(),
    });
    let alias = b.alloc(TypeAliasDef {
        name: "FloatBox",
        ty: instance,
        class: Some(class),
        span: Span::default(),
    });
    let ast = unit(&b, "box.tm", &[Section::Class(class), Section::TypeAlias(alias)]);

    let mut pipeline = Pipeline::new(&registry, &operators, PipelineOptions::default());
    let program = pipeline.run(&ast).unwrap().unwrap();
    assert!(program.class(boxed).is_none());
    let record = program.class(instance).unwrap();
    assert_eq!(record.name, "Box<float>");
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_spork_inside_loop() {
    let mut registry = TypeRegistry::with_builtins();
    let beep = TypeHash::from_function("beep", &[primitives::INT]);
    registry
        .register_function(FunctionEntry::native("beep", beep, primitives::VOID))
        .unwrap();
    let operators = OperatorTable::with_builtins();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let i = b.local("i", primitives::INT);
    let beep_ref = FuncRef {
        kind: CalleeKind::Native,
        ..FuncRef::script(beep, "beep")
    };
    let spawn = b.alloc(SpawnExpr {
        kind: SpawnKind::Spork,
        body: SpawnBody::Block(b.slice(&[b.expr_stmt(b.call(
            beep_ref,
            &[b.ident(i)],
            primitives::VOID,
        ))])),
        uses_this: false,
        captures: b.slice(&[i]),
        ret: primitives::VOID,
    });
    let stmts = [b.for_stmt(
        Some(b.expr_stmt(b.decl(i))),
        Some(b.binary(b.ident(i), "<", b.int(4), primitives::INT)),
        Some(b.postfix(b.addr(b.ident(i)), "++")),
        b.at(12, 5)
            .expr_stmt(b.expr(ExprKind::Spawn(spawn), primitives::SHRED)),
    )];
    let ast = unit(&b, "spork.tm", &[Section::Stmts(b.slice(&stmts))]);

    let mut pipeline = Pipeline::new(&registry, &operators, PipelineOptions::default());
    let program = pipeline.run(&ast).unwrap().unwrap();
    assert_branches_resolved(&program.main);
    let ini = program.main.find(OpCode::SporkIni).unwrap();
    let child = program.main.instrs[ini].code().unwrap();
    assert_eq!(child.name, "spork~code:12");
    assert_eq!(child.stack_depth, 8);
    child.assert_contains_opcodes(&[
        OpCode::RegPushMem,
        OpCode::RegPushCode,
        OpCode::PreludeNative,
        OpCode::Eoc,
    ]);
}

// =============================================================================
// Failure Handling
// =============================================================================

#[test]
fn test_failed_unit_then_recovery() {
    let registry = TypeRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let broken = func(
        &b,
        "broken",
        &[],
        primitives::VOID,
        FuncFlags::empty(),
        &[b.block(&[b.at(4, 9).continue_stmt()])],
    );
    let bad = unit(&b, "bad.tm", &[Section::Func(broken)]);
    let good = unit(&b, "good.tm", &[Section::Stmts(b.slice(&[b.expr_stmt(b.int(1))]))]);

    let mut pipeline = Pipeline::new(&registry, &operators, PipelineOptions::default());
    let err = pipeline.run(&bad).unwrap_err();
    assert_eq!(err, CompilationError::ContinueOutsideLoop { span: Span::new(4, 9, 1) });
    assert_eq!(pipeline.emitter().open_codes(), 0);
    let diagnostic = pipeline.diagnostics().iter().next().unwrap();
    assert_eq!(diagnostic.span, Some(Span::new(4, 9, 1)));

    let program = pipeline.run(&good).unwrap().unwrap();
    assert_eq!(program.name, "good.tm");
    assert!(program.function(broken.hash).is_none());
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_same_unit_emits_same_code() {
    let registry = TypeRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);

    let n = b.local("n", primitives::INT);
    let i = b.local("i", primitives::INT);
    let s = b.local("s", primitives::STRING);
    let hash = TypeHash::from_function("twice", &[primitives::INT]);
    let twice = func(
        &b,
        "twice",
        &[n],
        primitives::INT,
        FuncFlags::empty(),
        &[b.return_stmt(Some(b.binary(b.ident(n), "*", b.int(2), primitives::INT)))],
    );
    let spawn = b.alloc(SpawnExpr {
        kind: SpawnKind::Spork,
        body: SpawnBody::Block(b.slice(&[b.expr_stmt(b.ident(i))])),
        uses_this: false,
        captures: b.slice(&[i]),
        ret: primitives::VOID,
    });
    let main = b.slice(&[
        b.expr_stmt(b.decl(s)),
        b.expr_stmt(b.decl(i)),
        b.while_stmt(
            b.binary(b.ident(i), "<", b.int(8), primitives::INT),
            b.block(&[
                b.expr_stmt(b.expr(ExprKind::Spawn(spawn), primitives::SHRED)),
                b.expr_stmt(b.call(
                    FuncRef::script(hash, "twice"),
                    &[b.ident(i)],
                    primitives::INT,
                )),
            ]),
            false,
        ),
    ]);
    let ast = unit(&b, "same.tm", &[Section::Func(twice), Section::Stmts(main)]);

    let run = || {
        let mut pipeline = Pipeline::new(&registry, &operators, PipelineOptions::default());
        pipeline.run(&ast).unwrap().unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.main.instrs, second.main.instrs);
    assert_eq!(first.main.frame_size, second.main.frame_size);
    assert_eq!(first.function(hash), second.function(hash));
    let ini = first.main.find(OpCode::SporkIni).unwrap();
    assert_eq!(first.main.instrs[ini].code(), second.main.instrs[ini].code());
}
