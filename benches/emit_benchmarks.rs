//! Performance benchmarks for bytecode emission.
//!
//! Each benchmark builds a synthetic unit once and measures emitting it:
//! - Size-based: 10 to 1000 functions with loops, calls and locals
//! - Feature-specific: switch tables, spawned bodies, generic specializations
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to see where emission spends
//! its time:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- "functions_1000"
//! ```

use std::hint::black_box;

use bumpalo::Bump;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tempo::ast::{ExprKind, FuncDef, FuncRef, SpawnBody, SpawnExpr, SpawnKind};
use tempo::core::FuncFlags;
use tempo::prelude::*;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// `int fN(int x) { int acc; for (int i; i < x; i++) { acc + i => acc; } return acc; }`
fn looping_function<'a>(b: &AstBuilder<'a>, n: usize) -> &'a FuncDef<'a> {
    let name = format!("f{n}");
    let x = b.local("x", primitives::INT);
    let acc = b.local("acc", primitives::INT);
    let i = b.local("i", primitives::INT);
    let sum = b.binary(b.ident(acc), "+", b.ident(i), primitives::INT);
    let body = b.block(&[b.expr_stmt(b.binary(sum, "=>", b.addr(b.ident(acc)), primitives::INT))]);
    let stmts = [
        b.expr_stmt(b.decl(acc)),
        b.for_stmt(
            Some(b.expr_stmt(b.decl(i))),
            Some(b.binary(b.ident(i), "<", b.ident(x), primitives::INT)),
            Some(b.postfix(b.addr(b.ident(i)), "++")),
            body,
        ),
        b.return_stmt(Some(b.ident(acc))),
    ];
    b.alloc(FuncDef {
        name: b.str(&name),
        hash: TypeHash::from_function(&name, &[primitives::INT]),
        params: b.slice(&[x]),
        ret: primitives::INT,
        body: Some(b.slice(&stmts)),
        flags: FuncFlags::empty(),
        owner: None,
        template_params: &[],
        span: Span::default(),
    })
}

/// `count` functions, each called once from main.
fn synthetic_unit<'a>(b: &AstBuilder<'a>, count: usize) -> Ast<'a> {
    let mut sections = Vec::with_capacity(count + 1);
    let mut calls = Vec::with_capacity(count);
    for n in 0..count {
        let def = looping_function(b, n);
        sections.push(Section::Func(def));
        let call = b.call(FuncRef::script(def.hash, def.name), &[b.int(n as i64)], primitives::INT);
        calls.push(b.expr_stmt(call));
    }
    sections.push(Section::Stmts(b.slice(&calls)));
    Ast {
        name: "bench.tm",
        sections: b.slice(&sections),
    }
}

/// Benchmark emission across unit sizes.
fn size_based_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let registry = TypeRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();

    let mut group = c.benchmark_group("emit/unit_sizes");
    for count in [10usize, 100, 1000] {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ast = synthetic_unit(&b, count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("functions", count), &ast, |bench, ast| {
            bench.iter(|| {
                let mut emitter = Emitter::new(&registry, &operators);
                let program = emitter.emit_ast(black_box(ast)).unwrap();
                end_profiling_frame();
                black_box(program.functions.len())
            });
        });
    }
    group.finish();
}

/// Benchmark the constructs with their own code paths.
fn feature_benchmarks(c: &mut Criterion) {
    let registry = TypeRegistry::with_builtins();
    let operators = OperatorTable::with_builtins();
    let mut group = c.benchmark_group("emit/features");

    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let n = b.local("n", primitives::INT);
    let mut cases = Vec::new();
    for value in 0..64 {
        cases.push(b.case_int(value));
        cases.push(b.expr_stmt(b.int(value)));
        cases.push(b.break_stmt());
    }
    let switch = [b.expr_stmt(b.decl(n)), b.switch_stmt(b.ident(n), &cases)];
    let switch_unit = Ast {
        name: "switch.tm",
        sections: b.slice(&[Section::Stmts(b.slice(&switch))]),
    };
    group.bench_function("switch_64_cases", |bench| {
        bench.iter(|| {
            let mut emitter = Emitter::new(&registry, &operators);
            black_box(emitter.emit_ast(black_box(&switch_unit)).unwrap())
        });
    });

    let mut sporks = vec![b.expr_stmt(b.decl(n))];
    for _ in 0..100 {
        let spawn = b.alloc(SpawnExpr {
            kind: SpawnKind::Spork,
            body: SpawnBody::Block(b.slice(&[b.expr_stmt(b.ident(n))])),
            uses_this: false,
            captures: b.slice(&[n]),
            ret: primitives::VOID,
        });
        sporks.push(b.expr_stmt(b.expr(ExprKind::Spawn(spawn), primitives::SHRED)));
    }
    let spork_unit = Ast {
        name: "sporks.tm",
        sections: b.slice(&[Section::Stmts(b.slice(&sporks))]),
    };
    group.bench_function("spork_100_blocks", |bench| {
        bench.iter(|| {
            let mut emitter = Emitter::new(&registry, &operators);
            black_box(emitter.emit_ast(black_box(&spork_unit)).unwrap())
        });
    });

    let t = TypeHash::from_name("T");
    let x = b.local("x", t);
    let identity = b.alloc(FuncDef {
        name: "identity",
        hash: TypeHash::from_function("identity", &[t]),
        params: b.slice(&[x]),
        ret: t,
        body: Some(b.slice(&[b.return_stmt(Some(b.ident(x)))])),
        flags: FuncFlags::TEMPLATE,
        owner: None,
        template_params: b.slice(&[t]),
        span: Span::default(),
    });
    let mut uses = Vec::new();
    for ty in [primitives::INT, primitives::FLOAT, primitives::DUR] {
        for _ in 0..25 {
            let func = FuncRef {
                template_args: b.slice(&[ty]),
                ..FuncRef::script(identity.hash, identity.name)
            };
            let arg = if ty == primitives::INT {
                b.int(1)
            } else {
                b.implicit(b.float(1.0), ty)
            };
            uses.push(b.expr_stmt(b.call(func, &[arg], ty)));
        }
    }
    let generic_unit = Ast {
        name: "generic.tm",
        sections: b.slice(&[Section::Func(identity), Section::Stmts(b.slice(&uses))]),
    };
    group.bench_function("generic_3_specializations", |bench| {
        bench.iter(|| {
            let mut emitter = Emitter::new(&registry, &operators);
            black_box(emitter.emit_ast(black_box(&generic_unit)).unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, size_based_benchmarks, feature_benchmarks);
criterion_main!(benches);
