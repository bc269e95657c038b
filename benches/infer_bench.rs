//! Type argument inference benchmarks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tyflow::solver::{FunctionShape, ParamInfo, PropertyInfo};
use tyflow::{
    CheckerOptions, InferenceContext, InferenceFlags, InferencePriority, RelationChecker, TypeId,
    TypeInterner,
};

/// `{ p0: T0, ..., pn: Tn }` inferred from `{ p0: string, ..., pn: number }`.
fn bench_object_properties(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_object_properties");

    for n in [1, 8, 32] {
        let interner = TypeInterner::new();
        let params: Vec<TypeId> = (0..n).map(|i| interner.type_param(&format!("T{i}"))).collect();
        let names: Vec<_> = (0..n).map(|i| interner.intern_string(&format!("p{i}"))).collect();
        let source = interner.object(
            names
                .iter()
                .enumerate()
                .map(|(i, &name)| {
                    let value = if i % 2 == 0 { TypeId::STRING } else { TypeId::NUMBER };
                    PropertyInfo::new(name, value)
                })
                .collect(),
        );
        let target = interner.object(
            names
                .iter()
                .zip(&params)
                .map(|(&name, &param)| PropertyInfo::new(name, param))
                .collect(),
        );

        group.bench_with_input(BenchmarkId::new("properties", n), &n, |b, _| {
            b.iter(|| {
                let relation = RelationChecker::new(&interner, CheckerOptions::strict());
                let mut ctx = InferenceContext::new(
                    &interner,
                    params.clone(),
                    None,
                    InferenceFlags::NONE,
                    &relation,
                );
                ctx.infer(source, target, InferencePriority::NONE, false);
                black_box(ctx.resolve_all())
            })
        });
    }

    group.finish();
}

/// `(cb: (x: T) => void) => T[]` style: contravariant and covariant candidates together.
fn bench_callback_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_callback");

    let interner = TypeInterner::new();
    let t = interner.type_param("T");
    let source = interner.function(FunctionShape::new(
        vec![ParamInfo::unnamed(interner.union2(TypeId::STRING, TypeId::NUMBER))],
        interner.array(TypeId::STRING),
    ));
    let target = interner.function(FunctionShape::new(
        vec![ParamInfo::unnamed(t)],
        interner.array(t),
    ));

    group.bench_function("param_and_return", |b| {
        b.iter(|| {
            let relation = RelationChecker::new(&interner, CheckerOptions::strict());
            let mut ctx =
                InferenceContext::new(&interner, vec![t], None, InferenceFlags::NONE, &relation);
            ctx.infer(source, target, InferencePriority::NONE, false);
            black_box(ctx.resolve(0))
        })
    });

    group.finish();
}

/// Inference from a union of many literal sources to a naked type parameter.
fn bench_candidate_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_candidates");

    for n in [4, 16, 64] {
        let interner = TypeInterner::new();
        let t = interner.type_param("T");
        let sources: Vec<TypeId> = (0..n).map(|i| interner.literal_number(i as f64)).collect();

        group.bench_with_input(BenchmarkId::new("literals", n), &sources, |b, sources| {
            b.iter(|| {
                let relation = RelationChecker::new(&interner, CheckerOptions::strict());
                let mut ctx = InferenceContext::new(
                    &interner,
                    vec![t],
                    None,
                    InferenceFlags::NONE,
                    &relation,
                );
                for &source in sources {
                    ctx.infer(source, t, InferencePriority::NONE, false);
                }
                black_box(ctx.resolve(0))
            })
        });
    }

    group.finish();
}

criterion_group!(
    infer_benches,
    bench_object_properties,
    bench_callback_inference,
    bench_candidate_union
);
criterion_main!(infer_benches);
