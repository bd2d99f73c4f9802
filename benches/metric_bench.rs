use chrono::DateTime;
use criterion::{Criterion, criterion_group, criterion_main};
use cubism_rs::api::{Completion, Context, Cubism, RequestFn};
use cubism_rs::core::format::format_si;
use cubism_rs::HeadlessBackend;
use std::hint::black_box;

fn loaded_context() -> Context<HeadlessBackend> {
    let epoch = DateTime::from_timestamp(1_400_000_000, 0).expect("valid epoch");
    Cubism::new(HeadlessBackend::at(epoch))
        .context()
        .expect("context")
}

fn bench_derived_value_at(c: &mut Criterion) {
    let context = loaded_context();
    let size = context.size();
    let metric = context.new_metric(
        RequestFn::new(move |_, _, _, done: Completion| {
            done.complete((0..size).map(|i| (i as f64 * 0.01).sin()).collect());
        }),
        "wave",
    );
    let derived = metric
        .multiply(&context.constant(100.0))
        .and_then(|scaled| scaled.subtract(&metric))
        .expect("same context");
    derived.on_change(|_| {});

    c.bench_function("derived_value_at_1440", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for index in 0..size {
                sum += derived.value_at(black_box(index)).unwrap_or(0.0);
            }
            sum
        })
    });

    c.bench_function("derived_extent_1440", |b| b.iter(|| black_box(derived.extent())));
}

fn bench_format_si(c: &mut Criterion) {
    c.bench_function("format_si_2", |b| {
        b.iter(|| format_si(black_box(12_345.678), black_box(2)))
    });
}

criterion_group!(benches, bench_derived_value_at, bench_format_si);
criterion_main!(benches);
