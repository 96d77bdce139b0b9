//! Benchmarks for aggregate reads over wide and deep form trees.
//!
//! Run with: cargo bench -p sweety-form-core -- aggregate

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use sweety_form_core::{Field, FormNode, List, Shape, form_shape};

form_shape! {
    struct Row {
        label: Field<String, String>,
        amount: Field<i64, String>,
    }
    value RowValue;
    errors RowErrors;
}

fn rows(count: usize) -> List<Shape<Row, String>, String> {
    List::of((0..count).map(|i| {
        Shape::of(Row {
            label: Field::of(format!("row-{i}")),
            amount: Field::of(i as i64),
        })
    }))
}

// ---------------------------------------------------------------------------
// 1. Wide list of shapes
// ---------------------------------------------------------------------------

fn bench_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate/wide");

    for count in [10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(count as u64));
        let list = rows(count);

        group.bench_with_input(BenchmarkId::new("value", count), &list, |b, list| {
            b.iter(|| black_box(list.value()));
        });

        group.bench_with_input(BenchmarkId::new("error_clean", count), &list, |b, list| {
            b.iter(|| black_box(list.error()));
        });

        let dirty = rows(count);
        dirty.mutate_items(|items| {
            if let Some(last) = items.last() {
                last.fields().amount.set_error(Some("negative".to_string()));
            }
        });
        group.bench_with_input(BenchmarkId::new("error_one_dirty", count), &dirty, |b, list| {
            b.iter(|| black_box(list.error()));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 2. Deeply nested lists
// ---------------------------------------------------------------------------

fn bench_deep(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate/deep");

    let leaf: List<Field<i64, String>> = List::of((0..8).map(Field::of));
    let level1: List<List<Field<i64, String>>> = List::of((0..8).map(|_| leaf.clone()));
    let level2: List<List<List<Field<i64, String>>>> = List::of((0..8).map(|_| level1.clone()));

    group.bench_function("value_512_leaves", |b| b.iter(|| black_box(level2.value())));
    group.bench_function("error_512_leaves", |b| b.iter(|| black_box(level2.error())));

    group.finish();
}

criterion_group!(benches, bench_wide, bench_deep);
criterion_main!(benches);
