use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kgc_reasoner::Reasoner;
use kgc_store::TripleStore;

const RDF_TYPE: u32 = 0;

fn materialized_reasoner() -> (Reasoner, TripleStore) {
    let mut store = TripleStore::create(1, 1, 2000).unwrap();
    let mut reasoner = Reasoner::create(2000, 1, RDF_TYPE).unwrap();
    for c in 0..1999u32 {
        reasoner.add_subclass(c, c + 1).unwrap();
    }
    reasoner.materialize(&mut store, None, 1).unwrap();
    (reasoner, store)
}

fn bench_is_subclass_of(c: &mut Criterion) {
    let (reasoner, _store) = materialized_reasoner();
    c.bench_function("is_subclass_of_direct", |b| {
        b.iter(|| black_box(reasoner.is_subclass_of(black_box(5), black_box(6))))
    });
    c.bench_function("is_subclass_of_far_ancestor", |b| {
        b.iter(|| black_box(reasoner.is_subclass_of(black_box(0), black_box(1999))))
    });
}

fn bench_materialize(c: &mut Criterion) {
    c.bench_function("materialize_2000_class_chain", |b| {
        b.iter_batched(
            || {
                let store = TripleStore::create(1, 1, 2000).unwrap();
                let mut reasoner = Reasoner::create(2000, 1, RDF_TYPE).unwrap();
                for class in 0..1999u32 {
                    reasoner.add_subclass(class, class + 1).unwrap();
                }
                (reasoner, store)
            },
            |(mut reasoner, mut store)| {
                reasoner.materialize(&mut store, None, 1).unwrap();
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_is_subclass_of, bench_materialize);
criterion_main!(benches);
