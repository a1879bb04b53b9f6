use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kgc_bitmatrix::BitMatrix;
use kgc_shacl::{CompiledShape, ShapeValidator};

fn populated_validator() -> ShapeValidator {
    let mut v = ShapeValidator::create(10_000, 16, 16, 4, 1).unwrap();
    let mut target = BitMatrix::new(1, 16);
    target.set(0, 1);
    let mut required = BitMatrix::new(1, 16);
    required.set(0, 7);
    v.register_shape(0, CompiledShape::basic(target, required)).unwrap();

    for n in 0..10_000u32 {
        v.set_class(n, 1).unwrap();
        v.set_property(n, 7).unwrap();
    }
    v
}

fn bench_validate_node(c: &mut Criterion) {
    let v = populated_validator();
    c.bench_function("validate_node", |b| {
        b.iter(|| black_box(v.validate_node(black_box(42), black_box(0))))
    });
}

fn bench_validate_batch(c: &mut Criterion) {
    let v = populated_validator();
    let pairs: Vec<(u32, u32)> = (0..1000u32).map(|n| (n, 0)).collect();
    c.bench_function("validate_batch_1000", |b| {
        b.iter(|| black_box(v.validate_batch(black_box(&pairs), None, 1)))
    });
}

criterion_group!(benches, bench_validate_node, bench_validate_batch);
criterion_main!(benches);
