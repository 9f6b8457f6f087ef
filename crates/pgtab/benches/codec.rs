use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgtab::{TypeRegistry, Value, ValueCodec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Payload {
    name: String,
    items: Vec<i64>,
}

fn codec() -> ValueCodec {
    ValueCodec::new(TypeRegistry::new().with::<Payload>())
}

fn payload(n: usize) -> Value {
    Value::object(Payload {
        name: "bench".to_string(),
        items: (0..n as i64).collect(),
    })
}

fn bench_scalars(c: &mut Criterion) {
    let codec = codec();
    let mut group = c.benchmark_group("codec/scalar");

    let cases = [
        ("i32", Value::I32(42)),
        ("f64", Value::F64(1.25)),
        ("text", Value::from("hello world")),
        ("numeric_text", Value::from("42")),
    ];
    for (label, value) in cases {
        group.bench_with_input(BenchmarkId::new("to_storage", label), &value, |b, v| {
            b.iter(|| black_box(codec.to_storage(v)));
        });

        let stored = codec.to_storage(&value).ok().flatten().unwrap_or_default();
        group.bench_with_input(BenchmarkId::new("from_storage", label), &stored, |b, s| {
            b.iter(|| black_box(codec.from_storage(Some(s))));
        });
    }

    group.finish();
}

fn bench_envelopes(c: &mut Criterion) {
    let codec = codec();
    let mut group = c.benchmark_group("codec/envelope");

    for n in [0, 10, 100, 1000] {
        let value = payload(n);
        let stored = codec.to_storage(&value).ok().flatten().unwrap_or_default();

        group.bench_with_input(BenchmarkId::new("to_storage", n), &value, |b, v| {
            b.iter(|| black_box(codec.to_storage(v)));
        });
        group.bench_with_input(BenchmarkId::new("from_storage", n), &stored, |b, s| {
            b.iter(|| black_box(codec.from_storage(Some(s))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scalars, bench_envelopes);
criterion_main!(benches);
