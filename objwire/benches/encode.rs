use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use objwire::{AdapterBuilder, Context, FieldUnit, ObjectAdapter, Value, WriterFeatures};
use std::hint::black_box;

struct Record {
    id: i64,
    name: String,
    score: f64,
    active: bool,
    tags: Vec<String>,
}

fn adapter() -> ObjectAdapter<Record> {
    AdapterBuilder::new("Record")
        .field(FieldUnit::field("id", |r: &Record| Value::Int(r.id)))
        .field(FieldUnit::field("name", |r: &Record| {
            Value::Str(r.name.clone())
        }))
        .field(FieldUnit::field("score", |r: &Record| Value::Double(r.score)))
        .field(FieldUnit::field("active", |r: &Record| Value::Bool(r.active)))
        .field(FieldUnit::field("tags", |r: &Record| {
            Value::Array(r.tags.iter().map(|t| Value::Str(t.clone())).collect())
        }))
        .build()
        .unwrap()
}

fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record {
            id: i as i64,
            name: format!("record-{i}"),
            score: i as f64 * 0.5,
            active: i % 2 == 0,
            tags: vec!["alpha".to_owned(), "beta".to_owned()],
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let adapter = adapter();
    let mut group = c.benchmark_group("encode");

    for &n in &[1, 64, 1024] {
        let batch = records(n);
        group.throughput(Throughput::Elements(n as u64));

        let ctx = Context::default();
        group.bench_with_input(BenchmarkId::new("text", n), &batch, |b, batch| {
            b.iter(|| {
                for record in batch {
                    black_box(adapter.to_text(record, &ctx).unwrap());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("packed", n), &batch, |b, batch| {
            b.iter(|| {
                for record in batch {
                    black_box(adapter.to_packed(record, &ctx).unwrap());
                }
            });
        });

        let mapped = Context::with_features(WriterFeatures::ARRAY_MAPPED);
        group.bench_with_input(
            BenchmarkId::new("packed_array_mapped", n),
            &batch,
            |b, batch| {
                b.iter(|| {
                    for record in batch {
                        black_box(adapter.to_packed(record, &mapped).unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
