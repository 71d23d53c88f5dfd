//! Projection Benchmarks
//!
//! Measures record projection, list broadcast and variable interpolation over
//! synthetic data of increasing size.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use octofhir_projection::{ContextFn, ObjectProjection, Projection, ProjectionEngine, Variables};
use serde_json::{Value, json};
use std::hint::black_box;

fn generate_users(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|id| {
                json!({
                    "id": id,
                    "name": format!("User {id:06}"),
                    "born": format!("{}-{:02}-{:02}", 1950 + (id % 70), 1 + (id % 12), 1 + (id % 28)),
                    "address": {
                        "city": format!("City{:04}", id / 100),
                        "street": format!("{} Main Street", id + 1)
                    },
                    "tags": ["a", "b", "c"]
                })
            })
            .collect(),
    )
}

fn user_projection() -> Projection {
    ObjectProjection::new()
        .field("id", "number")
        .field("name", "string")
        .field("born", "date")
        .field("tags", "array<string>")
        .field("address", ObjectProjection::new().field("city", "string"))
        .field("label", "{{current.name}} from {{prefix}}")
        .field("upper", ContextFn::sync(|ctx| {
            Ok(ctx.field("name").and_then(|v| v.as_str()).map(str::to_uppercase))
        }))
        .into()
}

fn bench_list_projection(c: &mut Criterion) {
    let engine = ProjectionEngine::with_global(Variables::new().with("prefix", "bench"));
    let projector = engine.create(user_projection());
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("list_projection");
    group.sample_size(20);

    for size in [10usize, 100, 1000] {
        let data = generate_users(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(rt.block_on(projector.project(data.clone(), None)).unwrap()))
        });
    }

    group.finish();
}

fn bench_interpolation(c: &mut Criterion) {
    let engine = ProjectionEngine::with_global(
        Variables::new()
            .with("title", "Hello")
            .with("symbol", "!")
            .with("double", ContextFn::sync(|ctx| Ok(ctx.data.as_i64().unwrap_or_default() * 2))),
    );
    let rt = tokio::runtime::Runtime::new().unwrap();

    let cases = [
        ("whole", "{{title}}"),
        ("embedded", "{{title}} world{{symbol}}"),
        ("fallback", "{{missing || other || \"fallback\"}}"),
        ("pipe", "{{count|double}}"),
    ];

    let mut group = c.benchmark_group("interpolation");
    for (name, template) in cases {
        let projector = engine.create(ObjectProjection::new().field("value", template));
        let instance = Variables::new().with("count", 21);
        group.bench_function(name, |b| {
            b.iter(|| {
                black_box(
                    rt.block_on(projector.project(json!({ "x": 1 }), Some(instance.clone())))
                        .unwrap(),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(projection_benchmarks, bench_list_projection, bench_interpolation);
criterion_main!(projection_benchmarks);
