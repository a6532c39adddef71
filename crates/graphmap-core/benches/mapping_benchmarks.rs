//! Benchmarks for the mapping engine
//!
//! These benchmarks cover dispatch on scalars, flat and nested object
//! graphs in eager and lazy mode, and cyclic graphs.
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use graphmap_core::{
    ClassBuilder, ClassRegistry, Context, Mapper, MapperOptions, ObjectRef, Type, Value,
};
use std::sync::Arc;

fn classes() -> Arc<ClassRegistry> {
    let classes = Arc::new(ClassRegistry::new());
    classes
        .define(
            ClassBuilder::new("Customer")
                .field("name", "string")
                .field("email", "string")
                .field("orders", "list<Order>"),
        )
        .unwrap();
    classes
        .define(
            ClassBuilder::new("Order")
                .field("id", "int")
                .field("total", "float")
                .field("customer", "?Customer"),
        )
        .unwrap();
    classes
        .define(
            ClassBuilder::new("CustomerDto")
                .field("name", "string")
                .field("email", "string")
                .field("orders", "list<OrderDto>"),
        )
        .unwrap();
    classes
        .define(
            ClassBuilder::new("OrderDto")
                .field_with("id", "int", |p| p.eager())
                .field("total", "float")
                .field("customer", "?CustomerDto"),
        )
        .unwrap();
    classes
}

fn mapper(options: MapperOptions) -> Mapper {
    Mapper::builder()
        .provider(classes())
        .options(options)
        .warm_up("Customer", "CustomerDto")
        .warm_up("Order", "OrderDto")
        .build()
        .unwrap()
}

fn customer(orders: usize) -> ObjectRef {
    let customer = ObjectRef::with_fields(
        "Customer",
        [
            ("name", Value::from("Ada")),
            ("email", Value::from("ada@example.org")),
        ],
    );
    let orders: Vec<Value> = (0..orders)
        .map(|i| {
            Value::from(ObjectRef::with_fields(
                "Order",
                [
                    ("id", Value::from(i as i64)),
                    ("total", Value::from(i as f64 * 1.5)),
                    ("customer", Value::from(&customer)),
                ],
            ))
        })
        .collect();
    customer.set("orders", Value::list(orders)).unwrap();
    customer
}

fn bench_scalars(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalars");
    let mapper = mapper(MapperOptions::default());

    group.bench_function("string_to_int", |b| {
        let source = Value::from("12345");
        b.iter(|| mapper.map_to(black_box(&source), "int").unwrap())
    });

    group.bench_function("list_of_ints_to_strings", |b| {
        let source = Value::list((0..100).map(Value::from));
        let target = Type::parse("list<string>").unwrap();
        b.iter(|| {
            mapper
                .map(black_box(&source), target.clone(), &Context::new())
                .unwrap()
        })
    });

    group.finish();
}

fn bench_object_graphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("object_graphs");

    for orders in [1, 10, 100] {
        let source = Value::from(customer(orders));

        let eager = mapper(MapperOptions::default().lazy_loading(false));
        group.bench_with_input(BenchmarkId::new("eager", orders), &source, |b, source| {
            b.iter(|| {
                eager
                    .map(black_box(source), Type::object("CustomerDto"), &Context::new())
                    .unwrap()
            })
        });

        let lazy = mapper(MapperOptions::default());
        group.bench_with_input(BenchmarkId::new("lazy_untouched", orders), &source, |b, source| {
            b.iter(|| {
                lazy.map(black_box(source), Type::object("CustomerDto"), &Context::new())
                    .unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("lazy_materialized", orders), &source, |b, source| {
            b.iter(|| {
                let dto = lazy
                    .map(black_box(source), Type::object("CustomerDto"), &Context::new())
                    .unwrap();
                let dto = dto.as_object().unwrap();
                dto.get("orders").unwrap()
            })
        });
    }

    group.finish();
}

fn bench_tracing_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracing");
    let source = Value::from(customer(10));

    for trace in [false, true] {
        let mapper = mapper(MapperOptions::default().lazy_loading(false).trace(trace));
        group.bench_with_input(BenchmarkId::new("trace", trace), &source, |b, source| {
            b.iter(|| {
                mapper
                    .map(black_box(source), Type::object("CustomerDto"), &Context::new())
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_scalars,
    bench_object_graphs,
    bench_tracing_overhead
);

criterion_main!(benches);
