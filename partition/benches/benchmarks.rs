use criterion::{black_box, criterion_group, criterion_main, Criterion};

use common::shapes::Polygon;
use nalgebra::Point2;
use partition::{Collidable, Map, PartitionedMap, QueryFilter};
use rand::prelude::*;

fn filled_map(rng: &mut impl Rng, count: usize) -> (PartitionedMap, Vec<u32>) {
    let mut map = PartitionedMap::new(1000.0, 1000.0).unwrap();
    let bounds = Polygon::rectangle(5.0, 5.0).unwrap();
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let position = Point2::new(rng.gen_range(10.0..990.0), rng.gen_range(10.0..990.0));
        ids.push(map.register(Collidable::new(position, bounds.clone())));
    }
    (map, ids)
}

fn register_benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let mut map = PartitionedMap::new(1000.0, 1000.0).unwrap();
    let bounds = Polygon::rectangle(5.0, 5.0).unwrap();
    c.bench_function("partitioned_register", |b| {
        b.iter(|| {
            let position = Point2::new(rng.gen_range(10.0..990.0), rng.gen_range(10.0..990.0));
            map.register(black_box(Collidable::new(position, bounds.clone())));
        })
    });
}

fn unregister_benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let (mut map, ids) = filled_map(&mut rng, 1000);
    c.bench_function("partitioned_unregister", |b| {
        b.iter(|| {
            let index = rng.gen_range(0..ids.len());
            let _ = map.unregister(black_box(ids[index]));
        })
    });
}

fn relocate_benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let (mut map, ids) = filled_map(&mut rng, 1000);
    c.bench_function("partitioned_relocate", |b| {
        b.iter(|| {
            let index = rng.gen_range(0..ids.len());
            let position = Point2::new(rng.gen_range(10.0..990.0), rng.gen_range(10.0..990.0));
            let _ = map.relocate(black_box(ids[index]), position);
        })
    });
}

fn trace_benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let (map, _ids) = filled_map(&mut rng, 1000);
    let mover = Polygon::rectangle(4.0, 4.0).unwrap();
    c.bench_function("partitioned_trace_exhaust", |b| {
        b.iter(|| {
            let from = Point2::new(rng.gen_range(10.0..990.0), rng.gen_range(10.0..990.0));
            let to = Point2::new(rng.gen_range(10.0..990.0), rng.gen_range(10.0..990.0));
            map.trace_exhaust(&mover, black_box(from), to, QueryFilter::none())
        })
    });
}

criterion_group!(
    benches,
    register_benchmark,
    unregister_benchmark,
    relocate_benchmark,
    trace_benchmark
);
criterion_main!(benches);
