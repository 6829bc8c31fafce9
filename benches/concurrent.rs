#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, Criterion};
use std::{sync::Arc, thread};
use wirebox::{Config, Container, Inject, InstantiateErrorKind};

const THREADS: usize = 8;
const GETS_PER_THREAD: usize = 64;

struct A(Arc<B>, Arc<C>);
struct B(i32);
struct C(Arc<CA>);
struct CA;

#[inline]
fn container_new(config: Config) -> Container {
    let container = Container::new();
    container
        .register_service::<CA, _, _>(|| Ok::<_, InstantiateErrorKind>(CA), Config::singleton())
        .unwrap();
    container
        .register_service::<C, _, _>(|Inject(ca): Inject<CA>| Ok::<_, InstantiateErrorKind>(C(ca)), config)
        .unwrap();
    container
        .register_service::<B, _, _>(|| Ok::<_, InstantiateErrorKind>(B(2)), config)
        .unwrap();
    container
        .register_service::<A, _, _>(|Inject(b): Inject<B>, Inject(c): Inject<C>| Ok::<_, InstantiateErrorKind>(A(b, c)), config)
        .unwrap();
    container
}

#[inline]
fn container_get_concurrent(container: &Container) {
    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for _ in 0..GETS_PER_THREAD {
                    let _ = container.get_type::<A>().unwrap();
                }
            });
        }
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    let transient = container_new(Config::transient());
    let singleton = container_new(Config::singleton());

    c.bench_function("container_get_concurrent", |b| b.iter(|| container_get_concurrent(&transient)))
        .bench_function("container_get_concurrent_with_cache", |b| {
            b.iter(|| container_get_concurrent(&singleton))
        })
        .bench_function("container_get_concurrent_cold", |b| {
            b.iter(|| container_get_concurrent(&singleton.snapshot(false)))
        });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
