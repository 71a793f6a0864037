//! Overhead of guarded calls: the bare protocol, member and standalone
//! calls, and the synchronized map.

use std::{hint::black_box, sync::Arc};

use criterion::{criterion_main, Criterion};
use tsafe_intercept::{
    strategies::StatisticsStrategy, GuardConfig, Guarded, GuardedFn, GuardedType, Interceptor,
    MemberSet, SynchronizedMap,
};
use tsafe_sync::{NoopObserver, SyncState};

struct Counter {
    value: u64,
}

impl GuardedType for Counter {
    fn enumerate_members(members: &mut MemberSet) -> tsafe_error::Result<()> {
        members.add("increment")?;
        Ok(())
    }
}

fn add(a: u64, b: u64) -> u64 {
    a + b
}

static ADD: GuardedFn<fn(u64, u64) -> u64> = GuardedFn::new("add", add);

fn benchmark_protocol(c: &mut Criterion) {
    let mut group = c.benchmark_group("protocol");

    let state = SyncState::new();
    group.bench_function("execute_uncontended", |b| {
        b.iter(|| state.execute(None, &NoopObserver, || black_box(1_u64)).unwrap());
    });

    group.finish();
}

fn benchmark_guarded_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("guarded_calls");

    let counter = Guarded::new(Counter { value: 0 }).unwrap();
    group.bench_function("member_call", |b| {
        b.iter(|| counter.call("increment", |c| c.value += black_box(1)).unwrap());
    });

    group.bench_function("standalone_call", |b| {
        b.iter(|| ADD.call((black_box(2), black_box(3))).unwrap());
    });

    let mut interceptor =
        Interceptor::with_config("bench", GuardConfig::default().with_transitions(true)).unwrap();
    interceptor.add_strategy(Arc::new(StatisticsStrategy::new()));
    let traced = GuardedFn::with_interceptor("traced_add", add, Arc::new(interceptor));
    group.bench_function("standalone_call_with_statistics", |b| {
        b.iter(|| traced.call((black_box(2), black_box(3))).unwrap());
    });

    let map: SynchronizedMap<u64, u64> = SynchronizedMap::new().unwrap();
    group.bench_function("map_insert_get", |b| {
        let mut key = 0_u64;
        b.iter(|| {
            key = key.wrapping_add(1) % 1024;
            map.insert(key, key).unwrap();
            black_box(map.get(&key).unwrap())
        });
    });

    group.finish();
}

mod groups {
    #![allow(missing_docs)]

    use criterion::criterion_group;

    use super::{benchmark_guarded_calls, benchmark_protocol};

    criterion_group!(benches, benchmark_protocol, benchmark_guarded_calls);
}

criterion_main!(groups::benches);
