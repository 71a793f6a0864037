//! The multi-threaded mapping workload: several named workers hammer one
//! shared `SynchronizedMap` with add / check / update / read / pop cycles.

use std::{sync::Arc, thread};

use pretty_assertions::assert_eq;
use tsafe_error::codes;
use tsafe_intercept::{
    strategies::StatisticsStrategy, GuardConfig, Interceptor, SynchronizedMap,
};

const WORKERS: usize = 5;
const ITERATIONS: usize = 2000;

fn worker(map: &SynchronizedMap<String, String>, id: usize) {
    for i in 0..ITERATIONS {
        let added = format!("added-{id}-{i}");
        let kept = format!("kept-{id}-{i}");

        map.insert(added.clone(), kept.clone()).unwrap();
        assert!(map.contains_key(&added).unwrap());

        map.update([(kept.clone(), added.clone())]).unwrap();
        assert_eq!(map.get(&kept).unwrap().as_deref(), Some(added.as_str()));
        assert_eq!(map.get_or_fail(&kept).unwrap(), added);

        assert_eq!(map.pop(&added).unwrap(), kept);
    }
}

#[test]
fn workers_leave_exactly_the_updated_keys() {
    let stats = Arc::new(StatisticsStrategy::new());
    let mut interceptor = Interceptor::with_config("map", GuardConfig::default()).unwrap();
    interceptor.add_strategy(stats.clone());
    let map = Arc::new(SynchronizedMap::with_interceptor(Arc::new(interceptor)).unwrap());

    let handles: Vec<_> = (0..WORKERS)
        .map(|id| {
            let map = Arc::clone(&map);
            thread::Builder::new()
                .name(format!("WorkerThread{id}"))
                .spawn(move || worker(&map, id))
                .unwrap()
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(map.len().unwrap(), WORKERS * ITERATIONS);
    assert!(map.keys().unwrap().iter().all(|k| k.starts_with("kept-")));
    assert!(map.as_guarded().state().is_idle());

    let calls = (WORKERS * ITERATIONS) as u64;
    for member in ["insert", "contains_key", "update", "get", "get_or_fail", "pop"] {
        let op = stats
            .get_operation_stats(&format!("SynchronizedMap.{member}"))
            .unwrap();
        assert_eq!(op.success_count, calls, "{member}");
        assert_eq!(op.rejection_count, 0, "{member}");
    }
}

#[test]
fn popping_a_missing_key_fails_without_poisoning_the_map() {
    let map: SynchronizedMap<String, u32> = SynchronizedMap::new().unwrap();
    assert_eq!(map.pop("nobody").unwrap_err().code, codes::KEY_NOT_FOUND);
    map.insert("somebody".to_string(), 1).unwrap();
    assert_eq!(map.pop("somebody").unwrap(), 1);
    assert!(map.is_empty().unwrap());
}
