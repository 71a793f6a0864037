//! The multi-threaded mapping workload.
//!
//! Each worker runs `iterations` cycles against one shared map: insert a
//! fresh key, check it is present, update a second key, read the second key
//! back both ways, then pop the first key. Only the updated keys survive, so
//! the final size is the number of distinct update keys.

use std::{
    collections::HashSet,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};
use tsafe_intercept::SynchronizedMap;

/// Length of every generated key and value
pub const KEY_LEN: usize = 10;

/// The map type the workload drives
pub type SharedMap = SynchronizedMap<String, String>;

/// Deterministic generator of lowercase keys (xorshift64).
#[derive(Debug, Clone)]
pub struct KeyGen {
    state: u64,
}

impl KeyGen {
    /// Creates a generator; a zero seed is replaced with 1.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// A string of [`KEY_LEN`] letters `a..=z`.
    pub fn next_key(&mut self) -> String {
        (0..KEY_LEN)
            .map(|_| {
                let offset = u8::try_from(self.next_u64() % 26).unwrap_or(0);
                char::from(b'a' + offset)
            })
            .collect()
    }
}

/// Parameters of one run
#[derive(Debug, Clone, Copy)]
pub struct WorkloadConfig {
    /// Number of worker threads
    pub threads:    usize,
    /// Cycles per worker
    pub iterations: usize,
    /// Seed from which every worker's generator is derived
    pub seed:       u64,
}

/// What a finished run observed
#[derive(Debug, Clone)]
pub struct WorkloadReport {
    /// Entries left in the map
    pub final_len:            usize,
    /// Distinct keys written by `update` across all workers
    pub distinct_update_keys: usize,
    /// Wall-clock time of the run
    pub elapsed:              Duration,
}

impl WorkloadReport {
    /// Whether the map holds exactly the updated keys
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.final_len == self.distinct_update_keys
    }
}

fn worker_seed(seed: u64, worker: usize) -> u64 {
    // Spread worker seeds apart so the generators do not share prefixes.
    seed ^ (worker as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn run_worker(map: &SharedMap, worker: usize, iterations: usize, seed: u64) -> Result<HashSet<String>> {
    let mut keys = KeyGen::new(worker_seed(seed, worker));
    let mut updated = HashSet::with_capacity(iterations);

    for _ in 0..iterations {
        // The worker prefix keeps added keys private to their worker.
        let added = format!("{worker}:{}", keys.next_key());
        let kept = keys.next_key();
        let value = keys.next_key();

        map.insert(added.clone(), value.clone())?;
        if !map.contains_key(&added)? {
            bail!("key {added} vanished right after insert");
        }

        map.update([(kept.clone(), value.clone())])?;
        let read = map.get(&kept)?;
        let indexed = map.get_or_fail(&kept)?;
        debug!(key = %kept, ?read, %indexed, "read back updated key");

        map.pop(&added)
            .with_context(|| format!("popping {added}"))?;
        updated.insert(kept);
    }

    Ok(updated)
}

/// Runs the workload against `map` and reports the outcome.
///
/// # Errors
///
/// A worker thread that could not be spawned, panicked, or hit a guarded
/// call error.
pub fn run(map: &Arc<SharedMap>, config: WorkloadConfig) -> Result<WorkloadReport> {
    let started = Instant::now();
    info!(
        threads = config.threads,
        iterations = config.iterations,
        seed = config.seed,
        "starting workers"
    );

    let handles = (0..config.threads)
        .map(|worker| {
            let map = Arc::clone(map);
            thread::Builder::new()
                .name(format!("WorkerThread{worker}"))
                .spawn(move || run_worker(&map, worker, config.iterations, config.seed))
                .with_context(|| format!("spawning WorkerThread{worker}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut updated = HashSet::new();
    for (worker, handle) in handles.into_iter().enumerate() {
        let keys = handle
            .join()
            .map_err(|_| anyhow!("WorkerThread{worker} panicked"))??;
        updated.extend(keys);
    }

    let report = WorkloadReport {
        final_len:            map.len()?,
        distinct_update_keys: updated.len(),
        elapsed:              started.elapsed(),
    };
    info!(
        final_len = report.final_len,
        distinct_update_keys = report.distinct_update_keys,
        elapsed = ?report.elapsed,
        "workers finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic_lowercase() {
        let mut a = KeyGen::new(42);
        let mut b = KeyGen::new(42);
        for _ in 0..32 {
            let key = a.next_key();
            assert_eq!(key, b.next_key());
            assert_eq!(key.len(), KEY_LEN);
            assert!(key.bytes().all(|c| c.is_ascii_lowercase()));
        }
        assert_ne!(KeyGen::new(1).next_key(), KeyGen::new(2).next_key());
    }

    #[test]
    fn zero_seed_still_generates() {
        assert_eq!(KeyGen::new(0).next_key(), KeyGen::new(1).next_key());
    }

    #[test]
    fn small_run_is_consistent() {
        let map = Arc::new(SharedMap::new().unwrap());
        let report = run(
            &map,
            WorkloadConfig {
                threads:    3,
                iterations: 100,
                seed:       7,
            },
        )
        .unwrap();
        assert!(report.is_consistent());
        assert!(report.final_len > 0);
        assert!(map.keys().unwrap().iter().all(|k| !k.contains(':')));
    }
}
