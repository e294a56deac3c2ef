//! Property-Based Tests for the Tiered Cache
//!
//! Drives random operation sequences against a [`TieredCache`] and a plain
//! vector model of both recency lists, then compares them after every call.
//!
//! # Test Properties
//!
//! 1. **Memory Bound**: the memory tier never holds more than its limit
//! 2. **File Bound**: with a file limit, the file tier never exceeds it
//! 3. **Disjointness**: no key is in both tiers at once
//! 4. **Recency**: touched keys move to the back, overflow removes the front
//! 5. **Compute Once**: compute runs iff the key is in neither tier
//! 6. **Read-Only File Hits**: with memory disabled, a file hit writes nothing
//! 7. **Batch Size**: one collection batch deletes `clamp(floor(r*N), 1, N)`

#![cfg(test)]

use std::cell::Cell;

use proptest::prelude::*;

use super::codec::JsonCodec;
use super::file::FileTier;
use super::manager::TieredCache;
use super::policy::GcPolicy;

// =============================================================================
// Model
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Fetch(String),
    Put(String),
    PutToFile(String),
    Remove(String),
}

/// Both tiers as `(key, value)` vectors, least recently touched first
#[derive(Debug, Default)]
struct Model {
    memory_limit: usize,
    file_limit: Option<usize>,
    ratio: f64,
    memory: Vec<(String, u32)>,
    files: Vec<(String, u32)>,
}

fn take(list: &mut Vec<(String, u32)>, key: &str) -> Option<u32> {
    let pos = list.iter().position(|(k, _)| k == key)?;
    Some(list.remove(pos).1)
}

fn batch(ratio: f64, n: usize) -> usize {
    ((ratio * n as f64).floor() as usize).clamp(1, n)
}

impl Model {
    /// Returns the fetched value and whether it was computed
    fn fetch(&mut self, key: &str, fresh: u32) -> (u32, bool) {
        if let Some(value) = take(&mut self.memory, key) {
            self.memory.push((key.to_string(), value));
            return (value, false);
        }
        if let Some(value) = take(&mut self.files, key) {
            if self.memory_limit == 0 {
                self.files.push((key.to_string(), value));
            } else {
                self.insert_memory(key, value);
            }
            return (value, false);
        }
        self.store(key, fresh, false);
        (fresh, true)
    }

    fn store(&mut self, key: &str, value: u32, to_file: bool) {
        if to_file || self.memory_limit == 0 {
            take(&mut self.memory, key);
            self.write_file(key, value);
        } else {
            take(&mut self.files, key);
            self.insert_memory(key, value);
        }
    }

    fn insert_memory(&mut self, key: &str, value: u32) {
        take(&mut self.memory, key);
        self.memory.push((key.to_string(), value));
        if self.memory.len() > self.memory_limit {
            let (evicted, evicted_value) = self.memory.remove(0);
            self.write_file(&evicted, evicted_value);
        }
    }

    fn write_file(&mut self, key: &str, value: u32) {
        take(&mut self.files, key);
        self.files.push((key.to_string(), value));
        if let Some(limit) = self.file_limit {
            while self.files.len() > limit {
                let n = batch(self.ratio, self.files.len());
                self.files.drain(..n);
            }
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        take(&mut self.memory, key).is_some() || take(&mut self.files, key).is_some()
    }

    fn memory_keys(&self) -> Vec<&str> {
        self.memory.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn file_keys(&self) -> Vec<&str> {
        self.files.iter().map(|(k, _)| k.as_str()).collect()
    }
}

// =============================================================================
// Property Strategies
// =============================================================================

/// Small key space so sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = String> {
    (0u8..8).prop_map(|i| format!("k{}", i))
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => key_strategy().prop_map(Op::Fetch),
        2 => key_strategy().prop_map(Op::Put),
        1 => key_strategy().prop_map(Op::PutToFile),
        1 => key_strategy().prop_map(Op::Remove),
    ]
}

/// Ratios 0.05, 0.10, ..., 1.0
fn ratio_strategy() -> impl Strategy<Value = f64> {
    (1u32..=20).prop_map(|x| x as f64 / 20.0)
}

fn limits_strategy() -> impl Strategy<Value = (usize, Option<usize>, f64)> {
    (0usize..4, prop::option::of(0usize..6), ratio_strategy())
}

// =============================================================================
// Model Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the cache matches the model after every operation, and the
    /// tier bounds and disjointness hold throughout.
    #[test]
    fn prop_matches_model(
        (memory_limit, file_limit, ratio) in limits_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut cache: TieredCache<u32> =
            TieredCache::new(dir.path(), memory_limit, file_limit, ratio).unwrap();
        let mut model = Model {
            memory_limit,
            file_limit,
            ratio,
            ..Model::default()
        };

        for (step, op) in ops.iter().enumerate() {
            let fresh = step as u32;
            match op {
                Op::Fetch(key) => {
                    let computed = Cell::new(false);
                    let value = cache
                        .fetch(key, || {
                            computed.set(true);
                            fresh
                        })
                        .unwrap();
                    let (expected, expect_compute) = model.fetch(key, fresh);
                    prop_assert_eq!(value, expected);
                    prop_assert_eq!(computed.get(), expect_compute);
                }
                Op::Put(key) => {
                    prop_assert_eq!(cache.put(key, fresh).unwrap(), fresh);
                    model.store(key, fresh, false);
                }
                Op::PutToFile(key) => {
                    prop_assert_eq!(cache.put_to_file(key, fresh).unwrap(), fresh);
                    model.store(key, fresh, true);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(cache.remove(key).unwrap(), model.remove(key));
                }
            }

            let memory: Vec<&str> = cache.in_memory_keys().collect();
            let files: Vec<&str> = cache.file_keys().collect();

            prop_assert!(memory.len() <= memory_limit);
            if let Some(limit) = file_limit {
                prop_assert!(files.len() <= limit);
            }
            prop_assert!(memory.iter().all(|k| !files.contains(k)));

            prop_assert_eq!(&memory, &model.memory_keys());
            prop_assert_eq!(&files, &model.file_keys());
        }

        // Directory holds exactly the tracked files
        let mut on_disk: Vec<String> = std::fs::read_dir(cache.directory())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        on_disk.sort();
        let mut expected: Vec<String> = model
            .file_keys()
            .iter()
            .map(|k| format!("{}.json", k))
            .collect();
        expected.sort();
        prop_assert_eq!(on_disk, expected);
    }

    /// Property: with memory disabled, file hits never write.
    #[test]
    fn prop_disabled_memory_hits_do_not_write(
        keys in prop::collection::vec(key_strategy(), 1..40),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut cache: TieredCache<String> = TieredCache::new(dir.path(), 0, None, 0.1).unwrap();

        for key in &keys {
            let present = cache.contains(key);
            let writes_before = cache.metrics().file_writes;

            let value = cache.fetch(key, || key.to_uppercase()).unwrap();
            prop_assert_eq!(value, key.to_uppercase());

            let writes = cache.metrics().file_writes - writes_before;
            prop_assert_eq!(writes, if present { 0 } else { 1 });
            prop_assert_eq!(cache.in_memory_len(), 0);
        }
    }
}

// =============================================================================
// Collection Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the write that overflows the tier deletes exactly one batch
    /// of the oldest files.
    #[test]
    fn prop_batch_size(limit in 0usize..20, ratio in ratio_strategy()) {
        let dir = tempfile::tempdir().unwrap();
        let policy = GcPolicy::new(Some(limit), ratio).unwrap();
        let mut tier = FileTier::open(dir.path().to_path_buf(), JsonCodec, policy).unwrap();

        for i in 0..limit {
            prop_assert!(tier.write(&i.to_string(), &i).unwrap().is_empty());
        }

        let report = tier.write(&limit.to_string(), &limit).unwrap();
        let expected = batch(ratio, limit + 1);
        let oldest: Vec<String> = (0..expected).map(|i| i.to_string()).collect();

        prop_assert_eq!(report.batches, 1);
        prop_assert_eq!(report.collected, oldest);
        prop_assert_eq!(tier.len(), limit + 1 - expected);
    }

    /// Property: batch size always lies in [1, N] for a non-empty tier.
    #[test]
    fn prop_batch_size_bounds(n in 1usize..10_000, ratio in ratio_strategy()) {
        let policy = GcPolicy::new(Some(0), ratio).unwrap();
        let size = policy.batch_size(n);
        prop_assert!(size >= 1);
        prop_assert!(size <= n);
        prop_assert_eq!(size, batch(ratio, n));
    }
}
