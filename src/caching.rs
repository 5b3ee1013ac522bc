//! Bounded least-recently-used cache for expensive per-file work.
//!
//! Consecutive windows revisit the same snapshot files, so keeping the last
//! few results around avoids reading and triangulating them again. A cache is
//! owned by one worker and is not synchronized.

use std::collections::VecDeque;

pub const DEFAULT_CACHE_SIZE: usize = 2;

/// LRU map with a fixed capacity. Values are handed out as clones, so they are
/// typically cheap shared handles like `Rc`.
#[derive(Debug, Clone)]
pub struct RollingCache<K, V> {
    capacity: usize,
    /// least recently used entry at the front
    entries: VecDeque<(K, V)>,
}

impl<K: PartialEq, V: Clone> RollingCache<K, V> {
    /// Creates an empty cache. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> RollingCache<K, V> {
        let capacity = capacity.max(1);
        RollingCache {
            capacity,
            entries: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Returns the cached value for `key` and marks it as most recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        let entry = self.entries.remove(pos)?;
        let value = entry.1.clone();
        self.entries.push_back(entry);
        Some(value)
    }

    /// Returns the cached value for `key`, or computes, stores and returns it.
    /// Errors of `compute` are passed through and nothing is stored.
    pub fn get_or_compute<F, E>(&mut self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        if let Some(v) = self.get(&key) {
            return Ok(v);
        }

        let value = compute(&key)?;
        self.entries.push_back((key, value.clone()));

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        Ok(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
