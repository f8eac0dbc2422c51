//! Bounded least-recently-used cache for validation results.

use std::collections::HashMap;
use std::hash::Hash;

/// Fixed-capacity map that evicts the least recently used entry.
///
/// Recency is tracked in a `Vec`, oldest first.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    order: Vec<K>,
    map: HashMap<K, V>,
}

impl<K: Clone + Eq + Hash, V> LruCache<K, V> {
    /// Creates a cache holding at most `capacity` entries. A zero capacity
    /// stores nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: Vec::with_capacity(capacity.min(1024)),
            map: HashMap::with_capacity(capacity.min(1024)),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.map.contains_key(key) {
            self.touch(key);
            self.map.get(key)
        } else {
            None
        }
    }

    /// Inserts or refreshes an entry, returning the evicted one if the cache
    /// was full.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.capacity == 0 {
            return None;
        }
        if self.map.contains_key(&key) {
            self.touch(&key);
            self.map.insert(key, value);
            return None;
        }

        let evicted = if self.order.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        self.order.push(key.clone());
        self.map.insert(key, value);

        evicted
    }

    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        if self.order.is_empty() {
            return None;
        }

        let key = self.order.remove(0);
        let value = self.map.remove(&key)?;
        Some((key, value))
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.map.remove(key)
    }

    /// Drops every entry whose key fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.order.retain(|k| keep(k));
        self.map.retain(|k, _| keep(k));
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos);
            self.order.push(k);
        }
    }
}
