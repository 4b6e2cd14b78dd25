//! Segmented LRU, the main space of the TinyLFU cache.
//! New residents enter the probation segment, a second hit promotes them to the protected one.

use ::lru::LruCache;
use std::hash::Hash;

/// protected segment share of the main space, in percent
const PROTECTED_RATIO: usize = 80;

pub(super) struct Slru<K: Hash + Eq, V> {
    probation: LruCache<K, V>,
    protected: LruCache<K, V>,
    probation_cap: usize,
    protected_cap: usize,
}

impl<K: Hash + Eq + Clone, V: Clone> Slru<K, V> {
    pub(super) fn with_capacity(cap: usize) -> Self {
        let protected_cap = cap * PROTECTED_RATIO / 100;
        Slru {
            probation: LruCache::unbounded(),
            protected: LruCache::unbounded(),
            probation_cap: cap - protected_cap,
            protected_cap,
        }
    }

    pub(super) fn cap(&self) -> usize {
        self.probation_cap + self.protected_cap
    }

    pub(super) fn len(&self) -> usize {
        self.probation.len() + self.protected.len()
    }

    /// `get` moves a protected hit to the front, and promotes a probation hit.
    /// When the protected segment is full, the promoted entry swaps its place
    /// with the least recently used protected one.
    pub(super) fn get(&mut self, key: &K) -> Option<V> {
        if let Some(value) = self.protected.get(key) {
            return Some(value.clone());
        }
        let value = self.probation.pop(key)?;
        if self.protected.len() < self.protected_cap {
            self.protected.put(key.clone(), value.clone());
            return Some(value);
        }
        match self.protected.pop_lru() {
            Some((demoted_key, demoted_value)) => {
                self.protected.put(key.clone(), value.clone());
                self.probation.put(demoted_key, demoted_value);
            }
            // no protected space at all
            None => {
                self.probation.put(key.clone(), value.clone());
            }
        }
        Some(value)
    }

    /// `peek` reads the value without touching the segments.
    pub(super) fn peek(&self, key: &K) -> Option<&V> {
        self.protected.peek(key).or_else(|| self.probation.peek(key))
    }

    pub(super) fn contains(&self, key: &K) -> bool {
        self.protected.contains(key) || self.probation.contains(key)
    }

    /// `victim` is the entry to be evicted by the next admission,
    /// there is no victim until the main space is full.
    pub(super) fn victim(&self) -> Option<&K> {
        if self.len() < self.cap() {
            return None;
        }
        self.probation.iter().next_back().map(|(k, _)| k)
    }

    /// `add` puts a new entry into the probation segment, evicting the victim if the space is full.
    pub(super) fn add(&mut self, key: K, value: V) {
        if self.cap() == 0 {
            return;
        }
        if self.len() >= self.cap() && self.probation.pop_lru().is_none() {
            self.protected.pop_lru();
        }
        self.probation.put(key, value);
    }

    pub(super) fn remove(&mut self, key: &K) -> Option<V> {
        self.protected.pop(key).or_else(|| self.probation.pop(key))
    }

    pub(super) fn keys(&self) -> impl Iterator<Item = &K> {
        self.protected
            .iter()
            .chain(self.probation.iter())
            .map(|(k, _)| k)
    }

    pub(super) fn clear(&mut self) {
        self.probation.clear();
        self.protected.clear();
    }
}
