//! W-TinyLFU counter cache.
//!
//! A new key enters a small LRU admission window. The key evicted from the window competes
//! with the victim of the main segmented LRU, and it is only admitted when its estimated
//! access frequency is strictly higher. The frequency is estimated by a count-min sketch
//! behind a doorkeeper bloom filter, both aged every `SAMPLES_FACTOR * cap` accesses.

pub mod doorkeeper;
pub mod sketch;
mod slru;

pub use doorkeeper::*;
pub use sketch::*;

use self::slru::Slru;
use super::CounterTrait;
use crate::base::ParamKey;
use ::lru::LruCache;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc, Mutex,
};

/// admission window share of the capacity, in percent
const WINDOW_RATIO: usize = 1;
const SAMPLES_FACTOR: usize = 8;
const DOORKEEPER_FALSE_POSITIVE_RATE: f64 = 0.01;

type Cell = Arc<AtomicI64>;

#[inline]
fn key_hash<K: Hash>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

struct TinyLfu<K: Hash + Eq> {
    window: LruCache<K, Cell>,
    window_cap: usize,
    main: Slru<K, Cell>,
    sketch: CountMinSketch,
    doorkeeper: Doorkeeper,
    /// accesses since the last aging
    accesses: usize,
    samples: usize,
}

impl<K: Hash + Eq + Clone> TinyLfu<K> {
    fn with_capacity(cap: usize) -> Self {
        let window_cap = (cap * WINDOW_RATIO / 100).max(1).min(cap);
        let samples = cap * SAMPLES_FACTOR;
        TinyLfu {
            window: LruCache::unbounded(),
            window_cap,
            main: Slru::with_capacity(cap - window_cap),
            sketch: CountMinSketch::new(cap),
            doorkeeper: Doorkeeper::new(samples, DOORKEEPER_FALSE_POSITIVE_RATE),
            accesses: 0,
            samples,
        }
    }

    fn record(&mut self, hash: u64) {
        self.accesses += 1;
        if self.accesses >= self.samples {
            self.sketch.reset();
            self.doorkeeper.reset();
            self.accesses = 0;
        }
        if self.doorkeeper.put(hash) {
            self.sketch.add(hash);
        }
    }

    fn estimate(&self, hash: u64) -> u64 {
        let mut count = self.sketch.estimate(hash);
        if self.doorkeeper.contains(hash) {
            count += 1;
        }
        count
    }

    fn get(&mut self, key: &K) -> Option<Cell> {
        self.record(key_hash(key));
        if let Some(cell) = self.window.get(key) {
            return Some(Arc::clone(cell));
        }
        self.main.get(key)
    }

    fn peek(&self, key: &K) -> Option<&Cell> {
        self.window.peek(key).or_else(|| self.main.peek(key))
    }

    fn insert(&mut self, key: K, cell: Cell) {
        self.window.put(key, cell);
        if self.window.len() <= self.window_cap {
            return;
        }
        let (candidate, candidate_cell) = match self.window.pop_lru() {
            Some(evicted) => evicted,
            None => return,
        };
        if self.main.cap() == 0 {
            return;
        }
        let admit = match self.main.victim() {
            None => true,
            Some(victim) => self.estimate(key_hash(&candidate)) > self.estimate(key_hash(victim)),
        };
        if admit {
            self.main.add(candidate, candidate_cell);
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        self.window.pop(key).is_some() || self.main.remove(key).is_some()
    }

    fn contains(&self, key: &K) -> bool {
        self.window.contains(key) || self.main.contains(key)
    }

    fn keys(&self) -> Vec<K> {
        self.window
            .iter()
            .map(|(k, _)| k)
            .chain(self.main.keys())
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.window.len() + self.main.len()
    }

    fn purge(&mut self) {
        self.window.clear();
        self.main.clear();
        self.sketch.clear();
        self.doorkeeper.reset();
        self.accesses = 0;
    }
}

/// TinyLfuCounter caches the hotspot parameter with the W-TinyLFU policy.
pub struct TinyLfuCounter<K = ParamKey>
where
    K: Send + Sync + Hash + Eq + fmt::Debug + Clone + 'static,
{
    cap: usize,
    cache: Mutex<TinyLfu<K>>,
}

impl<K> TinyLfuCounter<K>
where
    K: Send + Sync + Hash + Eq + fmt::Debug + Clone,
{
    pub fn with_capacity(cap: usize) -> Self {
        TinyLfuCounter {
            cap,
            cache: Mutex::new(TinyLfu::with_capacity(cap)),
        }
    }

    /// `estimate` returns the estimated access frequency of the key.
    pub fn estimate(&self, key: &K) -> u64 {
        self.cache.lock().unwrap().estimate(key_hash(key))
    }
}

impl<K> CounterTrait<K> for TinyLfuCounter<K>
where
    K: Send + Sync + Hash + Eq + fmt::Debug + Clone,
{
    fn cap(&self) -> usize {
        self.cap
    }

    // `add` stores the value into the existing counter without counting an access,
    // otherwise it counts the access and inserts the key.
    fn add(&self, key: K, value: i64) {
        if self.cap == 0 {
            return;
        }
        let mut cache = self.cache.lock().unwrap();
        if let Some(cell) = cache.peek(&key) {
            cell.store(value, Ordering::SeqCst);
            return;
        }
        cache.record(key_hash(&key));
        cache.insert(key, Arc::new(AtomicI64::new(value)));
    }

    // The lookup counts as an access of the key, thus a key checked again and again
    // gains the frequency needed to enter the main space.
    fn add_if_absent(&self, key: K, value: i64) -> Option<Arc<AtomicI64>> {
        if self.cap == 0 {
            return None;
        }
        let mut cache = self.cache.lock().unwrap();
        if let Some(prior) = cache.get(&key) {
            return Some(prior);
        }
        cache.insert(key, Arc::new(AtomicI64::new(value)));
        None
    }

    fn get(&self, key: &K) -> Option<Arc<AtomicI64>> {
        if self.cap == 0 {
            return None;
        }
        self.cache.lock().unwrap().get(key)
    }

    fn remove(&self, key: &K) -> bool {
        self.cache.lock().unwrap().remove(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.cache.lock().unwrap().contains(key)
    }

    // the keys are unordered
    fn keys(&self) -> Vec<K> {
        self.cache.lock().unwrap().keys()
    }

    fn len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    fn purge(&self) {
        self.cache.lock().unwrap().purge()
    }
}

impl<K> Default for TinyLfuCounter<K>
where
    K: Send + Sync + Hash + Eq + fmt::Debug + Clone,
{
    fn default() -> Self {
        TinyLfuCounter::with_capacity(0)
    }
}

impl<K> fmt::Debug for TinyLfuCounter<K>
where
    K: Send + Sync + Hash + Eq + fmt::Debug + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TinyLfuCounter")
            .field("cap", &self.cap)
            .field("len", &self.len())
            .finish()
    }
}
