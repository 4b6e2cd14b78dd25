use super::CounterTrait;
use crate::base::ParamKey;
use ::lru::LruCache;
use std::fmt;
use std::hash::Hash;
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc, RwLock,
};

/// Counter caches the hotspot parameter with the least-recently-used eviction.
#[derive(Debug)]
pub struct Counter<K = ParamKey>
where
    K: Send + Sync + Hash + Eq + fmt::Debug + Clone + 'static,
{
    cap: usize,
    cache: RwLock<LruCache<K, Arc<AtomicI64>>>,
}

impl<K> Counter<K>
where
    K: Send + Sync + Hash + Eq + fmt::Debug + Clone,
{
    pub fn with_capacity(cap: usize) -> Counter<K> {
        Counter {
            cap,
            // an empty `LruCache` cannot take any insertion
            cache: RwLock::new(LruCache::new(cap.max(1))),
        }
    }
}

impl<K> CounterTrait<K> for Counter<K>
where
    K: Send + Sync + Hash + Eq + fmt::Debug + Clone,
{
    fn cap(&self) -> usize {
        self.cap
    }

    /// An existing cell is overwritten in place, so the holders of the cell see the new value.
    fn add(&self, key: K, value: i64) {
        if self.cap == 0 {
            return;
        }
        let mut cache = self.cache.write().unwrap();
        match cache.get(&key) {
            Some(counter) => counter.store(value, Ordering::SeqCst),
            None => {
                cache.put(key, Arc::new(AtomicI64::new(value)));
            }
        }
    }

    fn add_if_absent(&self, key: K, value: i64) -> Option<Arc<AtomicI64>> {
        if self.cap == 0 {
            return None;
        }
        let mut cache = self.cache.write().unwrap();
        if let Some(prior) = cache.get(&key) {
            return Some(Arc::clone(prior));
        }
        cache.put(key, Arc::new(AtomicI64::new(value)));
        None
    }

    fn get(&self, key: &K) -> Option<Arc<AtomicI64>> {
        self.cache.write().unwrap().get(key).map(Arc::clone)
    }

    fn remove(&self, key: &K) -> bool {
        self.cache.write().unwrap().pop(key).is_some()
    }

    // peek, the recency is kept
    fn contains(&self, key: &K) -> bool {
        self.cache.read().unwrap().contains(key)
    }

    /// From the least recently used to the most recently used.
    fn keys(&self) -> Vec<K> {
        self.cache
            .read()
            .unwrap()
            .iter()
            .rev()
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.cache.read().unwrap().len()
    }

    fn purge(&self) {
        self.cache.write().unwrap().clear()
    }
}

impl<K> Default for Counter<K>
where
    K: Send + Sync + Hash + Eq + fmt::Debug + Clone,
{
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
