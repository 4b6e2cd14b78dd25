//! Bounded caches of the hot parameter statistics.
//!
//! A cache hands out shared counter cells. Inserting, evicting and promoting a key take the
//! cache's own lock, while the returned cell is later updated by atomic operations only.

pub mod lru;
pub mod tinylfu;

pub use self::lru::*;
pub use self::tinylfu::*;

use crate::{base::ParamKey, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::{atomic::AtomicI64, Arc};

/// CounterTrait is the contract of the bounded key to counter caches.
pub trait CounterTrait<K = ParamKey>: Send + Sync + fmt::Debug {
    fn cap(&self) -> usize;
    /// `add` upserts the value of the key, it may evict other keys.
    fn add(&self, key: K, value: i64);
    /// If the key is not existed in the cache, adds a value to the cache then return None.
    /// If the key is already existed in the cache, do nothing and return the prior counter cell.
    fn add_if_absent(&self, key: K, value: i64) -> Option<Arc<AtomicI64>>;
    fn get(&self, key: &K) -> Option<Arc<AtomicI64>>;
    /// Return true if the key was contained.
    fn remove(&self, key: &K) -> bool;
    fn contains(&self, key: &K) -> bool;
    fn keys(&self) -> Vec<K>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// `purge` clears all the entries and the access history.
    fn purge(&self);
}

/// CachePolicy chooses the eviction and admission policy of the hotspot caches.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CachePolicy {
    /// plain least-recently-used eviction
    Lru,
    /// window TinyLFU, admission by estimated access frequency
    TinyLfu,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::TinyLfu
    }
}

impl FromStr for CachePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(CachePolicy::Lru),
            "tinylfu" | "tiny_lfu" | "w-tinylfu" => Ok(CachePolicy::TinyLfu),
            _ => Err(Error::msg(format!("unknown cache policy {:?}", s))),
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// `new_counter` builds a cache of the given policy holding at most `cap` keys.
pub fn new_counter<K>(policy: CachePolicy, cap: usize) -> Box<dyn CounterTrait<K>>
where
    K: Send + Sync + Hash + Eq + Clone + fmt::Debug + 'static,
{
    match policy {
        CachePolicy::Lru => Box::new(Counter::with_capacity(cap)),
        CachePolicy::TinyLfu => Box::new(TinyLfuCounter::with_capacity(cap)),
    }
}

#[cfg(test)]
pub(crate) use test::MockCounter;
