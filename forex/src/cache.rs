use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Keyed cache where every entry expires a fixed duration after insertion.
///
/// Safe to share across server workers without an outer lock. Two callers missing on the same key
/// at once will both compute and the later insert wins.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    inner: DashMap<String, (Instant, V)>,
}

impl<V: Clone> TtlCache<V> {
    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.inner.get(key) {
            if entry.0.elapsed() < self.ttl {
                return Some(entry.1.clone());
            }
        }
        //Guard must be dropped before this or DashMap deadlocks on the shard
        self.inner
            .remove_if(key, |_, (inserted, _)| inserted.elapsed() >= self.ttl);
        None
    }

    /// Expired entries under any key are dropped on every insert, so keys that are never read
    /// again do not accumulate.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.inner.retain(|_, (inserted, _)| inserted.elapsed() < self.ttl);
        self.inner.insert(key.into(), (Instant::now(), value));
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: DashMap::new(),
        }
    }
}
