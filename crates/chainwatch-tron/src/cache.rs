//! A debounced cache: every write resets a 10 s eviction window; if no
//! write arrives before the window elapses, the whole cache is cleared on
//! the next access. This trades an exact per-entry TTL for a cheap,
//! single-timestamp eviction check — adequate for smoothing out repeated
//! lookups within one poll cycle.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEBOUNCE_WINDOW: Duration = Duration::from_secs(10);

struct Inner<K, V> {
    entries: HashMap<K, V>,
    last_write: Instant,
}

pub struct DebouncedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> Default for DebouncedCache<K, V> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner { entries: HashMap::new(), last_write: Instant::now() }),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> DebouncedCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        if inner.last_write.elapsed() >= DEBOUNCE_WINDOW {
            inner.entries.clear();
        }
        inner.entries.get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock().unwrap();
        if inner.last_write.elapsed() >= DEBOUNCE_WINDOW {
            inner.entries.clear();
        }
        inner.entries.insert(key, value);
        inner.last_write = Instant::now();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
