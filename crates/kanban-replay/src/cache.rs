use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Bounded map that evicts the least recently used entry when full.
///
/// Every use stamps the entry with a fresh tick; `order` maps ticks back to
/// keys so the oldest entry is its first key. Lookups and inserts cost
/// O(log n).
///
/// A capacity of zero disables caching: `put` stores nothing.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    tick: u64,
    entries: HashMap<K, (V, u64)>,
    order: BTreeMap<u64, K>,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tick: 0,
            entries: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
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

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up an entry and mark it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let (value, stamp) = self.entries.get_mut(key)?;
        self.tick += 1;
        if let Some(k) = self.order.remove(&*stamp) {
            self.order.insert(self.tick, k);
        }
        *stamp = self.tick;
        Some(&*value)
    }

    /// Insert or replace an entry. Returns the entry evicted to make room.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.capacity == 0 {
            return None;
        }
        self.tick += 1;
        if let Some((_, previous)) = self.entries.insert(key.clone(), (value, self.tick)) {
            self.order.remove(&previous);
            self.order.insert(self.tick, key);
            return None;
        }
        self.order.insert(self.tick, key);

        if self.entries.len() > self.capacity {
            let (_, oldest) = self.order.pop_first()?;
            let (value, _) = self.entries.remove(&oldest)?;
            return Some((oldest, value));
        }
        None
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (value, stamp) = self.entries.remove(key)?;
        self.order.remove(&stamp);
        Some(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.get(&"a"), Some(&1));

        let evicted = cache.put("c", 3);

        assert_eq!(evicted, Some(("b", 2)));
        assert!(cache.contains(&"a"));
        assert!(cache.contains(&"c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_replace_does_not_evict() {
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);

        assert_eq!(cache.put("a", 10), None);
        assert_eq!(cache.get(&"a"), Some(&10));

        // "b" is now the oldest.
        assert_eq!(cache.put("c", 3), Some(("b", 2)));
    }

    #[test]
    fn test_recency_tracks_every_lookup() {
        let mut cache = LruCache::new(3);
        for key in ["a", "b", "c"] {
            cache.put(key, ());
        }
        cache.get(&"a");
        cache.get(&"b");
        cache.get(&"a");

        assert_eq!(cache.put("d", ()).map(|(k, _)| k), Some("c"));
        assert_eq!(cache.put("e", ()).map(|(k, _)| k), Some("b"));
        assert_eq!(cache.put("f", ()).map(|(k, _)| k), Some("a"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_remove_and_zero_capacity() {
        let mut cache = LruCache::new(1);
        cache.put("a", 1);
        assert_eq!(cache.remove(&"a"), Some(1));
        assert!(cache.is_empty());
        assert_eq!(cache.remove(&"a"), None);

        let mut disabled = LruCache::new(0);
        assert_eq!(disabled.put("a", 1), None);
        assert!(disabled.get(&"a").is_none());
    }
}
