//! Fixed-capacity memo table with oldest-first eviction.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// A map that holds at most `capacity` entries.
///
/// Once an insert pushes the size past capacity, the entry inserted earliest
/// is dropped. Reads do not refresh an entry's age.
///
/// ```
/// use bizstruct_core::calculations::BoundedCache;
///
/// let mut cache = BoundedCache::new(2);
/// cache.insert("a", 1);
/// cache.insert("b", 2);
/// cache.insert("c", 3);
///
/// assert_eq!(cache.get(&"a"), None);
/// assert_eq!(cache.get(&"c"), Some(&3));
/// ```
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity.saturating_add(1)),
            order: VecDeque::with_capacity(capacity.saturating_add(1)),
        }
    }

    pub fn get(
        &self,
        key: &K,
    ) -> Option<&V> {
        self.entries.get(key)
    }

    /// Stores `value`, replacing any previous value for `key` without
    /// changing its position in the eviction order.
    pub fn insert(
        &mut self,
        key: K,
        value: V,
    ) {
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }

        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn keeps_entries_up_to_capacity() {
        let mut cache = BoundedCache::new(3);
        for i in 0..3 {
            cache.insert(i, i * 10);
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&0), Some(&0));
        assert_eq!(cache.get(&2), Some(&20));
    }

    #[test]
    fn evicts_oldest_when_over_capacity() {
        let mut cache = BoundedCache::new(50);
        for i in 0..51 {
            cache.insert(i, i);
        }

        assert_eq!(cache.len(), 50);
        assert_eq!(cache.get(&0), None);
        assert_eq!(cache.get(&1), Some(&1));
        assert_eq!(cache.get(&50), Some(&50));
    }

    #[test]
    fn reads_do_not_refresh_age() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.get(&"a"), Some(&1));

        cache.insert("c", 3);

        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&2));
    }

    #[test]
    fn overwriting_keeps_a_single_entry() {
        let mut cache = BoundedCache::new(2);
        cache.insert("a", 1);
        cache.insert("a", 2);
        cache.insert("b", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), Some(&2));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut cache = BoundedCache::new(0);
        cache.insert("a", 1);

        assert!(cache.is_empty());
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = BoundedCache::new(4);
        cache.insert(1, 1);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 4);
    }
}
