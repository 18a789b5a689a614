//! Reference-counted key set

use std::collections::HashMap;
use std::collections::hash_map;
use std::hash::Hash;

/// A set where each key remembers how many times it was added
///
/// Selection uses it to track children that are implicitly selected through
/// more than one parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefCounter<K: Eq + Hash> {
    counts: HashMap<K, usize>,
}

impl<K: Eq + Hash> Default for RefCounter<K> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> RefCounter<K> {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from explicit counts; zero counts are dropped
    pub fn from_counts(counts: impl IntoIterator<Item = (K, usize)>) -> Self {
        Self {
            counts: counts.into_iter().filter(|(_, c)| *c > 0).collect(),
        }
    }

    /// Increment the count of `key`, returning the new count
    pub fn incr(&mut self, key: K) -> usize {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    /// Decrement the count of `key`, removing it at zero
    ///
    /// Returns the remaining count, or `None` if the key was absent.
    pub fn decr(&mut self, key: &K) -> Option<usize> {
        let count = self.counts.get_mut(key)?;
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            self.counts.remove(key);
        }
        Some(remaining)
    }

    /// Remove `key` regardless of its count
    pub fn delete(&mut self, key: &K) -> bool {
        self.counts.remove(key).is_some()
    }

    /// Current count of `key` (zero if absent)
    pub fn count(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Check if `key` has a non-zero count
    pub fn contains(&self, key: &K) -> bool {
        self.counts.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if no key is counted
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Remove all keys
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Iterate over keys and their counts
    pub fn iter(&self) -> hash_map::Iter<'_, K, usize> {
        self.counts.iter()
    }

    /// Iterate over keys
    pub fn keys(&self) -> hash_map::Keys<'_, K, usize> {
        self.counts.keys()
    }
}
