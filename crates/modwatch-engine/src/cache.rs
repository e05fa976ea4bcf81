//! Bounded verdict cache
//!
//! Advisory only: a miss or eviction costs a recompute, never correctness.

use lru::LruCache;
use modwatch_core::{ContentHash, ModerationResult};
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// LRU cache of verdicts keyed by content hash.
///
/// All access is serialized through one mutex around the ordered
/// structure; entries are owned exclusively by the cache and cloned out.
pub struct VerdictCache {
    inner: Mutex<LruCache<ContentHash, ModerationResult>>,
}

impl VerdictCache {
    /// Create a cache with the given capacity (entries)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is non-zero");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up a verdict; a hit promotes the entry to most-recently-used
    /// and comes back marked `cached`.
    pub fn get(&self, key: &ContentHash) -> Option<ModerationResult> {
        let mut inner = self.inner.lock();
        inner.get(key).map(|hit| {
            let mut hit = hit.clone();
            hit.cached = true;
            hit
        })
    }

    /// Insert a verdict; at capacity the least-recently-used entry is
    /// evicted first.
    pub fn put(&self, key: ContentHash, value: ModerationResult) {
        self.inner.lock().put(key, value);
    }

    /// Whether a key is present, without promoting it
    pub fn contains(&self, key: &ContentHash) -> bool {
        self.inner.lock().peek(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(n: u8) -> ContentHash {
        ContentHash::of(&[n])
    }

    #[test]
    fn hits_are_marked_cached() {
        let cache = VerdictCache::new(4);
        cache.put(hash(1), ModerationResult::clean());

        let hit = cache.get(&hash(1)).unwrap();
        assert!(hit.cached);
        assert!(cache.get(&hash(2)).is_none());
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let cache = VerdictCache::new(3);
        for n in 0..10 {
            cache.put(hash(n), ModerationResult::clean());
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn insert_at_capacity_evicts_exactly_the_lru_entry() {
        let cache = VerdictCache::new(3);
        cache.put(hash(1), ModerationResult::clean());
        cache.put(hash(2), ModerationResult::clean());
        cache.put(hash(3), ModerationResult::clean());

        // Touch 1 so 2 becomes least-recently-used
        cache.get(&hash(1));
        cache.put(hash(4), ModerationResult::clean());

        assert!(cache.contains(&hash(1)));
        assert!(!cache.contains(&hash(2)));
        assert!(cache.contains(&hash(3)));
        assert!(cache.contains(&hash(4)));
    }
}
