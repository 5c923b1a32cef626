use crate::clip_stack::MaskKey;
use ahash::RandomState;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Least-recently-used storage for rendered clip masks, keyed by [`MaskKey`].
///
/// The clip stack never renders anything itself; it only tells the owner of this cache which
/// keys went stale through [`ClipStack::take_invalidated_masks`](crate::ClipStack::take_invalidated_masks).
pub struct MaskCache<T> {
    masks: LruCache<MaskKey, T, RandomState>,
}

impl<T> MaskCache<T> {
    pub fn new(size: NonZeroUsize) -> Self {
        Self {
            masks: LruCache::with_hasher(size, RandomState::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn get(&mut self, key: &MaskKey) -> Option<&T> {
        self.masks.get(key)
    }

    /// Stores a mask, returning the least recently used one if the cache was full.
    pub fn insert(&mut self, key: MaskKey, mask: T) -> Option<(MaskKey, T)> {
        self.masks.push(key, mask).filter(|(evicted, _)| *evicted != key)
    }

    /// Drops every cached mask for the given keys and returns how many were present.
    pub fn invalidate<'a>(&mut self, keys: impl IntoIterator<Item = &'a MaskKey>) -> usize {
        keys.into_iter()
            .filter(|key| self.masks.pop(*key).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::irect;

    fn key(gen_id: u32) -> MaskKey {
        MaskKey::new(gen_id, irect(0, 0, 10, 10))
    }

    #[test]
    fn least_recently_used_mask_is_evicted() {
        let mut cache = MaskCache::new(NonZeroUsize::new(2).unwrap());
        assert!(cache.insert(key(3), "a").is_none());
        assert!(cache.insert(key(4), "b").is_none());
        assert_eq!(cache.get(&key(3)), Some(&"a"));

        let evicted = cache.insert(key(5), "c");
        assert_eq!(evicted, Some((key(4), "b")));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn replacing_a_mask_is_not_an_eviction() {
        let mut cache = MaskCache::new(NonZeroUsize::new(2).unwrap());
        cache.insert(key(3), 1);
        assert!(cache.insert(key(3), 2).is_none());
        assert_eq!(cache.get(&key(3)), Some(&2));
    }

    #[test]
    fn invalidate_counts_present_masks() {
        let mut cache = MaskCache::new(NonZeroUsize::new(4).unwrap());
        cache.insert(key(3), ());
        cache.insert(key(4), ());
        assert_eq!(cache.invalidate(&[key(3), key(9)]), 1);
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
    }
}
