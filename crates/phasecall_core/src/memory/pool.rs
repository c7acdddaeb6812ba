//! # Bucket Node Pool
//!
//! Index-addressed arena of buckets shared by every phase list, with a small
//! bounded stack of retired buckets kept ready for reuse.

use crate::schedule::{Bucket, Subscriber};

/// Handle to a bucket slot in a [`NodePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BucketId(usize);

impl BucketId {
    /// Index into the arena.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Allocation counters for a [`NodePool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buckets built with fresh slot storage.
    pub allocated: u64,
    /// Fetches satisfied from the recycled stack.
    pub reused: u64,
    /// Retired buckets dropped because the recycled stack was full.
    pub discarded: u64,
}

/// Arena of buckets plus a bounded free list.
///
/// Retiring a bucket pushes it onto the recycled stack if there is room;
/// otherwise its slot storage is released and only the arena index is kept
/// for later. Overflow is never an error.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. It belongs to one scheduler on one thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool = NodePool::new(8);
/// let id = pool.fetch(10, subscriber, None);   // allocates
/// pool.retire(id);                             // pooled
/// let again = pool.fetch(20, other, None);     // reused in place
/// ```
#[derive(Debug)]
pub struct NodePool {
    /// Every bucket ever built, linked or not.
    nodes: Vec<Bucket>,
    /// Retired buckets whose slot storage is kept.
    recycled: Vec<BucketId>,
    /// Arena indices whose slot storage was released.
    vacant: Vec<BucketId>,
    /// Maximum length of `recycled`.
    capacity: usize,
    stats: PoolStats,
}

impl NodePool {
    /// Creates an empty pool holding at most `capacity` retired buckets.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::new(),
            recycled: Vec::with_capacity(capacity),
            vacant: Vec::new(),
            capacity,
            stats: PoolStats::default(),
        }
    }

    /// Maximum number of retired buckets kept for reuse.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retired buckets currently waiting for reuse.
    #[inline]
    #[must_use]
    pub fn pooled_count(&self) -> usize {
        self.recycled.len()
    }

    /// Number of buckets currently linked into some list.
    #[inline]
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.nodes.len() - self.recycled.len() - self.vacant.len()
    }

    /// Allocation counters since creation.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Returns a bucket holding `subscriber` at `priority`, linked to `next`.
    ///
    /// Pops the recycled stack first; only builds fresh storage when it is
    /// empty.
    pub fn fetch(
        &mut self,
        priority: i32,
        subscriber: Subscriber,
        next: Option<BucketId>,
    ) -> BucketId {
        if let Some(id) = self.recycled.pop() {
            self.nodes[id.0].populate(priority, subscriber, next);
            self.stats.reused += 1;
            tracing::trace!(bucket = id.0, priority, "reused pooled bucket");
            return id;
        }

        self.stats.allocated += 1;
        let bucket = Bucket::new(priority, subscriber, next);
        if let Some(id) = self.vacant.pop() {
            self.nodes[id.0] = bucket;
            tracing::trace!(bucket = id.0, priority, "allocated bucket in vacant slot");
            return id;
        }

        let id = BucketId(self.nodes.len());
        self.nodes.push(bucket);
        tracing::trace!(bucket = id.0, priority, "allocated bucket");
        id
    }

    /// Returns an unlinked bucket to the pool.
    ///
    /// The caller must already have spliced it out of its list.
    pub fn retire(&mut self, id: BucketId) {
        if self.recycled.len() < self.capacity {
            self.nodes[id.0].reset();
            self.recycled.push(id);
        } else {
            self.nodes[id.0].release();
            self.vacant.push(id);
            self.stats.discarded += 1;
            tracing::trace!(bucket = id.0, "pool full, discarded bucket storage");
        }
    }

    /// Gets a bucket by handle.
    #[inline]
    #[must_use]
    pub fn get(&self, id: BucketId) -> &Bucket {
        &self.nodes[id.0]
    }

    /// Gets a mutable bucket by handle.
    #[inline]
    pub(crate) fn get_mut(&mut self, id: BucketId) -> &mut Bucket {
        &mut self.nodes[id.0]
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_POOL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Receiver;

    fn subscriber() -> Subscriber {
        Subscriber::from(Receiver::new(|| {}))
    }

    #[test]
    fn test_fetch_retire_reuse() {
        let mut pool = NodePool::new(8);

        let first = pool.fetch(1, subscriber(), None);
        assert_eq!(pool.stats().allocated, 1);
        assert_eq!(pool.in_use(), 1);

        pool.retire(first);
        assert_eq!(pool.pooled_count(), 1);
        assert_eq!(pool.in_use(), 0);

        let second = pool.fetch(2, subscriber(), None);
        assert_eq!(first, second); // Same slot reused
        assert_eq!(pool.get(second).priority(), 2);
        assert_eq!(pool.stats().allocated, 1);
        assert_eq!(pool.stats().reused, 1);
    }

    #[test]
    fn test_overflow_discards() {
        let mut pool = NodePool::new(2);
        let ids: Vec<_> = (0..4).map(|p| pool.fetch(p, subscriber(), None)).collect();

        for id in &ids {
            pool.retire(*id);
        }
        assert_eq!(pool.pooled_count(), 2);
        assert_eq!(pool.stats().discarded, 2);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_vacant_slots_do_not_grow_arena() {
        let mut pool = NodePool::new(0);
        for cycle in 0..100 {
            let id = pool.fetch(cycle, subscriber(), None);
            pool.retire(id);
        }
        assert_eq!(pool.nodes.len(), 1);
        assert_eq!(pool.stats().allocated, 100);
        assert_eq!(pool.stats().discarded, 100);
    }

    #[test]
    fn test_retired_bucket_is_unlinked() {
        let mut pool = NodePool::new(4);
        let tail = pool.fetch(2, subscriber(), None);
        let head = pool.fetch(1, subscriber(), Some(tail));
        assert_eq!(pool.get(head).next(), Some(tail));

        pool.retire(head);
        let again = pool.fetch(3, subscriber(), None);
        assert_eq!(again, head);
        assert_eq!(pool.get(again).next(), None);
    }
}
