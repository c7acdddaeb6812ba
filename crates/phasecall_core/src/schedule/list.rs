//! # Ordered Bucket List
//!
//! Singly-linked chain of buckets in strictly ascending priority, threaded
//! through a shared [`NodePool`] by [`BucketId`].
//!
//! ```text
//! head ──> [ -30 | a ] ──> [ -10 | b, c ] ──> [ -1 | d ] ──> None
//! ```
//!
//! ## Removal during dispatch
//!
//! While a list is being dispatched its chain must not change shape under
//! the traversal, and slots must not shift in front of the backward cursor.
//! Removals therefore only tombstone the slot and flag a deferred prune;
//! the splicing and recycling runs when the pass ends.

use std::iter;

use crate::memory::{BucketId, NodePool};
use crate::schedule::bucket::Bucket;
use crate::schedule::receiver::{ReceiverId, Subscriber};

/// Head of one phase list plus its dispatch bookkeeping.
#[derive(Debug, Default)]
pub struct OrderedBucketList {
    head: Option<BucketId>,
    dispatching: bool,
    pending_prune: bool,
}

impl OrderedBucketList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            head: None,
            dispatching: false,
            pending_prune: false,
        }
    }

    /// First (lowest priority) bucket.
    #[inline]
    #[must_use]
    pub const fn head(&self) -> Option<BucketId> {
        self.head
    }

    /// True when the list holds no buckets at all.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// True while a dispatch pass over this list is in progress.
    #[inline]
    #[must_use]
    pub const fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    /// Walks the chain head to tail.
    pub fn buckets<'a>(
        &self,
        pool: &'a NodePool,
    ) -> impl Iterator<Item = (BucketId, &'a Bucket)> + 'a {
        iter::successors(self.head.map(|id| (id, pool.get(id))), move |(_, bucket)| {
            bucket.next().map(|id| (id, pool.get(id)))
        })
    }

    /// Priorities of every bucket, in chain order.
    #[must_use]
    pub fn priorities(&self, pool: &NodePool) -> Vec<i32> {
        self.buckets(pool).map(|(_, bucket)| bucket.priority()).collect()
    }

    /// Number of live registrations across all buckets.
    #[must_use]
    pub fn live_count(&self, pool: &NodePool) -> usize {
        self.buckets(pool).map(|(_, bucket)| bucket.live_count()).sum()
    }

    /// Registers `subscriber` at `priority`.
    ///
    /// Equal priorities share a bucket, stored in registration order (dispatch
    /// walks them back to front).
    /// Returns true if the list was empty before the call.
    pub fn insert(&mut self, pool: &mut NodePool, priority: i32, subscriber: Subscriber) -> bool {
        let Some(head) = self.head else {
            self.head = Some(pool.fetch(priority, subscriber, None));
            return true;
        };

        let head_priority = pool.get(head).priority();
        if head_priority == priority {
            pool.get_mut(head).push(subscriber);
            return false;
        }
        if head_priority > priority {
            self.head = Some(pool.fetch(priority, subscriber, Some(head)));
            return false;
        }

        // Last bucket with priority <= the requested one.
        let mut current = head;
        while let Some(next) = pool.get(current).next() {
            if pool.get(next).priority() > priority {
                break;
            }
            current = next;
        }

        if pool.get(current).priority() == priority {
            pool.get_mut(current).push(subscriber);
        } else {
            let next = pool.get(current).next();
            let fresh = pool.fetch(priority, subscriber, next);
            pool.get_mut(current).next = Some(fresh);
        }
        false
    }

    /// Removes one registration of `id` at `priority`.
    ///
    /// Unknown pairs are ignored. Returns whether an occurrence was removed.
    pub fn remove(&mut self, pool: &mut NodePool, priority: i32, id: ReceiverId) -> bool {
        let Some((previous, current)) = self.find(pool, priority) else {
            return false;
        };

        let bucket = pool.get_mut(current);
        let removed = match bucket.position_of(id) {
            Some(index) if self.dispatching => {
                bucket.tombstone_at(index);
                self.pending_prune = true;
                true
            }
            Some(index) => {
                bucket.remove_at(index);
                true
            }
            None => false,
        };

        if bucket.is_drained() {
            if self.dispatching {
                self.pending_prune = true;
            } else {
                self.unlink(pool, previous, current);
            }
        }
        removed
    }

    /// Drops every registration.
    ///
    /// During dispatch everything is tombstoned and released when the pass
    /// ends.
    pub fn clear(&mut self, pool: &mut NodePool) {
        if self.dispatching {
            let mut cursor = self.head;
            while let Some(current) = cursor {
                let bucket = pool.get_mut(current);
                for index in 0..bucket.slot_count() {
                    bucket.tombstone_at(index);
                }
                cursor = bucket.next();
            }
            self.pending_prune = true;
            return;
        }

        while let Some(current) = self.head {
            self.head = pool.get(current).next();
            pool.retire(current);
        }
    }

    /// Marks the start of a dispatch pass. Returns false if one is already
    /// running over this list.
    pub(crate) fn begin_dispatch(&mut self) -> bool {
        if self.dispatching {
            return false;
        }
        self.dispatching = true;
        true
    }

    /// Finishes a dispatch pass and runs any deferred prune.
    pub(crate) fn end_dispatch(&mut self, pool: &mut NodePool) {
        self.dispatching = false;
        if self.pending_prune {
            self.prune(pool);
        }
    }

    /// Compacts every bucket and splices out the ones left empty.
    fn prune(&mut self, pool: &mut NodePool) {
        self.pending_prune = false;

        let mut previous = None;
        let mut cursor = self.head;
        while let Some(current) = cursor {
            let bucket = pool.get_mut(current);
            bucket.compact();
            cursor = bucket.next();
            let empty = bucket.slot_count() == 0;

            if empty {
                self.unlink(pool, previous, current);
            } else {
                previous = Some(current);
            }
        }
    }

    /// Locates the bucket at `priority` and its predecessor.
    fn find(&self, pool: &NodePool, priority: i32) -> Option<(Option<BucketId>, BucketId)> {
        let mut previous = None;
        let mut current = self.head?;

        loop {
            let bucket = pool.get(current);
            if bucket.priority() >= priority {
                break;
            }
            previous = Some(current);
            current = bucket.next()?;
        }

        (pool.get(current).priority() == priority).then_some((previous, current))
    }

    fn unlink(&mut self, pool: &mut NodePool, previous: Option<BucketId>, current: BucketId) {
        let next = pool.get(current).next();
        match previous {
            Some(previous) => pool.get_mut(previous).next = next,
            None => self.head = next,
        }
        pool.retire(current);
    }
}
