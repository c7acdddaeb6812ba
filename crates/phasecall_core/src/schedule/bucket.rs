//! # Priority Bucket
//!
//! All callbacks sharing one order value within one list. Slots keep
//! registration order; a `None` slot is a tombstone left by a removal that
//! happened while the list was being dispatched.

use crate::memory::BucketId;
use crate::schedule::receiver::{ReceiverId, Subscriber};

/// One node of an ordered bucket list.
#[derive(Debug)]
pub struct Bucket {
    pub(crate) priority: i32,
    pub(crate) slots: Vec<Option<Subscriber>>,
    pub(crate) next: Option<BucketId>,
}

impl Bucket {
    pub(crate) fn new(priority: i32, subscriber: Subscriber, next: Option<BucketId>) -> Self {
        Self {
            priority,
            slots: vec![Some(subscriber)],
            next,
        }
    }

    /// Refills a recycled bucket in place, keeping its slot buffer.
    pub(crate) fn populate(
        &mut self,
        priority: i32,
        subscriber: Subscriber,
        next: Option<BucketId>,
    ) {
        self.priority = priority;
        self.slots.clear();
        self.slots.push(Some(subscriber));
        self.next = next;
    }

    /// Empties the bucket for pooling. The slot buffer is kept.
    pub(crate) fn reset(&mut self) {
        self.slots.clear();
        self.next = None;
    }

    /// Empties the bucket and releases its slot buffer.
    pub(crate) fn release(&mut self) {
        self.slots = Vec::new();
        self.next = None;
    }

    /// Order value shared by every callback in this bucket.
    #[inline]
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Next bucket in ascending order.
    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<BucketId> {
        self.next
    }

    /// Number of physical slots, tombstones included.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of registrations that would fire on the next pass.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.as_ref().is_some_and(Subscriber::is_live))
            .count()
    }

    /// True when nothing in the bucket can fire any more.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        !self
            .slots
            .iter()
            .any(|slot| slot.as_ref().is_some_and(Subscriber::is_live))
    }

    /// Live registrations in registration order.
    pub fn subscribers(&self) -> impl Iterator<Item = &Subscriber> {
        self.slots.iter().flatten().filter(|s| s.is_live())
    }

    pub(crate) fn push(&mut self, subscriber: Subscriber) {
        self.slots.push(Some(subscriber));
    }

    /// Index of the first live slot registered under `id`. Tombstones and
    /// dead weak registrations never match.
    pub(crate) fn position_of(&self, id: ReceiverId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| s.is_live() && s.id() == id))
    }

    /// Removes the slot and shifts the rest down.
    pub(crate) fn remove_at(&mut self, index: usize) {
        self.slots.remove(index);
    }

    /// Clears the slot without moving any other slot.
    pub(crate) fn tombstone_at(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
        }
    }

    /// Drops tombstones and dead weak registrations. Order is preserved.
    pub(crate) fn compact(&mut self) {
        self.slots
            .retain(|slot| slot.as_ref().is_some_and(Subscriber::is_live));
    }
}
