//! # Dispatch Loop
//!
//! One pass over one list: buckets head to tail, slots inside a bucket from
//! the last registered to the first.
//!
//! The registry borrow is dropped around every callback so the callback can
//! subscribe and unsubscribe freely. Removals made meanwhile only tombstone
//! slots (see [`OrderedBucketList::remove`]); the backward cursor is then the
//! only thing that ever shifts slots, and it only shifts slots at or above
//! its own position, which it has already passed.

use std::cell::RefCell;

use crate::memory::{BucketId, NodePool};
use crate::schedule::list::OrderedBucketList;
use crate::schedule::phase::HookPoint;
use crate::schedule::receiver::{Receiver, Subscriber};

/// Gives the dispatch loop mutable access to one list and the shared pool.
pub(crate) trait ListAccess {
    fn split(&mut self, point: HookPoint) -> (&mut OrderedBucketList, &mut NodePool);
}

/// Result of one dispatch pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct DispatchOutcome {
    /// Callbacks invoked.
    pub invoked: usize,
    /// The list had buckets when the pass started and none once deferred
    /// removals ran.
    pub emptied: bool,
}

/// Runs every live callback of the list at `point`.
pub(crate) fn run<S: ListAccess>(state: &RefCell<S>, point: HookPoint) -> DispatchOutcome {
    let head = {
        let mut guard = state.borrow_mut();
        let (list, _) = guard.split(point);
        if !list.begin_dispatch() {
            tracing::warn!(%point, "list is already dispatching, nested pass ignored");
            return DispatchOutcome::default();
        }
        list.head()
    };

    let mut cursor = head;
    let mut invoked = 0;
    while let Some(bucket) = cursor {
        let mut index = state.borrow_mut().split(point).1.get(bucket).slot_count();
        while index > 0 {
            index -= 1;
            if let Some(receiver) = take_live(state, point, bucket, index) {
                receiver.call();
                invoked += 1;
            }
        }
        cursor = state.borrow_mut().split(point).1.get(bucket).next();
    }

    let mut guard = state.borrow_mut();
    let (list, pool) = guard.split(point);
    list.end_dispatch(pool);

    DispatchOutcome {
        invoked,
        emptied: head.is_some() && list.is_empty(),
    }
}

/// Resolves the slot at `index`, dropping it if it can no longer fire.
fn take_live<S: ListAccess>(
    state: &RefCell<S>,
    point: HookPoint,
    bucket: BucketId,
    index: usize,
) -> Option<Receiver> {
    let mut guard = state.borrow_mut();
    let bucket = guard.split(point).1.get_mut(bucket);
    if index >= bucket.slot_count() {
        return None;
    }

    let receiver = bucket.slots[index].as_ref().and_then(Subscriber::resolve);
    if receiver.is_none() {
        bucket.remove_at(index);
    }
    receiver
}
