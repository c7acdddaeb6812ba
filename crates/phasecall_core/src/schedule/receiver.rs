//! # Receiver Handles
//!
//! Callbacks are compared by identity, never by value: two clones of one
//! [`Receiver`] are the same subscriber, two receivers built from identical
//! closures are not.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

/// Identity key of a registered callback.
///
/// Handed out from a per-thread counter when a [`Receiver`] is built and
/// never reused on that thread, so an id kept past its receiver's lifetime
/// matches nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiverId(u64);

impl ReceiverId {
    fn next() -> Self {
        NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            Self(id)
        })
    }
}

/// Shared allocation behind every handle of one receiver.
struct Callback<F: ?Sized> {
    id: ReceiverId,
    call: F,
}

/// Strong, cloneable handle to a zero-argument callback.
#[derive(Clone)]
pub struct Receiver {
    callback: Rc<Callback<dyn Fn()>>,
}

impl Receiver {
    /// Wraps a closure into a new receiver with a fresh identity.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self {
            callback: Rc::new(Callback {
                id: ReceiverId::next(),
                call: callback,
            }),
        }
    }

    /// Returns the identity key used for removal.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ReceiverId {
        self.callback.id
    }

    /// Creates a non-owning handle with the same identity.
    #[must_use]
    pub fn downgrade(&self) -> WeakReceiver {
        WeakReceiver {
            callback: Rc::downgrade(&self.callback),
            id: self.id(),
        }
    }

    /// Invokes the callback.
    #[inline]
    pub fn call(&self) {
        (self.callback.call)();
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Receiver").field(&self.id()).finish()
    }
}

/// Non-owning handle to a callback.
///
/// A weak registration stops firing once every strong [`Receiver`] is
/// dropped; the dispatch pass that next reaches it prunes the slot.
#[derive(Clone)]
pub struct WeakReceiver {
    callback: Weak<Callback<dyn Fn()>>,
    id: ReceiverId,
}

impl WeakReceiver {
    /// Returns the identity key used for removal.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ReceiverId {
        self.id
    }

    /// Returns true while at least one strong handle exists.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.callback.strong_count() > 0
    }

    /// Recovers a strong handle if the callback is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Receiver> {
        self.callback.upgrade().map(|callback| Receiver { callback })
    }
}

impl fmt::Debug for WeakReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakReceiver")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// What a bucket slot holds: an owning or a non-owning registration.
#[derive(Clone, Debug)]
pub enum Subscriber {
    /// Keeps the callback alive for as long as it is registered.
    Strong(Receiver),
    /// Fires only while someone else keeps the callback alive.
    Weak(WeakReceiver),
}

impl Subscriber {
    /// Identity of the underlying callback.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ReceiverId {
        match self {
            Self::Strong(receiver) => receiver.id(),
            Self::Weak(receiver) => receiver.id(),
        }
    }

    /// Returns false for a weak registration whose callback is gone.
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        match self {
            Self::Strong(_) => true,
            Self::Weak(receiver) => receiver.is_alive(),
        }
    }

    /// Resolves to something callable, or `None` if the callback is gone.
    pub(crate) fn resolve(&self) -> Option<Receiver> {
        match self {
            Self::Strong(receiver) => Some(receiver.clone()),
            Self::Weak(receiver) => receiver.upgrade(),
        }
    }
}

impl From<Receiver> for Subscriber {
    fn from(receiver: Receiver) -> Self {
        Self::Strong(receiver)
    }
}

impl From<&Receiver> for Subscriber {
    fn from(receiver: &Receiver) -> Self {
        Self::Strong(receiver.clone())
    }
}

impl From<WeakReceiver> for Subscriber {
    fn from(receiver: WeakReceiver) -> Self {
        Self::Weak(receiver)
    }
}

impl From<&WeakReceiver> for Subscriber {
    fn from(receiver: &WeakReceiver) -> Self {
        Self::Weak(receiver.clone())
    }
}

impl From<&Receiver> for ReceiverId {
    fn from(receiver: &Receiver) -> Self {
        receiver.id()
    }
}

impl From<&WeakReceiver> for ReceiverId {
    fn from(receiver: &WeakReceiver) -> Self {
        receiver.id()
    }
}

impl From<&Subscriber> for ReceiverId {
    fn from(subscriber: &Subscriber) -> Self {
        subscriber.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_clones_share_identity() {
        let a = Receiver::new(|| {});
        let b = a.clone();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_identical_closures_differ() {
        let a = Receiver::new(|| {});
        let b = Receiver::new(|| {});
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_call_invokes_closure() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let receiver = Receiver::new(move || counter.set(counter.get() + 1));

        receiver.call();
        receiver.call();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_weak_identity_and_liveness() {
        let strong = Receiver::new(|| {});
        let weak = strong.downgrade();
        assert_eq!(weak.id(), strong.id());
        assert!(weak.is_alive());

        let subscriber = Subscriber::from(&weak);
        assert!(subscriber.is_live());
        assert!(subscriber.resolve().is_some());

        drop(strong);
        assert!(!weak.is_alive());
        assert!(!subscriber.is_live());
        assert!(subscriber.resolve().is_none());
    }

    #[test]
    fn test_upgrade_keeps_identity() {
        let strong = Receiver::new(|| {});
        let upgraded = strong.downgrade().upgrade().unwrap();
        assert_eq!(upgraded.id(), strong.id());
    }

    #[test]
    fn test_ids_never_reused_after_drop() {
        let mut seen = Vec::new();
        for _ in 0..100 {
            let receiver = Receiver::new(|| {});
            assert!(!seen.contains(&receiver.id()));
            seen.push(receiver.id());
            drop(receiver);
        }
    }
}
