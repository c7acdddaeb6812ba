//! # Driver Hooks
//!
//! The host frame loop exposes one hook slot per [`HookPoint`]. The scheduler
//! puts a dispatch function into a slot when that list gains its first
//! receiver and clears the slot when the list empties again.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::schedule::phase::HookPoint;

/// A zero-argument function the driver calls at a hook point.
pub type Hook = Rc<dyn Fn()>;

/// Host side of the hook contract.
///
/// Implementations must fire every installed hook exactly once per frame
/// (once per fixed tick for the fixed-update phase), in a fixed order, on
/// the thread that owns the scheduler.
pub trait FrameDriver {
    /// Installs (`Some`) or clears (`None`) the hook at `point`.
    fn set_hook(&self, point: HookPoint, hook: Option<Hook>);
}

/// Standard hook storage: one optional hook per point.
#[derive(Default)]
pub struct HookTable {
    hooks: [RefCell<Option<Hook>>; HookPoint::COUNT],
}

impl HookTable {
    /// Creates a table with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls the hook at `point`, if any. Returns whether one was called.
    ///
    /// The hook is cloned out first, so it may clear or replace its own slot
    /// while running.
    pub fn fire(&self, point: HookPoint) -> bool {
        let hook = self.hooks[point.index()].borrow().clone();
        match hook {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }

    /// Returns true if a hook is installed at `point`.
    #[must_use]
    pub fn is_set(&self, point: HookPoint) -> bool {
        self.hooks[point.index()].borrow().is_some()
    }

    /// Number of installed hooks.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.hooks.iter().filter(|slot| slot.borrow().is_some()).count()
    }
}

impl FrameDriver for HookTable {
    fn set_hook(&self, point: HookPoint, hook: Option<Hook>) {
        *self.hooks[point.index()].borrow_mut() = hook;
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for point in HookPoint::ALL {
            if self.is_set(point) {
                list.entry(&point);
            }
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::phase::Phase;
    use std::cell::Cell;

    #[test]
    fn test_fire_empty_slot() {
        let table = HookTable::new();
        assert!(!table.fire(HookPoint::post(Phase::Update)));
        assert_eq!(table.active_count(), 0);
    }

    #[test]
    fn test_set_fire_clear() {
        let table = HookTable::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let point = HookPoint::pre(Phase::LateUpdate);

        table.set_hook(point, Some(Rc::new(move || counter.set(counter.get() + 1))));
        assert!(table.is_set(point));
        assert!(table.fire(point));
        assert_eq!(hits.get(), 1);

        table.set_hook(point, None);
        assert!(!table.fire(point));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_hook_may_clear_itself() {
        let table = Rc::new(HookTable::new());
        let point = HookPoint::post(Phase::FixedUpdate);
        let weak = Rc::downgrade(&table);

        table.set_hook(
            point,
            Some(Rc::new(move || {
                if let Some(table) = weak.upgrade() {
                    table.set_hook(point, None);
                }
            })),
        );

        assert!(table.fire(point));
        assert!(!table.is_set(point));
    }
}
