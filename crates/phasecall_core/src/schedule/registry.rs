//! # Phase Registry
//!
//! The scheduler service: six independent lists (pre/post for each phase),
//! one shared bucket pool, and the driver the lists hook themselves onto.
//!
//! ## Lazy activation
//!
//! ```text
//! add (list empty)      ──> insert ──> driver.set_hook(point, Some(dispatch))
//! remove (list empties) ──> unlink ──> driver.set_hook(point, None)
//! ```
//!
//! Lists without receivers cost nothing per frame because the driver has
//! nothing to call for them.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::SchedulerConfig;
use crate::error::SchedulerResult;
use crate::memory::{NodePool, PoolStats};
use crate::schedule::dispatch::{self, ListAccess};
use crate::schedule::hooks::{FrameDriver, Hook};
use crate::schedule::list::OrderedBucketList;
use crate::schedule::phase::{HookPoint, Phase};
use crate::schedule::receiver::{ReceiverId, Subscriber};

/// Order used by the default-priority shorthands.
pub const DEFAULT_ORDER: i32 = 0;

pub(crate) struct RegistryState {
    lists: [OrderedBucketList; HookPoint::COUNT],
    pool: NodePool,
}

impl RegistryState {
    fn new(pool_capacity: usize) -> Self {
        Self {
            lists: Default::default(),
            pool: NodePool::new(pool_capacity),
        }
    }
}

impl ListAccess for RegistryState {
    fn split(&mut self, point: HookPoint) -> (&mut OrderedBucketList, &mut NodePool) {
        (&mut self.lists[point.index()], &mut self.pool)
    }
}

struct Shared {
    state: RefCell<RegistryState>,
    driver: Rc<dyn FrameDriver>,
    config: SchedulerConfig,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for point in HookPoint::ALL {
            if !state.lists[point.index()].is_empty() {
                self.driver.set_hook(point, None);
            }
        }
    }
}

/// Handle to the frame-phase scheduler.
///
/// Cloning is cheap and every clone drives the same registry. A program is
/// expected to build exactly one scheduler per frame-loop thread; see
/// [`global`](crate::schedule::global) for the installed-instance accessor.
///
/// # Thread Safety
///
/// Not `Send`. Subscribe, unsubscribe and dispatch all happen on the thread
/// that runs the frame loop, typically from inside callbacks.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use phasecall_core::{HookPoint, HookTable, Phase, Receiver, Scheduler, SchedulerConfig};
///
/// let hooks = Rc::new(HookTable::new());
/// let scheduler = Scheduler::new(SchedulerConfig::default(), hooks.clone())?;
///
/// let early = Receiver::new(|| println!("before Update"));
/// let late = Receiver::new(|| println!("after Update"));
/// scheduler.add_update_receiver(&early, -100);
/// scheduler.add_update_receiver(&late, 5);
///
/// assert_eq!(scheduler.dispatch(HookPoint::pre(Phase::Update)), 1);
/// assert_eq!(scheduler.dispatch(HookPoint::post(Phase::Update)), 1);
/// # Ok::<(), phasecall_core::SchedulerError>(())
/// ```
#[derive(Clone)]
pub struct Scheduler {
    shared: Rc<Shared>,
}

/// Non-owning scheduler handle, for callbacks that must not keep it alive.
#[derive(Clone)]
pub struct WeakScheduler {
    shared: Weak<Shared>,
}

impl WeakScheduler {
    /// Recovers the scheduler if it still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<Scheduler> {
        self.shared.upgrade().map(|shared| Scheduler { shared })
    }
}

impl Scheduler {
    /// Creates a scheduler with every list empty and no hook installed.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`](crate::SchedulerError::InvalidConfig)
    /// if `config` does not validate. A non-negative `pre_update_order`
    /// is rejected here, since `on_pre_update` must land in the pre list.
    pub fn new(config: SchedulerConfig, driver: Rc<dyn FrameDriver>) -> SchedulerResult<Self> {
        config.validate()?;
        tracing::debug!(
            pool_capacity = config.pool_capacity,
            pre_update_order = config.pre_update_order,
            "scheduler created"
        );
        Ok(Self {
            shared: Rc::new(Shared {
                state: RefCell::new(RegistryState::new(config.pool_capacity)),
                driver,
                config,
            }),
        })
    }

    /// Configuration the scheduler was built with.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Creates a non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakScheduler {
        WeakScheduler {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Returns true if both handles drive the same registry.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Calls `receiver` every time `phase` runs.
    ///
    /// Negative `order` runs before the host's phase body, `order >= 0`
    /// after it. Smaller orders run first. Registering the same receiver
    /// twice makes it fire twice.
    pub fn add_receiver(&self, phase: Phase, receiver: impl Into<Subscriber>, order: i32) {
        let point = HookPoint::for_order(phase, order);
        let activated = {
            let mut state = self.shared.state.borrow_mut();
            let (list, pool) = state.split(point);
            list.insert(pool, order, receiver.into())
        };
        if activated {
            self.activate(point);
        }
    }

    /// Stops calling `receiver` for `phase`.
    ///
    /// `order` must match the one used at registration; anything else is
    /// treated as not registered. Removes one occurrence and returns whether
    /// there was one.
    pub fn remove_receiver(&self, phase: Phase, receiver: impl Into<ReceiverId>, order: i32) -> bool {
        let point = HookPoint::for_order(phase, order);
        let (removed, emptied) = {
            let mut state = self.shared.state.borrow_mut();
            let (list, pool) = state.split(point);
            let was_empty = list.is_empty();
            let removed = list.remove(pool, order, receiver.into());
            (removed, !was_empty && list.is_empty())
        };
        if emptied {
            self.deactivate(point);
        }
        removed
    }

    /// [`add_receiver`](Self::add_receiver) for [`Phase::Update`].
    pub fn add_update_receiver(&self, receiver: impl Into<Subscriber>, order: i32) {
        self.add_receiver(Phase::Update, receiver, order);
    }

    /// [`remove_receiver`](Self::remove_receiver) for [`Phase::Update`].
    pub fn remove_update_receiver(&self, receiver: impl Into<ReceiverId>, order: i32) -> bool {
        self.remove_receiver(Phase::Update, receiver, order)
    }

    /// [`add_receiver`](Self::add_receiver) for [`Phase::FixedUpdate`].
    pub fn add_fixed_update_receiver(&self, receiver: impl Into<Subscriber>, order: i32) {
        self.add_receiver(Phase::FixedUpdate, receiver, order);
    }

    /// [`remove_receiver`](Self::remove_receiver) for [`Phase::FixedUpdate`].
    pub fn remove_fixed_update_receiver(&self, receiver: impl Into<ReceiverId>, order: i32) -> bool {
        self.remove_receiver(Phase::FixedUpdate, receiver, order)
    }

    /// [`add_receiver`](Self::add_receiver) for [`Phase::LateUpdate`].
    pub fn add_late_update_receiver(&self, receiver: impl Into<Subscriber>, order: i32) {
        self.add_receiver(Phase::LateUpdate, receiver, order);
    }

    /// [`remove_receiver`](Self::remove_receiver) for [`Phase::LateUpdate`].
    pub fn remove_late_update_receiver(&self, receiver: impl Into<ReceiverId>, order: i32) -> bool {
        self.remove_receiver(Phase::LateUpdate, receiver, order)
    }

    // =========================================================================
    // SHORTHANDS
    // =========================================================================

    /// Runs `receiver` before the update body, at the configured
    /// `pre_update_order` (-2000 by default).
    pub fn on_pre_update(&self, receiver: impl Into<Subscriber>) {
        self.add_update_receiver(receiver, self.shared.config.pre_update_order);
    }

    /// Undoes [`on_pre_update`](Self::on_pre_update).
    pub fn off_pre_update(&self, receiver: impl Into<ReceiverId>) -> bool {
        self.remove_update_receiver(receiver, self.shared.config.pre_update_order)
    }

    /// Runs `receiver` right after the update body.
    pub fn on_update(&self, receiver: impl Into<Subscriber>) {
        self.add_update_receiver(receiver, DEFAULT_ORDER);
    }

    /// Undoes [`on_update`](Self::on_update).
    pub fn off_update(&self, receiver: impl Into<ReceiverId>) -> bool {
        self.remove_update_receiver(receiver, DEFAULT_ORDER)
    }

    /// Runs `receiver` right after the fixed-update body.
    pub fn on_fixed_update(&self, receiver: impl Into<Subscriber>) {
        self.add_fixed_update_receiver(receiver, DEFAULT_ORDER);
    }

    /// Undoes [`on_fixed_update`](Self::on_fixed_update).
    pub fn off_fixed_update(&self, receiver: impl Into<ReceiverId>) -> bool {
        self.remove_fixed_update_receiver(receiver, DEFAULT_ORDER)
    }

    /// Runs `receiver` right after the late-update body.
    pub fn on_late_update(&self, receiver: impl Into<Subscriber>) {
        self.add_late_update_receiver(receiver, DEFAULT_ORDER);
    }

    /// Undoes [`on_late_update`](Self::on_late_update).
    pub fn off_late_update(&self, receiver: impl Into<ReceiverId>) -> bool {
        self.remove_late_update_receiver(receiver, DEFAULT_ORDER)
    }

    // =========================================================================
    // DISPATCH & INSPECTION
    // =========================================================================

    /// Runs every receiver of the list at `point`; this is what the
    /// installed hook calls. Returns the number of callbacks invoked.
    pub fn dispatch(&self, point: HookPoint) -> usize {
        let outcome = dispatch::run(&self.shared.state, point);
        if outcome.emptied {
            self.deactivate(point);
        }
        outcome.invoked
    }

    /// True while the list at `point` has buckets (and so a hook).
    #[must_use]
    pub fn is_active(&self, point: HookPoint) -> bool {
        !self.shared.state.borrow().lists[point.index()].is_empty()
    }

    /// Live registrations in the list at `point`.
    #[must_use]
    pub fn receiver_count(&self, point: HookPoint) -> usize {
        let state = self.shared.state.borrow();
        state.lists[point.index()].live_count(&state.pool)
    }

    /// Bucket priorities of the list at `point`, in execution order.
    #[must_use]
    pub fn priorities(&self, point: HookPoint) -> Vec<i32> {
        let state = self.shared.state.borrow();
        state.lists[point.index()].priorities(&state.pool)
    }

    /// Allocation counters of the shared bucket pool.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.shared.state.borrow().pool.stats()
    }

    /// Retired buckets currently waiting for reuse.
    #[must_use]
    pub fn pooled_count(&self) -> usize {
        self.shared.state.borrow().pool.pooled_count()
    }

    /// Drops every registration and clears every hook.
    ///
    /// Lists that are mid-dispatch finish their pass first.
    pub fn clear(&self) {
        for point in HookPoint::ALL {
            let emptied = {
                let mut state = self.shared.state.borrow_mut();
                let (list, pool) = state.split(point);
                let was_empty = list.is_empty();
                list.clear(pool);
                !was_empty && list.is_empty()
            };
            if emptied {
                self.deactivate(point);
            }
        }
    }

    fn activate(&self, point: HookPoint) {
        let weak = Rc::downgrade(&self.shared);
        let hook: Hook = Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                Scheduler { shared }.dispatch(point);
            }
        });
        self.shared.driver.set_hook(point, Some(hook));
        tracing::debug!(%point, "hook installed");
    }

    fn deactivate(&self, point: HookPoint) {
        self.shared.driver.set_hook(point, None);
        tracing::debug!(%point, "hook cleared");
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        let mut map = f.debug_map();
        for point in HookPoint::ALL {
            let list = &state.lists[point.index()];
            if !list.is_empty() {
                map.entry(&point.to_string(), &list.priorities(&state.pool));
            }
        }
        map.finish()
    }
}
