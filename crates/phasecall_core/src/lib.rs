//! # Phasecall Core
//!
//! Frame-phase callback scheduler. Subscribers register a callback against
//! one of three periodic phases (update, fixed update, late update) with a
//! signed order:
//! - negative orders run in the phase's *pre* list, before the host's own body
//! - non-negative orders run in the *post* list, right after it
//! - within a list, smaller orders run first; equal orders share a bucket
//!   and run most recently registered first
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in steady state** - retired buckets are pooled
//! 2. **Lazy hooks** - a list is only hooked on the driver while non-empty
//! 3. **Re-entrant dispatch** - callbacks may subscribe and unsubscribe,
//!    including themselves, while their list is being dispatched
//! 4. **Single-threaded** - no locks, no atomics, `!Send` handles
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use phasecall_core::{HookPoint, HookTable, Phase, Receiver, Scheduler, SchedulerConfig};
//!
//! let hooks = Rc::new(HookTable::new());
//! let scheduler = Scheduler::new(SchedulerConfig::default(), hooks.clone())?;
//!
//! let tick = Receiver::new(|| {});
//! scheduler.add_update_receiver(&tick, 10);
//! assert!(hooks.is_set(HookPoint::post(Phase::Update)));
//!
//! hooks.fire(HookPoint::post(Phase::Update));
//! scheduler.remove_update_receiver(&tick, 10);
//! assert!(!hooks.is_set(HookPoint::post(Phase::Update)));
//! # Ok::<(), phasecall_core::SchedulerError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod memory;
pub mod schedule;

pub use config::SchedulerConfig;
pub use error::{SchedulerError, SchedulerResult};
pub use memory::{BucketId, NodePool, PoolStats};
pub use schedule::{
    global, Bucket, FrameDriver, Hook, HookPoint, HookTable, OrderedBucketList, Phase, Receiver,
    ReceiverId, Scheduler, Stage, Subscriber, WeakReceiver, WeakScheduler, DEFAULT_ORDER,
};
