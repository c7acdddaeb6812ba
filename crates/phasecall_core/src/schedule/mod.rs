//! # Frame-Phase Scheduling
//!
//! ## Layout
//!
//! ```text
//!              ┌──────────── Scheduler ────────────┐
//!              │ pre_update    ──> [-2000] ──> [-1] │──> driver hook
//!              │ post_update   ──> [0] ──> [10]     │──> driver hook
//!              │ pre_fixed     ──> (empty)          │    (no hook)
//!              │ post_fixed    ──> [0]              │──> driver hook
//!              │ pre_late      ──> (empty)          │    (no hook)
//!              │ post_late     ──> [5]              │──> driver hook
//!              │                                    │
//!              │ NodePool: shared bucket arena      │
//!              └────────────────────────────────────┘
//! ```
//!
//! Ordering is only defined within one list. Nothing here compares a
//! pre-list to its post-list or one phase to another; the driver decides
//! when each hook fires.

mod bucket;
mod dispatch;
pub mod global;
mod hooks;
mod list;
mod phase;
mod receiver;
mod registry;

pub use bucket::Bucket;
pub use hooks::{FrameDriver, Hook, HookTable};
pub use list::OrderedBucketList;
pub use phase::{HookPoint, Phase, Stage};
pub use receiver::{Receiver, ReceiverId, Subscriber, WeakReceiver};
pub use registry::{Scheduler, WeakScheduler, DEFAULT_ORDER};
