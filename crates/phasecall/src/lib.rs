//! # Phasecall
//!
//! Host-side integration for the phasecall scheduler.
//!
//! ## Frame Order
//!
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────┐
//! │ 1. FIXED STEPS (0..=max_fixed_steps, accumulator-driven) │
//! │    ├─ pre_fixed_update hook                              │
//! │    ├─ body.fixed_update                                  │
//! │    └─ post_fixed_update hook                             │
//! │                                                          │
//! │ 2. UPDATE                                                │
//! │    ├─ pre_update hook                                    │
//! │    ├─ body.update                                        │
//! │    └─ post_update hook                                   │
//! │                                                          │
//! │ 3. LATE UPDATE                                           │
//! │    ├─ pre_late_update hook                               │
//! │    ├─ body.late_update                                   │
//! │    └─ post_late_update hook                              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: Combined scheduler and frame-loop configuration
//! - `frame_loop`: The reference driver and its statistics

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod frame_loop;

// Re-export the engine
pub use phasecall_core as core;

pub use config::{FrameLoopConfig, PhasecallConfig};
pub use frame_loop::{FrameBody, FrameLoop, FrameStats, FrameStatsAccumulator};
