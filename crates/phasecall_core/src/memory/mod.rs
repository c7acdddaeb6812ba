//! # Memory Management
//!
//! Pooled bucket storage for allocation-free steady-state scheduling.
//!
//! ## Design Philosophy
//!
//! Subscription patterns such as "subscribe this frame, unsubscribe next
//! frame" create and destroy buckets constantly. Retired buckets go back to
//! a small shared pool and are refilled in place on the next request, so
//! the churn costs no heap traffic once the pool is warm.

mod pool;

pub use pool::{BucketId, NodePool, PoolStats};
