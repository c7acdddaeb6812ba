//! # Scheduler Error Types
//!
//! Scheduling itself never fails: subscribe and unsubscribe are infallible
//! and unknown receivers are silently ignored. Errors only come from loading
//! configuration and from the process-wide accessor.

use thiserror::Error;

/// Errors raised around the scheduler (configuration and installation).
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    ConfigIo {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration text is not valid TOML for the expected schema.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but holds an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A scheduler is already installed on this thread.
    #[error("a scheduler is already installed on this thread")]
    AlreadyInstalled,
}

/// Result type for scheduler setup operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
