//! # Scheduler Configuration
//!
//! Loaded once at startup, either from TOML or from `Default`.
//!
//! ```toml
//! pool_capacity = 8
//! pre_update_order = -2000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

/// Default number of retired buckets kept for reuse.
pub const DEFAULT_POOL_CAPACITY: usize = 8;

/// Default order used by the pre-update shorthand.
pub const DEFAULT_PRE_UPDATE_ORDER: i32 = -2000;

/// Upper bound accepted for `pool_capacity`.
pub const MAX_POOL_CAPACITY: usize = 1024;

/// Tunables for a [`Scheduler`](crate::Scheduler).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Maximum number of retired buckets held for reuse.
    ///
    /// Zero disables pooling; every new priority then allocates.
    pub pool_capacity: usize,
    /// Order used by `on_pre_update` / `off_pre_update`. Must be negative.
    pub pre_update_order: i32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            pre_update_order: DEFAULT_PRE_UPDATE_ORDER,
        }
    }
}

impl SchedulerConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ConfigParse`] for malformed TOML and
    /// [`SchedulerError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> SchedulerResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ConfigIo`] if the file cannot be read, plus
    /// everything [`SchedulerConfig::from_toml_str`] can return.
    pub fn from_path(path: impl AsRef<Path>) -> SchedulerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchedulerError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.pool_capacity > MAX_POOL_CAPACITY {
            return Err(SchedulerError::InvalidConfig(format!(
                "pool_capacity {} exceeds maximum {}",
                self.pool_capacity, MAX_POOL_CAPACITY
            )));
        }
        if self.pre_update_order >= 0 {
            return Err(SchedulerError::InvalidConfig(format!(
                "pre_update_order must be negative, got {}",
                self.pre_update_order
            )));
        }
        Ok(())
    }
}
