//! # Phasecall Configuration
//!
//! One TOML file covers both the scheduler and the frame loop. Every field
//! has a default, so partial files are fine.
//!
//! ```toml
//! [scheduler]
//! pool_capacity = 16
//!
//! [frame_loop]
//! fixed_hz = 50
//! max_delta_ms = 100
//! max_fixed_steps = 8
//! frame_budget_ms = 33
//! ```

use std::path::Path;
use std::time::Duration;

use phasecall_core::{SchedulerConfig, SchedulerError, SchedulerResult};
use serde::{Deserialize, Serialize};

/// Upper bound accepted for `fixed_hz`.
pub const MAX_FIXED_HZ: u32 = 1000;

/// Frame loop tunables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameLoopConfig {
    /// Fixed-update ticks per second.
    pub fixed_hz: u32,
    /// Longest frame delta accepted; longer deltas are clamped.
    pub max_delta_ms: u64,
    /// Most fixed steps run in one frame. Remaining backlog is dropped.
    pub max_fixed_steps: u32,
    /// Frames slower than this are logged.
    pub frame_budget_ms: u64,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            fixed_hz: 50,
            max_delta_ms: 100,
            max_fixed_steps: 8,
            frame_budget_ms: 33,
        }
    }
}

impl FrameLoopConfig {
    /// Duration of one fixed step.
    #[must_use]
    pub fn fixed_step(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.fixed_hz.max(1)))
    }

    /// Upper clamp for a frame delta.
    #[must_use]
    pub const fn max_delta(&self) -> Duration {
        Duration::from_millis(self.max_delta_ms)
    }

    /// Wall time a frame may take before it counts as over budget.
    #[must_use]
    pub const fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.fixed_hz == 0 || self.fixed_hz > MAX_FIXED_HZ {
            return Err(SchedulerError::InvalidConfig(format!(
                "fixed_hz must be in 1..={MAX_FIXED_HZ}, got {}",
                self.fixed_hz
            )));
        }
        if self.max_delta_ms == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_delta_ms must be positive".to_string(),
            ));
        }
        if self.max_fixed_steps == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_fixed_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Combined configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhasecallConfig {
    /// Scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Frame loop settings.
    pub frame_loop: FrameLoopConfig,
}

impl PhasecallConfig {
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
    /// everything [`PhasecallConfig::from_toml_str`] can return.
    pub fn from_path(path: impl AsRef<Path>) -> SchedulerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchedulerError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validates both sections.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> SchedulerResult<()> {
        self.scheduler.validate()?;
        self.frame_loop.validate()
    }
}
