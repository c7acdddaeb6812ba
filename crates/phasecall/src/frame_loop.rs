//! # Reference Frame Loop
//!
//! Owns the six hook points and fires them around the host's own phase
//! bodies, once per frame (once per fixed tick for fixed update).
//!
//! The fixed-update phase is accumulator driven: every frame adds its
//! (clamped) delta and runs whole fixed steps until the accumulator is below
//! one step or `max_fixed_steps` is reached. A backlog beyond that cap is
//! dropped rather than carried into the next frame.

use std::rc::Rc;
use std::time::{Duration, Instant};

use phasecall_core::{FrameDriver, HookPoint, HookTable, Phase, SchedulerResult};

use crate::config::FrameLoopConfig;

/// The host's own per-phase work, run between each phase's pre and post
/// hooks.
pub trait FrameBody {
    /// Runs once per fixed step.
    fn fixed_update(&mut self, _step: Duration) {}

    /// Runs once per frame.
    fn update(&mut self, _delta: Duration) {}

    /// Runs once per frame, after update.
    fn late_update(&mut self, _delta: Duration) {}
}

/// A host with no native phase work.
impl FrameBody for () {}

/// Per-frame statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number, starting at 0.
    pub frame: u64,
    /// Delta used for this frame after clamping, in microseconds.
    pub delta_us: u64,
    /// Fixed steps run this frame.
    pub fixed_steps: u32,
    /// Hooks that had something installed when fired.
    pub hooks_fired: u32,
    /// Wall time spent in the frame, in microseconds.
    pub total_us: u64,
}

/// The reference driver.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use phasecall::{FrameLoop, FrameLoopConfig};
/// use phasecall::core::{Receiver, Scheduler, SchedulerConfig};
///
/// let mut frame_loop = FrameLoop::new(FrameLoopConfig::default())?;
/// let scheduler = Scheduler::new(SchedulerConfig::default(), frame_loop.driver())?;
///
/// let physics = Receiver::new(|| {});
/// scheduler.on_fixed_update(&physics);
///
/// // 45ms at 50Hz: two fixed steps
/// let stats = frame_loop.run_frame(&mut (), Duration::from_millis(45));
/// assert_eq!(stats.fixed_steps, 2);
/// assert_eq!(stats.hooks_fired, 2);
/// # Ok::<(), phasecall::core::SchedulerError>(())
/// ```
pub struct FrameLoop {
    /// Hook slots the scheduler writes into.
    hooks: Rc<HookTable>,
    config: FrameLoopConfig,
    /// Cached `config.fixed_step()`.
    fixed_step: Duration,
    /// Unconsumed fixed-update time.
    accumulator: Duration,
    frame_count: u64,
    fixed_tick_count: u64,
    /// Start of the previous `tick`, if any.
    last_tick: Option<Instant>,
    stats: FrameStatsAccumulator,
}

impl FrameLoop {
    /// Creates a frame loop with every hook slot empty.
    ///
    /// # Errors
    /// Returns [`SchedulerError::InvalidConfig`](phasecall_core::SchedulerError::InvalidConfig)
    /// if `config` does not validate.
    pub fn new(config: FrameLoopConfig) -> SchedulerResult<Self> {
        Self::with_hooks(config, Rc::new(HookTable::new()))
    }

    /// Creates a frame loop around an existing hook table.
    ///
    /// # Errors
    /// Same as [`FrameLoop::new`].
    pub fn with_hooks(config: FrameLoopConfig, hooks: Rc<HookTable>) -> SchedulerResult<Self> {
        config.validate()?;
        let fixed_step = config.fixed_step();
        Ok(Self {
            hooks,
            config,
            fixed_step,
            accumulator: Duration::ZERO,
            frame_count: 0,
            fixed_tick_count: 0,
            last_tick: None,
            stats: FrameStatsAccumulator::new(),
        })
    }

    /// The hook table the loop fires.
    #[must_use]
    pub fn hooks(&self) -> &Rc<HookTable> {
        &self.hooks
    }

    /// The hook table as a scheduler driver.
    #[must_use]
    pub fn driver(&self) -> Rc<dyn FrameDriver> {
        self.hooks.clone()
    }

    /// Configuration the loop was built with.
    #[must_use]
    pub fn config(&self) -> &FrameLoopConfig {
        &self.config
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Fixed steps run so far.
    #[inline]
    #[must_use]
    pub fn fixed_tick_count(&self) -> u64 {
        self.fixed_tick_count
    }

    /// Fraction of a fixed step left in the accumulator, for interpolation.
    #[must_use]
    pub fn fixed_alpha(&self) -> f64 {
        self.accumulator.as_secs_f64() / self.fixed_step.as_secs_f64()
    }

    /// Accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }

    /// Runs one frame using the wall-clock time since the previous call.
    ///
    /// The first call uses a zero delta.
    pub fn tick(&mut self, body: &mut impl FrameBody) -> FrameStats {
        let now = Instant::now();
        let delta = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.duration_since(last));
        self.last_tick = Some(now);
        self.run_frame(body, delta)
    }

    /// Runs one frame with an explicit delta.
    pub fn run_frame(&mut self, body: &mut impl FrameBody, delta: Duration) -> FrameStats {
        let start = Instant::now();
        let delta = delta.min(self.config.max_delta());
        let mut hooks_fired = 0;

        self.accumulator += delta;
        let mut fixed_steps = 0;
        while self.accumulator >= self.fixed_step && fixed_steps < self.config.max_fixed_steps {
            self.accumulator -= self.fixed_step;
            hooks_fired += self.fire(HookPoint::pre(Phase::FixedUpdate));
            body.fixed_update(self.fixed_step);
            hooks_fired += self.fire(HookPoint::post(Phase::FixedUpdate));
            fixed_steps += 1;
            self.fixed_tick_count += 1;
        }
        if self.accumulator >= self.fixed_step {
            tracing::debug!(
                frame = self.frame_count,
                backlog_us = micros(self.accumulator),
                "fixed step backlog dropped"
            );
            self.accumulator = Duration::ZERO;
        }

        hooks_fired += self.fire(HookPoint::pre(Phase::Update));
        body.update(delta);
        hooks_fired += self.fire(HookPoint::post(Phase::Update));

        hooks_fired += self.fire(HookPoint::pre(Phase::LateUpdate));
        body.late_update(delta);
        hooks_fired += self.fire(HookPoint::post(Phase::LateUpdate));

        let elapsed = start.elapsed();
        let stats = FrameStats {
            frame: self.frame_count,
            delta_us: micros(delta),
            fixed_steps,
            hooks_fired,
            total_us: micros(elapsed),
        };
        self.end_frame(stats, elapsed);
        stats
    }

    fn fire(&self, point: HookPoint) -> u32 {
        u32::from(self.hooks.fire(point))
    }

    fn end_frame(&mut self, stats: FrameStats, elapsed: Duration) {
        self.frame_count += 1;
        let budget = self.config.frame_budget();
        let over_budget = elapsed > budget;
        self.stats.record(stats, over_budget);

        if over_budget {
            tracing::warn!(
                frame = stats.frame,
                elapsed_us = stats.total_us,
                budget_us = micros(budget),
                "frame exceeded budget"
            );
        }
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Fixed steps over all frames.
    pub fixed_steps: u64,
    /// Hooks fired over all frames.
    pub hooks_fired: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            fixed_steps: 0,
            hooks_fired: 0,
            frames_over_budget: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats, over_budget: bool) {
        self.frames_recorded += 1;
        self.total_us_sum = self.total_us_sum.saturating_add(stats.total_us);
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.fixed_steps += u64::from(stats.fixed_steps);
        self.hooks_fired += u64::from(stats.hooks_fired);
        if over_budget {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns the share of frames over budget.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasecall_core::{Receiver, Scheduler, SchedulerConfig, SchedulerError};
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recording {
        log: Log,
    }

    impl FrameBody for Recording {
        fn fixed_update(&mut self, _step: Duration) {
            self.log.borrow_mut().push("body.fixed_update".to_string());
        }

        fn update(&mut self, _delta: Duration) {
            self.log.borrow_mut().push("body.update".to_string());
        }

        fn late_update(&mut self, _delta: Duration) {
            self.log.borrow_mut().push("body.late_update".to_string());
        }
    }

    fn logging(log: &Log, name: &str) -> Receiver {
        let log = Rc::clone(log);
        let name = name.to_string();
        Receiver::new(move || log.borrow_mut().push(name.clone()))
    }

    #[test]
    fn test_phase_order() {
        let mut frame_loop = FrameLoop::new(FrameLoopConfig::default()).unwrap();
        let scheduler = Scheduler::new(SchedulerConfig::default(), frame_loop.driver()).unwrap();
        let log = Log::default();

        let receivers: Vec<(Receiver, Phase, i32)> = vec![
            (logging(&log, "pre_fixed"), Phase::FixedUpdate, -1),
            (logging(&log, "post_fixed"), Phase::FixedUpdate, 0),
            (logging(&log, "pre_update"), Phase::Update, -1),
            (logging(&log, "post_update"), Phase::Update, 0),
            (logging(&log, "pre_late"), Phase::LateUpdate, -1),
            (logging(&log, "post_late"), Phase::LateUpdate, 0),
        ];
        for (receiver, phase, order) in &receivers {
            scheduler.add_receiver(*phase, receiver, *order);
        }

        let mut body = Recording {
            log: Rc::clone(&log),
        };
        let stats = frame_loop.run_frame(&mut body, Duration::from_millis(20));

        assert_eq!(
            *log.borrow(),
            vec![
                "pre_fixed",
                "body.fixed_update",
                "post_fixed",
                "pre_update",
                "body.update",
                "post_update",
                "pre_late",
                "body.late_update",
                "post_late",
            ]
        );
        assert_eq!(stats.fixed_steps, 1);
        assert_eq!(stats.hooks_fired, 6);
    }

    #[test]
    fn test_fixed_steps_follow_accumulator() {
        let mut frame_loop = FrameLoop::new(FrameLoopConfig::default()).unwrap();

        // 50Hz = 20ms steps
        assert_eq!(frame_loop.run_frame(&mut (), Duration::from_millis(45)).fixed_steps, 2);
        assert_eq!(frame_loop.run_frame(&mut (), Duration::from_millis(15)).fixed_steps, 1);
        assert_eq!(frame_loop.run_frame(&mut (), Duration::from_millis(5)).fixed_steps, 0);
        assert_eq!(frame_loop.fixed_tick_count(), 3);
        assert_eq!(frame_loop.frame_count(), 3);
        assert!((frame_loop.fixed_alpha() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_delta_clamped() {
        let mut frame_loop = FrameLoop::new(FrameLoopConfig::default()).unwrap();
        let stats = frame_loop.run_frame(&mut (), Duration::from_secs(5));
        assert_eq!(stats.delta_us, 100_000);
        assert_eq!(stats.fixed_steps, 5);
    }

    #[test]
    fn test_fixed_backlog_dropped() {
        let config = FrameLoopConfig {
            max_fixed_steps: 2,
            ..FrameLoopConfig::default()
        };
        let mut frame_loop = FrameLoop::new(config).unwrap();

        let stats = frame_loop.run_frame(&mut (), Duration::from_millis(100));
        assert_eq!(stats.fixed_steps, 2);
        assert!(frame_loop.fixed_alpha() < 1e-9);

        let stats = frame_loop.run_frame(&mut (), Duration::ZERO);
        assert_eq!(stats.fixed_steps, 0);
    }

    #[test]
    fn test_empty_table_fires_nothing() {
        let mut frame_loop = FrameLoop::new(FrameLoopConfig::default()).unwrap();
        let stats = frame_loop.run_frame(&mut (), Duration::from_millis(60));
        assert_eq!(stats.hooks_fired, 0);
        assert_eq!(frame_loop.stats().fixed_steps, 3);
    }

    #[test]
    fn test_tick_first_frame_has_zero_delta() {
        let mut frame_loop = FrameLoop::new(FrameLoopConfig::default()).unwrap();
        let stats = frame_loop.tick(&mut ());
        assert_eq!(stats.delta_us, 0);
        assert_eq!(stats.frame, 0);
        assert_eq!(frame_loop.tick(&mut ()).frame, 1);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut frame_loop = FrameLoop::new(FrameLoopConfig::default()).unwrap();
        for _ in 0..10 {
            frame_loop.run_frame(&mut (), Duration::from_millis(20));
        }
        let stats = frame_loop.stats();
        assert_eq!(stats.frames_recorded, 10);
        assert_eq!(stats.fixed_steps, 10);
        assert!(stats.min_frame_us <= stats.max_frame_us);
        assert!(stats.avg_frame_ms() >= 0.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let no_steps = FrameLoopConfig {
            max_fixed_steps: 0,
            ..FrameLoopConfig::default()
        };
        assert!(matches!(
            FrameLoop::new(no_steps),
            Err(SchedulerError::InvalidConfig(_))
        ));

        let too_fast = FrameLoopConfig {
            fixed_hz: 2_000_000,
            ..FrameLoopConfig::default()
        };
        let hooks = Rc::new(HookTable::new());
        assert!(matches!(
            FrameLoop::with_hooks(too_fast, hooks.clone()),
            Err(SchedulerError::InvalidConfig(_))
        ));
        assert!(FrameLoop::with_hooks(FrameLoopConfig::default(), hooks).is_ok());
    }
}
