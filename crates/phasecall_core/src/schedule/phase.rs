//! # Phases and Hook Points
//!
//! Three periodic phases, each split into an independent pre and post list.

use std::fmt;

/// Periodic invocation point of the host frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Once per rendered frame.
    Update,
    /// Once per fixed-timestep tick.
    FixedUpdate,
    /// Once per rendered frame, after every update.
    LateUpdate,
}

impl Phase {
    /// All phases.
    pub const ALL: [Self; 3] = [Self::Update, Self::FixedUpdate, Self::LateUpdate];

    /// Short lowercase name, used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::FixedUpdate => "fixed_update",
            Self::LateUpdate => "late_update",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which side of the host's own phase body a list runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Immediately before the host body. Selected by negative orders.
    Pre,
    /// Immediately after the host body. Selected by orders `>= 0`.
    Post,
}

impl Stage {
    /// Picks the stage from the sign of a registration order.
    #[inline]
    #[must_use]
    pub const fn for_order(order: i32) -> Self {
        if order < 0 {
            Self::Pre
        } else {
            Self::Post
        }
    }
}

/// One of the six driver hook points, each backed by its own list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HookPoint {
    /// Phase the hook belongs to.
    pub phase: Phase,
    /// Side of the host body it fires on.
    pub stage: Stage,
}

impl HookPoint {
    /// Number of hook points.
    pub const COUNT: usize = 6;

    /// Every hook point, grouped by phase, pre before post.
    pub const ALL: [Self; Self::COUNT] = [
        Self::pre(Phase::Update),
        Self::post(Phase::Update),
        Self::pre(Phase::FixedUpdate),
        Self::post(Phase::FixedUpdate),
        Self::pre(Phase::LateUpdate),
        Self::post(Phase::LateUpdate),
    ];

    /// Creates a hook point.
    #[must_use]
    pub const fn new(phase: Phase, stage: Stage) -> Self {
        Self { phase, stage }
    }

    /// The pre hook of `phase`.
    #[must_use]
    pub const fn pre(phase: Phase) -> Self {
        Self::new(phase, Stage::Pre)
    }

    /// The post hook of `phase`.
    #[must_use]
    pub const fn post(phase: Phase) -> Self {
        Self::new(phase, Stage::Post)
    }

    /// The hook point a registration at `order` lands on.
    #[must_use]
    pub const fn for_order(phase: Phase, order: i32) -> Self {
        Self::new(phase, Stage::for_order(order))
    }

    /// Dense index in `0..COUNT`, matching the position in [`HookPoint::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        let phase = match self.phase {
            Phase::Update => 0,
            Phase::FixedUpdate => 1,
            Phase::LateUpdate => 2,
        };
        let stage = match self.stage {
            Stage::Pre => 0,
            Stage::Post => 1,
        };
        phase * 2 + stage
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Stage::Pre => write!(f, "pre_{}", self.phase),
            Stage::Post => write!(f, "post_{}", self.phase),
        }
    }
}
