//! The outcome of one phase invocation.
//!
//! A phase answers two questions each time it is stepped: did it finish,
//! and how much of the offered day did it leave unused. The unused
//! fraction is physical time, not physiological units, so the next phase
//! applies its own rate to it.

/// What the sequencer should do after a phase returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The phase is not complete; stay on it.
    Remain,
    /// The phase is complete; advance to the next phase in order.
    Proceed,
    /// Transfer control to the phase starting at the named stage.
    JumpTo(String),
}

/// Result of [`Phase::do_time_step`](crate::Phase::do_time_step).
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseStep {
    /// Requested transition.
    pub transition: Transition,
    /// Portion of the offered day fraction this phase did not use.
    pub unused_fraction: f64,
}

impl PhaseStep {
    /// The phase consumed the whole offer and is not complete.
    pub const fn remain() -> Self {
        Self {
            transition: Transition::Remain,
            unused_fraction: 0.0,
        }
    }

    /// The phase completed, leaving `unused_fraction` of the day.
    pub const fn proceed(unused_fraction: f64) -> Self {
        Self {
            transition: Transition::Proceed,
            unused_fraction,
        }
    }

    /// The phase requests a jump to the phase starting at `stage`.
    ///
    /// A jump takes no time: the whole `day_fraction` offered is handed to
    /// the phase jumped to.
    pub fn jump(stage: impl Into<String>, day_fraction: f64) -> Self {
        Self {
            transition: Transition::JumpTo(stage.into()),
            unused_fraction: day_fraction,
        }
    }

    /// Whether this step signals normal completion (`proceed`).
    pub const fn proceeds(&self) -> bool {
        matches!(self.transition, Transition::Proceed)
    }
}
