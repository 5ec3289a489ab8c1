//! Target accumulation with exact day-fraction carry-over.
//!
//! Every target-based phase delegates its arithmetic here. The rule:
//!
//! ```text
//! increment = rate * day_fraction
//! progress += increment
//! if progress > target:
//!     overshoot = progress - target
//!     unused    = overshoot / rate        (rate == 0 => unused = day_fraction)
//!     progress  = target
//!     proceed
//! else:
//!     remain, unused = 0
//! ```
//!
//! The overshoot is converted back into physical time using the raw daily
//! rate, so the next phase applies its own rate to the leftover time. A
//! target of 0 (or less) completes immediately and forwards the whole offer.

use serde::{Deserialize, Serialize};

use crate::step::PhaseStep;

/// Running progress towards a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    progress: f64,
    last_increment: f64,
    last_target: Option<f64>,
}

impl Accumulator {
    /// A fresh accumulator with no progress.
    pub const fn new() -> Self {
        Self {
            progress: 0.0,
            last_increment: 0.0,
            last_target: None,
        }
    }

    /// Accumulated progress, never above the most recent target.
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    /// Increment kept on the most recent step (after overshoot removal).
    pub const fn last_increment(&self) -> f64 {
        self.last_increment
    }

    /// Target seen on the most recent step.
    pub const fn last_target(&self) -> Option<f64> {
        self.last_target
    }

    /// Overwrite accumulated progress.
    pub const fn set_progress(&mut self, progress: f64) {
        self.progress = progress;
    }

    /// Forget everything.
    pub const fn reset(&mut self) {
        *self = Self::new();
    }

    /// Apply one step of `rate` (progress per whole day) against `target`.
    pub fn step(&mut self, rate: f64, target: f64, day_fraction: f64) -> PhaseStep {
        self.last_target = Some(target);

        if target <= 0.0 {
            self.last_increment = 0.0;
            return PhaseStep::proceed(day_fraction);
        }

        let increment = rate * day_fraction;
        self.progress += increment;
        self.last_increment = increment;

        if self.progress > target {
            let overshoot = self.progress - target;
            let unused = if rate > 0.0 {
                (overshoot / rate).clamp(0.0, day_fraction)
            } else {
                day_fraction
            };
            self.progress = target;
            self.last_increment = increment - overshoot;
            PhaseStep::proceed(unused)
        } else {
            PhaseStep::remain()
        }
    }

    /// Completion in `[0, 1]` against `target`; a non-positive target is complete.
    pub fn fraction_of(&self, target: f64) -> f64 {
        if target <= 0.0 {
            1.0
        } else {
            (self.progress / target).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::step::Transition;

    const TOL: f64 = 1e-12;

    #[test]
    fn overshoot_returns_leftover_day() {
        // Rate R = 30, remaining target T = 10: unused = (30 - 10) / 30.
        let mut acc = Accumulator::new();
        acc.set_progress(90.0);
        let step = acc.step(30.0, 100.0, 1.0);
        assert!(step.proceeds());
        assert!((step.unused_fraction - 2.0 / 3.0).abs() < TOL);
        assert!((acc.progress() - 100.0).abs() < TOL);
        assert!((acc.last_increment() - 10.0).abs() < TOL);
    }

    #[test]
    fn constant_rate_reaches_target_on_fourth_day() {
        let mut acc = Accumulator::new();
        for expected in [30.0, 60.0, 90.0] {
            let step = acc.step(30.0, 100.0, 1.0);
            assert_eq!(step.transition, Transition::Remain);
            assert!(step.unused_fraction.abs() < TOL);
            assert!((acc.progress() - expected).abs() < TOL);
        }
        let step = acc.step(30.0, 100.0, 1.0);
        assert!(step.proceeds());
        assert!((acc.progress() - 100.0).abs() < TOL);
        assert!(step.unused_fraction > 0.0 && step.unused_fraction < 1.0);
    }

    #[test]
    fn partial_offer_scales_increment() {
        let mut acc = Accumulator::new();
        let step = acc.step(40.0, 15.0, 0.5);
        // 20 units offered, 5 overshoot, 5/40 of a day left.
        assert!(step.proceeds());
        assert!((step.unused_fraction - 0.125).abs() < TOL);
    }

    #[test]
    fn zero_target_completes_immediately() {
        let mut acc = Accumulator::new();
        assert!((acc.fraction_of(0.0) - 1.0).abs() < TOL);
        let step = acc.step(0.0, 0.0, 0.7);
        assert!(step.proceeds());
        assert!((step.unused_fraction - 0.7).abs() < TOL);
        assert!(acc.progress().abs() < TOL);
    }

    #[test]
    fn zero_rate_never_completes_positive_target() {
        let mut acc = Accumulator::new();
        for _ in 0..10 {
            assert!(!acc.step(0.0, 5.0, 1.0).proceeds());
        }
        assert!(acc.fraction_of(5.0).abs() < TOL);
    }

    #[test]
    fn exact_hit_does_not_proceed() {
        let mut acc = Accumulator::new();
        let step = acc.step(10.0, 10.0, 1.0);
        assert!(!step.proceeds());
        assert!((acc.fraction_of(10.0) - 1.0).abs() < TOL);
    }

    #[test]
    fn reset_clears_progress() {
        let mut acc = Accumulator::new();
        acc.step(10.0, 100.0, 1.0);
        acc.reset();
        assert!(acc.progress().abs() < TOL);
        assert!(acc.last_target().is_none());
    }
}
