//! Generic target-accumulation phase.

use phenology_types::PhaseKind;

use super::{PhaseLabels, check_offer, label_accessors};
use crate::accumulate::Accumulator;
use crate::context::PhaseContext;
use crate::error::PhaseError;
use crate::phase::Phase;
use crate::sources::{ProgressSource, TargetSource};
use crate::step::PhaseStep;

/// A phase that accumulates an injected rate towards an injected target.
///
/// Most thermal-time phases are a `GenericPhase` with a [`ThermalTime`] or
/// [`StressedThermalTime`] rate and a [`FixedTarget`].
///
/// [`ThermalTime`]: crate::sources::ThermalTime
/// [`StressedThermalTime`]: crate::sources::StressedThermalTime
/// [`FixedTarget`]: crate::sources::FixedTarget
#[derive(Debug)]
pub struct GenericPhase {
    labels: PhaseLabels,
    rate: Box<dyn ProgressSource>,
    target: Box<dyn TargetSource>,
    emerged: bool,
    acc: Accumulator,
}

impl GenericPhase {
    /// Create a phase from its labels and its rate and target sources.
    pub fn new(
        labels: PhaseLabels,
        rate: Box<dyn ProgressSource>,
        target: Box<dyn TargetSource>,
    ) -> Self {
        Self {
            labels,
            rate,
            target,
            emerged: true,
            acc: Accumulator::new(),
        }
    }

    /// Mark the plant as below ground while in this phase.
    #[must_use]
    pub const fn below_ground(mut self) -> Self {
        self.emerged = false;
        self
    }

    fn current_target(&self) -> Option<f64> {
        self.acc.last_target().or_else(|| self.target.known_target())
    }
}

impl Phase for GenericPhase {
    label_accessors!();

    fn kind(&self) -> PhaseKind {
        PhaseKind::Generic
    }

    fn is_emerged(&self) -> bool {
        self.emerged
    }

    fn do_time_step(
        &mut self,
        ctx: &PhaseContext<'_>,
        day_fraction: f64,
    ) -> Result<PhaseStep, PhaseError> {
        check_offer(&self.labels.name, day_fraction)?;
        let rate = self
            .rate
            .daily_rate(ctx)
            .map_err(|e| PhaseError::from_source(&self.labels.name, e))?;
        let target = self
            .target
            .target(ctx)
            .map_err(|e| PhaseError::from_source(&self.labels.name, e))?;
        Ok(self.acc.step(rate, target, day_fraction))
    }

    fn fraction_complete(&self) -> f64 {
        self.current_target()
            .map_or(0.0, |target| self.acc.fraction_of(target))
    }

    fn reset_phase(&mut self) {
        self.acc.reset();
    }

    fn write_summary(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
        match self.current_target() {
            Some(target) => write!(
                out,
                "{}: {} to {}, target {target:.1}, progress {:.1}",
                self.labels.name,
                self.labels.start_stage,
                self.labels.end_stage,
                self.acc.progress()
            ),
            None => write!(
                out,
                "{}: {} to {}, target not yet computed",
                self.labels.name, self.labels.start_stage, self.labels.end_stage
            ),
        }
    }

    fn progress_for_time_step(&self) -> f64 {
        self.acc.last_increment()
    }

    fn progress(&self) -> f64 {
        self.acc.progress()
    }

    fn target(&self) -> Option<f64> {
        self.current_target()
    }

    fn set_progress(&mut self, progress: f64) {
        self.acc.set_progress(progress);
    }
}
