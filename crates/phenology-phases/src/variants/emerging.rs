//! Emergence: the shoot grows from the seed to the soil surface.

use chrono::NaiveDate;
use phenology_types::PhaseKind;

use super::{PhaseLabels, check_offer, label_accessors};
use crate::accumulate::Accumulator;
use crate::context::PhaseContext;
use crate::error::PhaseError;
use crate::phase::Phase;
use crate::sources::{ProgressSource, SowingDepthTarget, TargetSource, ThermalTime};
use crate::step::PhaseStep;

/// Thermal time towards `shoot_lag + sowing_depth * shoot_rate`, unless an
/// emergence date is forced.
///
/// With a forced date the phase ignores thermal time and completes on that
/// date, forwarding the whole offer.
#[derive(Debug)]
pub struct EmergingPhase {
    labels: PhaseLabels,
    target: SowingDepthTarget,
    emergence_date: Option<NaiveDate>,
    acc: Accumulator,
}

impl EmergingPhase {
    /// Create an emerging phase for a seed sown at `target.sowing_depth`.
    pub const fn new(labels: PhaseLabels, target: SowingDepthTarget) -> Self {
        Self {
            labels,
            target,
            emergence_date: None,
            acc: Accumulator::new(),
        }
    }

    /// Force emergence on `date`.
    #[must_use]
    pub const fn with_emergence_date(mut self, date: Option<NaiveDate>) -> Self {
        self.emergence_date = date;
        self
    }

    /// The forced emergence date, if any.
    pub const fn emergence_date(&self) -> Option<NaiveDate> {
        self.emergence_date
    }

    /// Thermal time needed to emerge.
    pub fn thermal_time_target(&self) -> f64 {
        self.target
            .shoot_rate
            .mul_add(self.target.sowing_depth, self.target.shoot_lag)
    }
}

impl Phase for EmergingPhase {
    label_accessors!();

    fn kind(&self) -> PhaseKind {
        PhaseKind::Emerging
    }

    fn is_emerged(&self) -> bool {
        false
    }

    fn do_time_step(
        &mut self,
        ctx: &PhaseContext<'_>,
        day_fraction: f64,
    ) -> Result<PhaseStep, PhaseError> {
        check_offer(&self.labels.name, day_fraction)?;

        if let Some(date) = self.emergence_date {
            return Ok(if ctx.inputs.date == date {
                PhaseStep::proceed(day_fraction)
            } else {
                PhaseStep::remain()
            });
        }

        let rate = ThermalTime
            .daily_rate(ctx)
            .map_err(|e| PhaseError::from_source(&self.labels.name, e))?;
        let target = self
            .target
            .target(ctx)
            .map_err(|e| PhaseError::from_source(&self.labels.name, e))?;
        Ok(self.acc.step(rate, target, day_fraction))
    }

    fn fraction_complete(&self) -> f64 {
        self.acc.fraction_of(self.thermal_time_target())
    }

    fn reset_phase(&mut self) {
        self.acc.reset();
    }

    fn write_summary(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
        match self.emergence_date {
            Some(date) => write!(
                out,
                "{}: {} to {}, emergence forced on {date}",
                self.labels.name, self.labels.start_stage, self.labels.end_stage
            ),
            None => write!(
                out,
                "{}: {} to {}, shoot lag {:.1} + depth {:.1} mm x {:.2} = {:.1} degree-days",
                self.labels.name,
                self.labels.start_stage,
                self.labels.end_stage,
                self.target.shoot_lag,
                self.target.sowing_depth,
                self.target.shoot_rate,
                self.thermal_time_target()
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
        Some(self.thermal_time_target())
    }

    fn set_progress(&mut self, progress: f64) {
        self.acc.set_progress(progress);
    }
}
