//! Completion on a day-length threshold.

use phenology_types::{PhaseKind, PhotoperiodDirection};

use super::{PhaseLabels, check_offer, label_accessors};
use crate::context::PhaseContext;
use crate::error::PhaseError;
use crate::phase::Phase;
use crate::sources::{ProgressSource, ThermalTime, non_negative};
use crate::step::PhaseStep;

/// Completes once the day length crosses `threshold` hours in `direction`.
#[derive(Debug)]
pub struct PhotoperiodPhase {
    labels: PhaseLabels,
    threshold: f64,
    direction: PhotoperiodDirection,
    done: bool,
    thermal_time: f64,
    last_increment: f64,
}

impl PhotoperiodPhase {
    /// Create a photoperiod phase.
    pub const fn new(labels: PhaseLabels, threshold: f64, direction: PhotoperiodDirection) -> Self {
        Self {
            labels,
            threshold,
            direction,
            done: false,
            thermal_time: 0.0,
            last_increment: 0.0,
        }
    }

    const fn crossed(&self, photoperiod: f64, threshold: f64) -> bool {
        match self.direction {
            PhotoperiodDirection::Increasing => photoperiod >= threshold,
            PhotoperiodDirection::Decreasing => photoperiod <= threshold,
        }
    }
}

impl Phase for PhotoperiodPhase {
    label_accessors!();

    fn kind(&self) -> PhaseKind {
        PhaseKind::Photoperiod
    }

    fn do_time_step(
        &mut self,
        ctx: &PhaseContext<'_>,
        day_fraction: f64,
    ) -> Result<PhaseStep, PhaseError> {
        check_offer(&self.labels.name, day_fraction)?;
        let photoperiod = non_negative("photoperiod", ctx.inputs.photoperiod)
            .map_err(|e| PhaseError::from_source(&self.labels.name, e))?;
        let threshold = non_negative("photoperiod threshold", self.threshold)
            .map_err(|e| PhaseError::from_source(&self.labels.name, e))?;
        let tt = ThermalTime
            .daily_rate(ctx)
            .map_err(|e| PhaseError::from_source(&self.labels.name, e))?;
        self.last_increment = tt * day_fraction;
        self.thermal_time += self.last_increment;

        if self.crossed(photoperiod, threshold) {
            self.done = true;
            Ok(PhaseStep::proceed(day_fraction))
        } else {
            Ok(PhaseStep::remain())
        }
    }

    fn fraction_complete(&self) -> f64 {
        if self.done { 1.0 } else { 0.0 }
    }

    fn reset_phase(&mut self) {
        self.done = false;
        self.thermal_time = 0.0;
        self.last_increment = 0.0;
    }

    fn write_summary(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
        let verb = match self.direction {
            PhotoperiodDirection::Increasing => "rises to",
            PhotoperiodDirection::Decreasing => "falls to",
        };
        write!(
            out,
            "{}: {} to {}, ends when day length {verb} {:.1} h",
            self.labels.name, self.labels.start_stage, self.labels.end_stage, self.threshold
        )
    }

    fn progress_for_time_step(&self) -> f64 {
        self.last_increment
    }

    fn progress(&self) -> f64 {
        self.thermal_time
    }
}
