//! The terminal phase.

use phenology_types::PhaseKind;

use super::{PhaseLabels, check_offer, label_accessors};
use crate::context::PhaseContext;
use crate::error::PhaseError;
use crate::phase::Phase;
use crate::sources::{ProgressSource, ThermalTime};
use crate::step::PhaseStep;

/// Never completes. Thermal time keeps accumulating until the chain is reset.
#[derive(Debug)]
pub struct EndPhase {
    labels: PhaseLabels,
    thermal_time: f64,
    last_increment: f64,
}

impl EndPhase {
    /// Create the terminal phase.
    pub const fn new(labels: PhaseLabels) -> Self {
        Self {
            labels,
            thermal_time: 0.0,
            last_increment: 0.0,
        }
    }
}

impl Phase for EndPhase {
    label_accessors!();

    fn kind(&self) -> PhaseKind {
        PhaseKind::End
    }

    fn do_time_step(
        &mut self,
        ctx: &PhaseContext<'_>,
        day_fraction: f64,
    ) -> Result<PhaseStep, PhaseError> {
        check_offer(&self.labels.name, day_fraction)?;
        let tt = ThermalTime
            .daily_rate(ctx)
            .map_err(|e| PhaseError::from_source(&self.labels.name, e))?;
        self.last_increment = tt * day_fraction;
        self.thermal_time += self.last_increment;
        Ok(PhaseStep::remain())
    }

    fn fraction_complete(&self) -> f64 {
        0.0
    }

    fn reset_phase(&mut self) {
        self.thermal_time = 0.0;
        self.last_increment = 0.0;
    }

    fn write_summary(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
        write!(
            out,
            "{}: {} to {}, terminal",
            self.labels.name, self.labels.start_stage, self.labels.end_stage
        )
    }

    fn progress_for_time_step(&self) -> f64 {
        self.last_increment
    }

    fn progress(&self) -> f64 {
        self.thermal_time
    }
}
