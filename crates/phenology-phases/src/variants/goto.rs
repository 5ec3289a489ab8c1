//! Control transfer to another part of the phase chain.

use phenology_types::PhaseKind;
use tracing::trace;

use super::{PhaseLabels, check_offer, label_accessors};
use crate::context::PhaseContext;
use crate::error::PhaseError;
use crate::phase::Phase;
use crate::step::PhaseStep;

/// Requests a jump to the phase whose start stage is `target_stage`.
///
/// The phase itself never proceeds and consumes none of the day. The
/// sequencer performs the jump and offers the phase jumped to everything the
/// goto was offered.
#[derive(Debug)]
pub struct GotoPhase {
    labels: PhaseLabels,
    target_stage: String,
}

impl GotoPhase {
    /// Create a goto phase.
    pub fn new(labels: PhaseLabels, target_stage: impl Into<String>) -> Self {
        Self {
            labels,
            target_stage: target_stage.into(),
        }
    }

    /// The stage whose opening phase becomes active.
    pub fn target_stage(&self) -> &str {
        &self.target_stage
    }
}

impl Phase for GotoPhase {
    label_accessors!();

    fn kind(&self) -> PhaseKind {
        PhaseKind::Goto
    }

    fn do_time_step(
        &mut self,
        ctx: &PhaseContext<'_>,
        day_fraction: f64,
    ) -> Result<PhaseStep, PhaseError> {
        check_offer(&self.labels.name, day_fraction)?;
        if ctx.stages.layout().start_index(&self.target_stage).is_none() {
            return Err(PhaseError::UnknownStage {
                phase: self.labels.name.clone(),
                stage: self.target_stage.clone(),
            });
        }
        trace!(phase = %self.labels.name, target = %self.target_stage, day_fraction, "Goto");
        Ok(PhaseStep::jump(self.target_stage.clone(), day_fraction))
    }

    fn fraction_complete(&self) -> f64 {
        0.0
    }

    fn reset_phase(&mut self) {}

    fn write_summary(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
        write!(
            out,
            "{}: at {} jump to {}",
            self.labels.name, self.labels.start_stage, self.target_stage
        )
    }

    fn progress_for_time_step(&self) -> f64 {
        0.0
    }

    fn jump_target(&self) -> Option<&str> {
        Some(&self.target_stage)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::step::Transition;
    use crate::test_support::{Harness, date};
    use phenology_types::DailyInputs;

    #[test]
    fn requests_jump_and_forwards_the_whole_offer() {
        let mut p = GotoPhase::new(PhaseLabels::new("Regrow", "Harvest", "Cut"), "Emergence");
        let h = Harness::new(DailyInputs::new(date(1), 10.0));
        let step = p.do_time_step(&h.ctx(), 0.6).unwrap();
        assert_eq!(step.transition, Transition::JumpTo("Emergence".to_owned()));
        assert!((step.unused_fraction - 0.6).abs() < f64::EPSILON);
        assert!(!step.proceeds());
    }

    #[test]
    fn unknown_target_is_an_error() {
        let mut p = GotoPhase::new(PhaseLabels::new("Regrow", "Harvest", "Cut"), "Nowhere");
        let h = Harness::new(DailyInputs::new(date(1), 10.0));
        assert!(matches!(
            p.do_time_step(&h.ctx(), 1.0),
            Err(PhaseError::UnknownStage { .. })
        ));
    }
}
