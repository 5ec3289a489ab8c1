//! Germination, gated on soil water at the seed layer.

use chrono::NaiveDate;
use phenology_types::PhaseKind;
use tracing::trace;

use super::{PhaseLabels, check_offer, label_accessors};
use crate::context::PhaseContext;
use crate::error::{PhaseError, SourceError};
use crate::phase::Phase;
use crate::step::PhaseStep;

/// Reported completion while the seed is still waiting for water.
const WAITING_FRACTION: f64 = 0.999;

/// Completes on the first day after sowing on which the seed layer is wetter
/// than its lower limit, or on a forced germination date.
///
/// Germination is treated as instantaneous once allowed: the whole offered
/// fraction is forwarded to the next phase.
#[derive(Debug)]
pub struct GerminatingPhase {
    labels: PhaseLabels,
    germination_date: Option<NaiveDate>,
    germinated: bool,
}

impl GerminatingPhase {
    /// Create a germinating phase.
    pub const fn new(labels: PhaseLabels) -> Self {
        Self {
            labels,
            germination_date: None,
            germinated: false,
        }
    }

    /// Force germination on `date` regardless of soil water.
    #[must_use]
    pub const fn with_germination_date(mut self, date: Option<NaiveDate>) -> Self {
        self.germination_date = date;
        self
    }

    /// The forced germination date, if any.
    pub const fn germination_date(&self) -> Option<NaiveDate> {
        self.germination_date
    }

    fn can_germinate(&self, ctx: &PhaseContext<'_>) -> Result<bool, PhaseError> {
        if let Some(date) = self.germination_date {
            return Ok(ctx.inputs.date == date);
        }
        let soil = ctx.inputs.soil.ok_or_else(|| {
            PhaseError::from_source(&self.labels.name, SourceError::MissingInput("soil water"))
        })?;
        Ok(!ctx.is_sowing_day() && soil.exceeds_lower_limit())
    }
}

impl Phase for GerminatingPhase {
    label_accessors!();

    fn kind(&self) -> PhaseKind {
        PhaseKind::Germinating
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
        if self.can_germinate(ctx)? {
            self.germinated = true;
            trace!(phase = %self.labels.name, date = %ctx.inputs.date, "Seed germinated");
            Ok(PhaseStep::proceed(day_fraction))
        } else {
            Ok(PhaseStep::remain())
        }
    }

    fn fraction_complete(&self) -> f64 {
        if self.germinated { 1.0 } else { WAITING_FRACTION }
    }

    fn reset_phase(&mut self) {
        self.germinated = false;
    }

    fn write_summary(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
        match self.germination_date {
            Some(date) => write!(
                out,
                "{}: {} to {}, germination forced on {date}",
                self.labels.name, self.labels.start_stage, self.labels.end_stage
            ),
            None => write!(
                out,
                "{}: {} to {}, germinates when seed-layer water exceeds the lower limit",
                self.labels.name, self.labels.start_stage, self.labels.end_stage
            ),
        }
    }

    fn progress_for_time_step(&self) -> f64 {
        0.0
    }
}
