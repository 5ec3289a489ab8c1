//! Vernalisation, delegated to the gene-expression model.

use phenology_types::PhaseKind;

use super::{PhaseLabels, check_offer, label_accessors};
use crate::context::PhaseContext;
use crate::error::{PhaseError, SourceError};
use crate::phase::Phase;
use crate::sources::{ProgressSource, ThermalTime, non_negative};
use crate::step::PhaseStep;

/// Default Haun stage before which vernalisation cannot be reported complete.
pub const DEFAULT_MIN_HAUN_STAGE: f64 = 1.1;

/// Completes when the vernalisation model says the plant is vernalised.
///
/// Completion is reported as the lesser of two indicators so that neither a
/// fast cold response nor a long duration alone suggests the phase is done:
/// Haun stage against a minimum, and methylated Vrn1 against saturation.
#[derive(Debug)]
pub struct VernalisationPhase {
    labels: PhaseLabels,
    min_haun_stage: f64,
    minimum_stage: Option<String>,
    fraction: f64,
    thermal_time: f64,
    last_increment: f64,
}

impl VernalisationPhase {
    /// Create a vernalisation phase.
    pub const fn new(labels: PhaseLabels) -> Self {
        Self {
            labels,
            min_haun_stage: DEFAULT_MIN_HAUN_STAGE,
            minimum_stage: None,
            fraction: 0.0,
            thermal_time: 0.0,
            last_increment: 0.0,
        }
    }

    /// Override the minimum Haun stage indicator.
    #[must_use]
    pub const fn with_min_haun_stage(mut self, haun_stage: f64) -> Self {
        self.min_haun_stage = haun_stage;
        self
    }

    /// Refuse to complete until the plant has reached `stage`.
    #[must_use]
    pub fn with_minimum_stage(mut self, stage: impl Into<String>) -> Self {
        self.minimum_stage = Some(stage.into());
        self
    }

    /// The stage guard, if any.
    pub fn minimum_stage(&self) -> Option<&str> {
        self.minimum_stage.as_deref()
    }

    fn indicator(value: f64, of: f64) -> f64 {
        if of <= 0.0 {
            1.0
        } else {
            (value / of).clamp(0.0, 1.0)
        }
    }
}

impl Phase for VernalisationPhase {
    label_accessors!();

    fn kind(&self) -> PhaseKind {
        PhaseKind::Vernalisation
    }

    fn do_time_step(
        &mut self,
        ctx: &PhaseContext<'_>,
        day_fraction: f64,
    ) -> Result<PhaseStep, PhaseError> {
        check_offer(&self.labels.name, day_fraction)?;
        let name = &self.labels.name;
        let vrn = ctx.inputs.vernalisation.ok_or_else(|| {
            PhaseError::from_source(name, SourceError::MissingInput("vernalisation"))
        })?;
        let haun = non_negative("haun stage", vrn.haun_stage)
            .map_err(|e| PhaseError::from_source(name, e))?;
        let vrn1 = non_negative("methylated vrn1", vrn.methylated_vrn1)
            .map_err(|e| PhaseError::from_source(name, e))?;
        let min_haun = non_negative("minimum haun stage", self.min_haun_stage)
            .map_err(|e| PhaseError::from_source(name, e))?;
        let tt = ThermalTime
            .daily_rate(ctx)
            .map_err(|e| PhaseError::from_source(name, e))?;

        let stage_reached = match &self.minimum_stage {
            Some(stage) => ctx.stages.is_after_stage(stage).ok_or_else(|| {
                PhaseError::UnknownStage {
                    phase: name.clone(),
                    stage: stage.clone(),
                }
            })?,
            None => true,
        };

        self.fraction = Self::indicator(haun, min_haun)
            .min(Self::indicator(vrn1, vrn.saturation_target));
        self.last_increment = tt * day_fraction;
        self.thermal_time += self.last_increment;

        if vrn.is_vernalised && stage_reached {
            self.fraction = 1.0;
            Ok(PhaseStep::proceed(day_fraction))
        } else {
            Ok(PhaseStep::remain())
        }
    }

    fn fraction_complete(&self) -> f64 {
        self.fraction
    }

    fn reset_phase(&mut self) {
        self.fraction = 0.0;
        self.thermal_time = 0.0;
        self.last_increment = 0.0;
    }

    fn write_summary(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
        write!(
            out,
            "{}: {} to {}, ends when the vernalisation model saturates (minimum Haun stage {:.1})",
            self.labels.name, self.labels.start_stage, self.labels.end_stage, self.min_haun_stage
        )
    }

    fn progress_for_time_step(&self) -> f64 {
        self.last_increment
    }

    fn progress(&self) -> f64 {
        self.thermal_time
    }
}
