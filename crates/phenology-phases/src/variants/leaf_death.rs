//! Senescence: completes once enough main-stem leaves have died.

use phenology_types::PhaseKind;

use super::{PhaseLabels, check_offer, label_accessors};
use crate::context::PhaseContext;
use crate::error::{PhaseError, SourceError};
use crate::phase::Phase;
use crate::sources::{ProgressSource, ThermalTime, non_negative, unit_interval};
use crate::step::PhaseStep;

/// Nominal leftover returned on completion. Thermal time is not what limits
/// this phase, so no leftover is computed from it.
pub const LEAF_DEATH_LEFTOVER: f64 = 0.00001;

/// Completes when dead leaves reach `dead_leaf_fraction * final_leaf_number`.
#[derive(Debug)]
pub struct LeafDeathPhase {
    labels: PhaseLabels,
    dead_leaf_fraction: f64,
    dead_at_start: Option<f64>,
    dead_now: f64,
    threshold: Option<f64>,
    thermal_time: f64,
    last_increment: f64,
}

impl LeafDeathPhase {
    /// Create a leaf-death phase that completes once every leaf is dead.
    pub const fn new(labels: PhaseLabels) -> Self {
        Self {
            labels,
            dead_leaf_fraction: 1.0,
            dead_at_start: None,
            dead_now: 0.0,
            threshold: None,
            thermal_time: 0.0,
            last_increment: 0.0,
        }
    }

    /// Complete once this share of the final leaf number has died.
    #[must_use]
    pub const fn with_dead_leaf_fraction(mut self, fraction: f64) -> Self {
        self.dead_leaf_fraction = fraction;
        self
    }

    fn source_error(&self, e: SourceError) -> PhaseError {
        PhaseError::from_source(&self.labels.name, e)
    }
}

impl Phase for LeafDeathPhase {
    label_accessors!();

    fn kind(&self) -> PhaseKind {
        PhaseKind::LeafDeath
    }

    fn do_time_step(
        &mut self,
        ctx: &PhaseContext<'_>,
        day_fraction: f64,
    ) -> Result<PhaseStep, PhaseError> {
        check_offer(&self.labels.name, day_fraction)?;
        let canopy = ctx
            .inputs
            .canopy
            .ok_or_else(|| self.source_error(SourceError::MissingInput("canopy")))?;
        let share = unit_interval("dead leaf fraction", self.dead_leaf_fraction)
            .map_err(|e| self.source_error(e))?;
        let dead = non_negative("dead leaf number", canopy.dead_leaf_number)
            .map_err(|e| self.source_error(e))?;
        let fln = non_negative("final leaf number", canopy.final_leaf_number)
            .map_err(|e| self.source_error(e))?;
        let tt = ThermalTime
            .daily_rate(ctx)
            .map_err(|e| self.source_error(e))?;

        self.dead_at_start.get_or_insert(dead);
        self.dead_now = dead;
        let threshold = fln * share;
        self.threshold = Some(threshold);
        self.last_increment = tt * day_fraction;
        self.thermal_time += self.last_increment;

        if dead >= threshold {
            Ok(PhaseStep::proceed(LEAF_DEATH_LEFTOVER.min(day_fraction)))
        } else {
            Ok(PhaseStep::remain())
        }
    }

    fn fraction_complete(&self) -> f64 {
        match (self.dead_at_start, self.threshold) {
            (Some(start), Some(threshold)) => {
                let span = threshold - start;
                if span <= 0.0 {
                    1.0
                } else {
                    ((self.dead_now - start) / span).clamp(0.0, 1.0)
                }
            }
            _ => 0.0,
        }
    }

    fn reset_phase(&mut self) {
        self.dead_at_start = None;
        self.dead_now = 0.0;
        self.threshold = None;
        self.thermal_time = 0.0;
        self.last_increment = 0.0;
    }

    fn write_summary(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
        write!(
            out,
            "{}: {} to {}, ends when {:.0}% of final leaf number is dead",
            self.labels.name,
            self.labels.start_stage,
            self.labels.end_stage,
            self.dead_leaf_fraction * 100.0
        )
    }

    fn progress_for_time_step(&self) -> f64 {
        self.last_increment
    }

    fn progress(&self) -> f64 {
        self.thermal_time
    }
}
