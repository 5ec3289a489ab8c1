//! Leaf-number phases with a provisional target.
//!
//! The final leaf number is only an estimate early in the phase and may rise
//! later. Recomputing completion from scratch would then make the phase look
//! as if it had moved backwards, so completion is held at its high-water
//! mark: `fraction_complete(t) >= fraction_complete(t - 1)`.

use phenology_types::PhaseKind;

use super::{PhaseLabels, check_offer, label_accessors};
use crate::accumulate::Accumulator;
use crate::context::PhaseContext;
use crate::error::{PhaseError, SourceError};
use crate::phase::Phase;
use crate::sources::{LeafAppearanceRate, ProgressSource, non_negative};
use crate::step::PhaseStep;

/// How the leaf target is expressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafTarget {
    /// Complete when this many leaves remain to appear before the final
    /// leaf. The target is `final_leaf_number - remaining - leaves_at_start`.
    RemainingLeaves(f64),
    /// Complete at an absolute leaf-tip count. The target is
    /// `tips - leaves_at_start`.
    TipNumber(f64),
}

/// Accumulates leaf appearance towards a leaf-count target.
#[derive(Debug)]
pub struct LeafNumberPhase {
    labels: PhaseLabels,
    leaf_target: LeafTarget,
    acc: Accumulator,
    leaves_at_start: Option<f64>,
    high_water: f64,
}

impl LeafNumberPhase {
    /// Create a leaf-number phase.
    pub const fn new(labels: PhaseLabels, leaf_target: LeafTarget) -> Self {
        Self {
            labels,
            leaf_target,
            acc: Accumulator::new(),
            leaves_at_start: None,
            high_water: 0.0,
        }
    }

    /// Leaf tips present when the phase was entered, once known.
    pub const fn leaves_at_start(&self) -> Option<f64> {
        self.leaves_at_start
    }

    fn source_error(&self, e: SourceError) -> PhaseError {
        PhaseError::from_source(&self.labels.name, e)
    }
}

impl Phase for LeafNumberPhase {
    label_accessors!();

    fn kind(&self) -> PhaseKind {
        match self.leaf_target {
            LeafTarget::RemainingLeaves(_) => PhaseKind::LeafAppearance,
            LeafTarget::TipNumber(_) => PhaseKind::NodeNumber,
        }
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
        let tips = non_negative("leaf tip number", canopy.leaf_tip_number)
            .map_err(|e| self.source_error(e))?;
        let start = *self.leaves_at_start.get_or_insert(tips);

        let target = match self.leaf_target {
            LeafTarget::RemainingLeaves(remaining) => {
                let remaining = non_negative("remaining leaves", remaining)
                    .map_err(|e| self.source_error(e))?;
                let fln = non_negative("final leaf number", canopy.final_leaf_number)
                    .map_err(|e| self.source_error(e))?;
                fln - remaining - start
            }
            LeafTarget::TipNumber(n) => {
                non_negative("target leaf tip number", n).map_err(|e| self.source_error(e))? - start
            }
        };
        // Tips already past the leaf target means the canopy and the chain disagree.
        let target = non_negative("leaf target", target).map_err(|e| self.source_error(e))?;

        let rate = LeafAppearanceRate
            .daily_rate(ctx)
            .map_err(|e| self.source_error(e))?;
        let step = self.acc.step(rate, target, day_fraction);
        self.high_water = self.high_water.max(self.acc.fraction_of(target));
        Ok(step)
    }

    fn fraction_complete(&self) -> f64 {
        self.high_water
    }

    fn reset_phase(&mut self) {
        self.acc.reset();
        self.leaves_at_start = None;
        self.high_water = 0.0;
    }

    fn write_summary(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
        let rule = match self.leaf_target {
            LeafTarget::RemainingLeaves(r) => format!("{r:.1} leaves before the final leaf"),
            LeafTarget::TipNumber(n) => format!("leaf tip {n:.1}"),
        };
        write!(
            out,
            "{}: {} to {}, ends at {rule}, {:.2} leaves appeared",
            self.labels.name,
            self.labels.start_stage,
            self.labels.end_stage,
            self.acc.progress()
        )
    }

    fn progress_for_time_step(&self) -> f64 {
        self.acc.last_increment()
    }

    fn progress(&self) -> f64 {
        self.acc.progress()
    }

    fn target(&self) -> Option<f64> {
        self.acc.last_target()
    }

    fn set_progress(&mut self, progress: f64) {
        self.acc.set_progress(progress);
        if let Some(target) = self.acc.last_target() {
            self.high_water = self.acc.fraction_of(target);
        }
    }
}
