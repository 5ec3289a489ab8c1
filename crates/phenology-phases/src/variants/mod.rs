//! Concrete phase variants.
//!
//! | Variant | Completion rule |
//! |---------|-----------------|
//! | [`GenericPhase`] | injected rate accumulates towards an injected target |
//! | [`EmergingPhase`] | thermal time towards a sowing-depth target, or a fixed date |
//! | [`GerminatingPhase`] | soil water above the lower limit after the sowing day |
//! | [`LeafNumberPhase`] | leaf appearance towards a provisional leaf target, monotone |
//! | [`LeafDeathPhase`] | dead leaves reach a share of final leaf number |
//! | [`VernalisationPhase`] | the vernalisation model reports saturation |
//! | [`PhotoperiodPhase`] | day length crosses a threshold |
//! | [`GotoPhase`] | jumps to the phase opening a named stage |
//! | [`EndPhase`] | never completes |

mod emerging;
mod end;
mod generic;
mod germinating;
mod goto;
mod leaf_death;
mod leaf_number;
mod photoperiod;
mod vernalisation;

pub use emerging::EmergingPhase;
pub use end::EndPhase;
pub use generic::GenericPhase;
pub use germinating::GerminatingPhase;
pub use goto::GotoPhase;
pub use leaf_death::{LEAF_DEATH_LEFTOVER, LeafDeathPhase};
pub use leaf_number::{LeafNumberPhase, LeafTarget};
pub use photoperiod::PhotoperiodPhase;
pub use vernalisation::VernalisationPhase;

use crate::error::PhaseError;

/// Name and bounding stages shared by every variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseLabels {
    /// Phase name.
    pub name: String,
    /// Stage opening the phase.
    pub start_stage: String,
    /// Stage closing the phase.
    pub end_stage: String,
}

impl PhaseLabels {
    /// Build labels from anything string-like.
    pub fn new(
        name: impl Into<String>,
        start_stage: impl Into<String>,
        end_stage: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            start_stage: start_stage.into(),
            end_stage: end_stage.into(),
        }
    }
}

/// Reject offers outside `[0, 1]`.
pub(crate) fn check_offer(phase: &str, day_fraction: f64) -> Result<(), PhaseError> {
    if day_fraction.is_finite() && (0.0..=1.0).contains(&day_fraction) {
        Ok(())
    } else {
        Err(PhaseError::InvalidDayFraction {
            phase: phase.to_owned(),
            fraction: day_fraction,
        })
    }
}

/// Implements the label accessors of [`Phase`](crate::Phase) for a type with
/// a `labels: PhaseLabels` field.
macro_rules! label_accessors {
    () => {
        fn name(&self) -> &str {
            &self.labels.name
        }

        fn start_stage(&self) -> &str {
            &self.labels.start_stage
        }

        fn end_stage(&self) -> &str {
            &self.labels.end_stage
        }
    };
}

pub(crate) use label_accessors;
