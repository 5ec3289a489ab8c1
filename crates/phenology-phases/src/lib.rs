//! Developmental phases for the crop phenology engine.
//!
//! A phase is one discrete developmental stage bounded by two named stages.
//! Each simulated day the sequencer offers the active phase a fraction of the
//! day; the phase consumes some or all of it and reports whether it finished
//! and how much of the offer is left for the next phase. This hand-off is
//! what lets several stage boundaries be crossed on one day without losing
//! or double-counting development.
//!
//! # Modules
//!
//! - [`phase`] -- The [`Phase`] trait every variant implements
//! - [`step`] -- [`PhaseStep`] and [`Transition`] returned from each step
//! - [`context`] -- Read-only day inputs and chain position handed to phases
//! - [`accumulate`] -- Target accumulation with exact overshoot carry-over
//! - [`sources`] -- Injected progress-rate and target sources
//! - [`variants`] -- Concrete phases (generic, emerging, germinating, ...)
//! - [`error`] -- Phase and source errors

pub mod accumulate;
pub mod context;
pub mod error;
pub mod phase;
pub mod sources;
pub mod step;
pub mod variants;

#[cfg(test)]
mod test_support;

pub use accumulate::Accumulator;
pub use context::{PhaseContext, PhaseLayout, StageBounds, StagePosition};
pub use error::{PhaseError, SourceError};
pub use phase::Phase;
pub use sources::{
    ConstantRate, FixedTarget, LeafAppearanceRate, ProgressSource, SowingDepthTarget,
    StressedThermalTime, TargetSource, ThermalTime,
};
pub use step::{PhaseStep, Transition};
pub use variants::{
    EmergingPhase, EndPhase, GenericPhase, GerminatingPhase, GotoPhase, LEAF_DEATH_LEFTOVER,
    LeafDeathPhase, LeafNumberPhase, LeafTarget, PhaseLabels, PhotoperiodPhase,
    VernalisationPhase,
};
