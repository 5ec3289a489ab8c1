//! The phase contract shared by every developmental phase.

use phenology_types::PhaseKind;

use crate::context::PhaseContext;
use crate::error::PhaseError;
use crate::step::PhaseStep;

/// One developmental phase bounded by a start and an end stage.
///
/// Variants differ only in how they decide completion. The sequencer drives
/// them through this trait and never inspects concrete types, except through
/// [`kind`](Phase::kind) and the target accessors used when stages are set
/// externally.
///
/// A phase is stepped at most once per sequencer hand-off and must fully
/// return before it is stepped again. Implementations are `Send` so an
/// entire plant can be moved onto a worker thread.
pub trait Phase: core::fmt::Debug + Send {
    /// The phase name, unique within a chain.
    fn name(&self) -> &str;

    /// Stage label at which this phase begins.
    fn start_stage(&self) -> &str;

    /// Stage label at which this phase ends.
    fn end_stage(&self) -> &str;

    /// The completion rule this phase uses.
    fn kind(&self) -> PhaseKind;

    /// Whether the plant is above ground while in this phase.
    fn is_emerged(&self) -> bool {
        true
    }

    /// Consume up to `day_fraction` of today.
    ///
    /// Returns the transition to perform and the fraction of the offer left
    /// unused. The unused fraction is 0 when the phase used the whole offer
    /// without completing.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError`] when a required collaborator snapshot is
    /// missing or an input is structurally invalid.
    fn do_time_step(
        &mut self,
        ctx: &PhaseContext<'_>,
        day_fraction: f64,
    ) -> Result<PhaseStep, PhaseError>;

    /// Progress through the phase in `[0, 1]`.
    fn fraction_complete(&self) -> f64;

    /// Zero all accumulators and forget anything captured on entry.
    fn reset_phase(&mut self);

    /// Write a one-line, human-readable account of the phase.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying writer.
    fn write_summary(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result;

    /// Increment applied on the most recent step, in the phase's own units.
    fn progress_for_time_step(&self) -> f64;

    /// Accumulated progress in the phase's own units.
    fn progress(&self) -> f64 {
        0.0
    }

    /// Current target in the phase's own units, for target-based phases.
    fn target(&self) -> Option<f64> {
        None
    }

    /// Overwrite accumulated progress. Used when stages are set externally.
    fn set_progress(&mut self, _progress: f64) {}

    /// Stage this phase transfers control to, for phases that jump.
    fn jump_target(&self) -> Option<&str> {
        None
    }
}
