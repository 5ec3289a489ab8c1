//! Error types for the phase sequencer.

use phenology_ledger::LedgerError;
use phenology_phases::PhaseError;

/// Errors that can occur while building or driving a [`Sequencer`].
///
/// All of these are fatal for the plant instance: continuing with an
/// inconsistent phenological state is unsafe, so the current day is
/// abandoned and the error propagates to the caller.
///
/// [`Sequencer`]: crate::sequencer::Sequencer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SequencerError {
    /// The phase chain has no phases.
    #[error("phase chain is empty")]
    EmptyChain,

    /// Two phases share a name.
    #[error("phase name `{name}` is used more than once")]
    DuplicatePhase {
        /// The repeated name.
        name: String,
    },

    /// A stage name does not bound any phase in the chain.
    #[error("unknown stage `{stage}`")]
    UnknownStage {
        /// The stage name that could not be resolved.
        stage: String,
    },

    /// `between` was asked about a range whose start follows its end.
    #[error("stage `{start}` comes after stage `{end}`")]
    ReversedRange {
        /// Start stage of the range.
        start: String,
        /// End stage of the range.
        end: String,
    },

    /// The per-day transition bound is zero.
    #[error("max_transitions_per_day must be at least 1")]
    InvalidTransitionBound,

    /// The crop has not been sown.
    #[error("crop has not been sown")]
    NotSown,

    /// Daily thermal time was negative or not finite.
    #[error("daily thermal time must be a non-negative number, got {value}")]
    InvalidThermalTime {
        /// The value received.
        value: f64,
    },

    /// A stage number outside `[1, phases + 1]` was requested.
    #[error("stage {stage} is outside [1, {max}]")]
    InvalidStage {
        /// The requested stage number.
        stage: f64,
        /// The largest valid stage number.
        max: f64,
    },

    /// The last phase completed and there is nothing to advance to.
    #[error("phase `{phase}` completed but there are no more phases")]
    NoMorePhases {
        /// The phase that completed.
        phase: String,
    },

    /// One day crossed more phase boundaries than allowed, which means a
    /// zero-duration cycle in the chain.
    #[error("day {day} exceeded {limit} phase transitions; check the chain for zero-duration cycles")]
    TransitionBoundExceeded {
        /// The simulated day.
        day: u64,
        /// The configured bound.
        limit: usize,
    },

    /// The day counter overflowed.
    #[error("day counter overflow")]
    DayOverflow,

    /// A phase failed while stepping.
    #[error("phase error: {source}")]
    Phase {
        /// The underlying phase error.
        #[from]
        source: PhaseError,
    },

    /// A hand-off could not be recorded.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },
}
