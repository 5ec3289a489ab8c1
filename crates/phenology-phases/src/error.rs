//! Error types for the `phenology-phases` crate.
//!
//! Phase-local numeric edge cases (a zero target, a zero rate) are absorbed
//! inside the phases and never surface here. Everything in this module is
//! structural: a collaborator snapshot the phase needs is absent, or an
//! input is nonsensical.

/// Errors raised by a progress or target source while sampling today's value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// A collaborator snapshot required by the source is not attached.
    #[error("required input `{0}` is not available")]
    MissingInput(&'static str),

    /// A value that must be non-negative was negative.
    #[error("{what} must not be negative, got {value}")]
    Negative {
        /// Name of the offending quantity.
        what: &'static str,
        /// The value received.
        value: f64,
    },

    /// A value fell outside its permitted range.
    #[error("{what} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        /// Name of the offending quantity.
        what: &'static str,
        /// The value received.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A value was not a finite number.
    #[error("{what} must be finite, got {value}")]
    NotFinite {
        /// Name of the offending quantity.
        what: &'static str,
        /// The value received.
        value: f64,
    },
}

/// Errors that can occur while a phase processes a time step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhaseError {
    /// Sampling a rate, target, or collaborator snapshot failed.
    #[error("phase `{phase}`: {source}")]
    Source {
        /// Name of the phase that was stepping.
        phase: String,
        /// The underlying source error.
        #[source]
        source: SourceError,
    },

    /// A stage name referenced by the phase is not part of the phase chain.
    #[error("phase `{phase}` references unknown stage `{stage}`")]
    UnknownStage {
        /// Name of the phase holding the reference.
        phase: String,
        /// The stage name that could not be resolved.
        stage: String,
    },

    /// The offered day fraction was outside `[0, 1]`.
    #[error("phase `{phase}` was offered an invalid day fraction {fraction}")]
    InvalidDayFraction {
        /// Name of the phase being stepped.
        phase: String,
        /// The offending fraction.
        fraction: f64,
    },
}

impl PhaseError {
    /// Attach the phase name to a [`SourceError`].
    pub fn from_source(phase: &str, source: SourceError) -> Self {
        Self::Source {
            phase: phase.to_owned(),
            source,
        }
    }
}
