//! Day-fraction ledger for the crop phenology engine.
//!
//! Every time the sequencer offers a phase part of a simulated day, the
//! offer is recorded here together with the part the phase handed back.
//! A day is never created from nothing and never lost: the parts consumed by
//! every phase visited on one day add up to exactly one day. The law is
//! checked at the end of every simulated day.
//!
//! # Architecture
//!
//! - [`entry`] -- [`HandOff`] records and the [`HandOffBuilder`] that validates them.
//! - [`ledger`] -- The [`DayLedger`]: append-only log with recording and query methods.
//! - [`conservation`] -- Day conservation verification and anomaly detection.
//!
//! # Conservation Law
//!
//! For every simulated day D:
//!
//! ```text
//! sum(offered - unused for every hand-off in D) == 1.0   (within tolerance)
//! ```
//!
//! A violation produces a [`DayAnomaly`]. The ledger never panics; it
//! returns errors and anomaly values.
//!
//! # Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use phenology_ledger::{ConservationResult, DayLedger, HandOffBuilder, StepOutcome};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default();
//! let mut ledger = DayLedger::new();
//!
//! // Phase 0 finishes with 40% of the day left; phase 1 uses the rest.
//! let first = HandOffBuilder::new(1, date, 0, "Vegetative")
//!     .offered(1.0)
//!     .unused(0.4)
//!     .outcome(StepOutcome::Completed)
//!     .build();
//! let second = HandOffBuilder::new(1, date, 1, "Reproductive")
//!     .offered(0.4)
//!     .unused(0.0)
//!     .outcome(StepOutcome::Remained)
//!     .build();
//! if let (Ok(a), Ok(b)) = (first, second) {
//!     ledger.append(a);
//!     ledger.append(b);
//! }
//!
//! assert_eq!(ledger.verify_day(1, 1e-9), ConservationResult::Balanced);
//! ```

pub mod conservation;
pub mod entry;
pub mod ledger;

// Re-export primary types at crate root.
pub use conservation::{ConservationResult, DEFAULT_TOLERANCE};
pub use entry::{HandOff, HandOffBuilder, StepOutcome};
pub use ledger::DayLedger;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording hand-offs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A fraction was outside `[0, 1]` or not finite.
    #[error("{field} must be a day fraction in [0, 1], got {value}")]
    InvalidFraction {
        /// Which field held the bad value.
        field: &'static str,
        /// The value received.
        value: f64,
    },

    /// A phase handed back more of the day than it was offered.
    #[error("unused fraction {unused} exceeds offered fraction {offered}")]
    UnusedExceedsOffered {
        /// Fraction offered to the phase.
        offered: f64,
        /// Fraction the phase reported unused.
        unused: f64,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A day conservation violation detected during end-of-day verification.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DayAnomaly {
    /// The simulated day where the anomaly was detected.
    pub day: u64,
    /// Total fraction consumed across every hand-off of the day.
    pub consumed: f64,
    /// The fraction that should have been consumed (one whole day).
    pub expected: f64,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for DayAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
