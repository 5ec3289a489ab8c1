//! Hand-off records and their validating builder.
//!
//! A [`HandOff`] captures one phase invocation: how much of the day it was
//! offered and how much it gave back. [`HandOffBuilder`] refuses fractions
//! outside `[0, 1]` and a phase returning more than it received.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// How a phase invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// The phase is not complete and used the whole offer.
    Remained,
    /// The phase completed and forwarded its unused fraction.
    Completed,
    /// The phase transferred control to another stage.
    Jumped,
}

/// One phase invocation within a simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandOff {
    /// Simulated day number (1 on the first day after sowing).
    pub day: u64,
    /// Calendar date of the day.
    pub date: NaiveDate,
    /// Index of the phase in the chain.
    pub phase_index: usize,
    /// Name of the phase.
    pub phase_name: String,
    /// Fraction of the day offered to the phase.
    pub offered: f64,
    /// Fraction the phase handed back.
    pub unused: f64,
    /// How the invocation ended.
    pub outcome: StepOutcome,
}

impl HandOff {
    /// Fraction of the day the phase consumed.
    pub fn consumed(&self) -> f64 {
        self.offered - self.unused
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for validated [`HandOff`] values.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use phenology_ledger::{HandOffBuilder, StepOutcome};
///
/// let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default();
/// let entry = HandOffBuilder::new(3, date, 2, "Juvenile")
///     .offered(1.0)
///     .unused(0.25)
///     .outcome(StepOutcome::Completed)
///     .build();
///
/// assert!(entry.is_ok());
/// ```
#[derive(Debug)]
pub struct HandOffBuilder {
    day: u64,
    date: NaiveDate,
    phase_index: usize,
    phase_name: String,
    offered: Option<f64>,
    unused: Option<f64>,
    outcome: Option<StepOutcome>,
}

impl HandOffBuilder {
    /// Start building a hand-off for the given day and phase.
    pub fn new(day: u64, date: NaiveDate, phase_index: usize, phase_name: impl Into<String>) -> Self {
        Self {
            day,
            date,
            phase_index,
            phase_name: phase_name.into(),
            offered: None,
            unused: None,
            outcome: None,
        }
    }

    /// Set the fraction offered.
    #[must_use]
    pub const fn offered(mut self, fraction: f64) -> Self {
        self.offered = Some(fraction);
        self
    }

    /// Set the fraction handed back.
    #[must_use]
    pub const fn unused(mut self, fraction: f64) -> Self {
        self.unused = Some(fraction);
        self
    }

    /// Set how the invocation ended.
    #[must_use]
    pub const fn outcome(mut self, outcome: StepOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Validate and produce the [`HandOff`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if a field is missing, a fraction is outside
    /// `[0, 1]`, or the unused fraction exceeds the offer.
    pub fn build(self) -> Result<HandOff, LedgerError> {
        let offered = self.offered.ok_or(LedgerError::MissingField("offered"))?;
        let unused = self.unused.ok_or(LedgerError::MissingField("unused"))?;
        let outcome = self.outcome.ok_or(LedgerError::MissingField("outcome"))?;

        check_fraction("offered", offered)?;
        check_fraction("unused", unused)?;
        if unused > offered {
            return Err(LedgerError::UnusedExceedsOffered { offered, unused });
        }

        Ok(HandOff {
            day: self.day,
            date: self.date,
            phase_index: self.phase_index,
            phase_name: self.phase_name,
            offered,
            unused,
            outcome,
        })
    }
}

fn check_fraction(field: &'static str, value: f64) -> Result<(), LedgerError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LedgerError::InvalidFraction { field, value })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn builds_valid_hand_off() {
        let entry = HandOffBuilder::new(1, date(), 0, "Juvenile")
            .offered(0.5)
            .unused(0.2)
            .outcome(StepOutcome::Completed)
            .build()
            .unwrap();
        assert!((entry.consumed() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn missing_outcome_is_rejected() {
        let err = HandOffBuilder::new(1, date(), 0, "Juvenile")
            .offered(1.0)
            .unused(0.0)
            .build()
            .unwrap_err();
        assert_eq!(err, LedgerError::MissingField("outcome"));
    }

    #[test]
    fn unused_above_offer_is_rejected() {
        let err = HandOffBuilder::new(1, date(), 0, "Juvenile")
            .offered(0.3)
            .unused(0.4)
            .outcome(StepOutcome::Completed)
            .build()
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnusedExceedsOffered { .. }));
    }

    #[test]
    fn out_of_range_fraction_is_rejected() {
        let err = HandOffBuilder::new(1, date(), 0, "Juvenile")
            .offered(1.2)
            .unused(0.0)
            .outcome(StepOutcome::Remained)
            .build()
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidFraction { field: "offered", .. }));
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&StepOutcome::Jumped).unwrap();
        assert_eq!(json, "\"jumped\"");
    }
}
