//! Day conservation verification.
//!
//! For each simulated day D the check is:
//!
//! ```text
//! sum(offered - unused for every hand-off in D) == 1.0
//! ```
//!
//! The strict form also checks the hand-off chain itself: the first phase of
//! the day is offered the whole day, and every later phase is offered
//! exactly what its predecessor handed back.

use crate::DayAnomaly;
use crate::entry::HandOff;

/// Default tolerance for floating-point comparisons of day fractions.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// The result of a conservation check for a single day.
#[derive(Debug, Clone, PartialEq)]
pub enum ConservationResult {
    /// Exactly one day was consumed.
    Balanced,
    /// The day's hand-offs do not add up.
    Anomaly(DayAnomaly),
}

impl ConservationResult {
    /// Whether the day balanced.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Verify that the hand-offs recorded for `day` consume exactly one day.
pub fn verify_day_conservation(day: u64, entries: &[HandOff], tolerance: f64) -> ConservationResult {
    let consumed: f64 = entries
        .iter()
        .filter(|e| e.day == day)
        .map(HandOff::consumed)
        .sum();

    if (consumed - 1.0).abs() <= tolerance {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(DayAnomaly {
            day,
            consumed,
            expected: 1.0,
            message: format!(
                "DAY_ANOMALY on day {day}: phases consumed {consumed:.9} of 1 day",
            ),
        })
    }
}

/// Verify conservation and the continuity of the hand-off chain.
///
/// Runs [`verify_day_conservation`] first, then checks that the first
/// hand-off of the day was offered 1.0 and that every subsequent offer
/// equals the previous hand-off's unused fraction.
pub fn verify_day_conservation_strict(
    day: u64,
    entries: &[HandOff],
    tolerance: f64,
) -> ConservationResult {
    let result = verify_day_conservation(day, entries, tolerance);
    if let ConservationResult::Anomaly(_) = &result {
        return result;
    }

    let mut expected_offer = 1.0;
    for (position, entry) in entries.iter().filter(|e| e.day == day).enumerate() {
        if (entry.offered - expected_offer).abs() > tolerance {
            return ConservationResult::Anomaly(DayAnomaly {
                day,
                consumed: 1.0,
                expected: 1.0,
                message: format!(
                    "DAY_ANOMALY on day {day}: hand-off {position} to `{}` offered {:.9}, expected {expected_offer:.9}",
                    entry.phase_name, entry.offered,
                ),
            });
        }
        expected_offer = entry.unused;
    }

    ConservationResult::Balanced
}
