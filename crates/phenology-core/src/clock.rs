//! Simulation clock for a single planting.
//!
//! Day 1 is the sowing date. The day counter is the source of truth; the
//! calendar date is always derived from it, never stored independently.

use chrono::{Days, NaiveDate};

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Day counter would overflow.
    #[error("day counter overflow: cannot advance beyond u64::MAX")]
    DayOverflow,

    /// The derived calendar date is outside chrono's supported range.
    #[error("date out of range: {days} days after {start}")]
    DateOutOfRange {
        /// The first simulated date.
        start: NaiveDate,
        /// Days past the first simulated date.
        days: u64,
    },
}

/// Clock counting simulated days from sowing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationClock {
    /// Date of day 1.
    start: NaiveDate,
    /// Number of days simulated so far (0 before the first day).
    day: u64,
}

impl SimulationClock {
    /// Create a clock whose first day is `sowing_date`.
    pub const fn new(sowing_date: NaiveDate) -> Self {
        Self {
            start: sowing_date,
            day: 0,
        }
    }

    /// Advance to the next day. Returns its number and date.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the counter or date would overflow.
    pub fn advance(&mut self) -> Result<(u64, NaiveDate), ClockError> {
        let next = self.day.checked_add(1).ok_or(ClockError::DayOverflow)?;
        let date = self.date_of(next)?;
        self.day = next;
        Ok((next, date))
    }

    /// Number of days simulated so far.
    pub const fn day(&self) -> u64 {
        self.day
    }

    /// The sowing date (day 1).
    pub const fn sowing_date(&self) -> NaiveDate {
        self.start
    }

    /// Date of the most recent simulated day, or `None` before the first.
    pub fn current_date(&self) -> Option<NaiveDate> {
        if self.day == 0 {
            None
        } else {
            self.date_of(self.day).ok()
        }
    }

    /// Whole days elapsed since sowing on the most recent simulated day.
    pub const fn days_after_sowing(&self) -> u64 {
        self.day.saturating_sub(1)
    }

    /// Calendar date of day `day` (1-based).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::DateOutOfRange`] if the date cannot be represented.
    pub fn date_of(&self, day: u64) -> Result<NaiveDate, ClockError> {
        let offset = day.saturating_sub(1);
        self.start
            .checked_add_days(Days::new(offset))
            .ok_or(ClockError::DateOutOfRange {
                start: self.start,
                days: offset,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sowing() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn first_day_is_sowing_date() {
        let mut clock = SimulationClock::new(sowing());
        assert!(clock.current_date().is_none());
        let (day, date) = clock.advance().unwrap();
        assert_eq!(day, 1);
        assert_eq!(date, sowing());
        assert_eq!(clock.days_after_sowing(), 0);
    }

    #[test]
    fn dates_follow_day_counter() {
        let mut clock = SimulationClock::new(sowing());
        for _ in 0..31 {
            clock.advance().unwrap();
        }
        assert_eq!(clock.day(), 31);
        assert_eq!(
            clock.current_date(),
            NaiveDate::from_ymd_opt(2024, 5, 31)
        );
        assert_eq!(clock.days_after_sowing(), 30);
    }

    #[test]
    fn date_overflow_is_an_error() {
        let mut clock = SimulationClock::new(NaiveDate::MAX);
        clock.advance().unwrap();
        assert!(matches!(
            clock.advance(),
            Err(ClockError::DateOutOfRange { .. })
        ));
    }
}
