//! The day ledger: an append-only log of every day-fraction hand-off.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified; [`DayLedger::prune_before`]
//!   and [`DayLedger::clear`] drop whole days only.
//! - **Validated**: entries built through [`HandOffBuilder`] never hold a
//!   fraction outside `[0, 1]` or hand back more than was offered.
//! - **Conservation**: consumed fractions add up to one per day.

use chrono::NaiveDate;

use crate::LedgerError;
use crate::conservation::{ConservationResult, verify_day_conservation, verify_day_conservation_strict};
use crate::entry::{HandOff, HandOffBuilder, StepOutcome};

/// Log of every phase invocation, grouped by simulated day.
#[derive(Debug, Default, Clone)]
pub struct DayLedger {
    /// All entries, in insertion order.
    entries: Vec<HandOff>,
}

impl DayLedger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a pre-built [`HandOff`].
    pub fn append(&mut self, entry: HandOff) {
        self.entries.push(entry);
    }

    /// Build, validate and append one hand-off.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record(
        &mut self,
        day: u64,
        date: NaiveDate,
        phase: (usize, &str),
        offered: f64,
        unused: f64,
        outcome: StepOutcome,
    ) -> Result<&HandOff, LedgerError> {
        let (phase_index, phase_name) = phase;
        let entry = HandOffBuilder::new(day, date, phase_index, phase_name)
            .offered(offered)
            .unused(unused)
            .outcome(outcome)
            .build()?;
        self.entries.push(entry);
        self.entries
            .last()
            .ok_or(LedgerError::MissingField("entry after append"))
    }

    /// Every entry, in insertion order.
    pub fn entries(&self) -> &[HandOff] {
        &self.entries
    }

    /// Entries recorded for `day`.
    pub fn entries_for_day(&self, day: u64) -> impl Iterator<Item = &HandOff> {
        self.entries.iter().filter(move |e| e.day == day)
    }

    /// Total fraction consumed on `day`.
    pub fn consumed_on(&self, day: u64) -> f64 {
        self.entries_for_day(day).map(HandOff::consumed).sum()
    }

    /// Number of phase transitions (completions and jumps) on `day`.
    pub fn transitions_on(&self, day: u64) -> usize {
        self.entries_for_day(day)
            .filter(|e| e.outcome != StepOutcome::Remained)
            .count()
    }

    /// Check that `day` consumed exactly one day.
    pub fn verify_day(&self, day: u64, tolerance: f64) -> ConservationResult {
        verify_day_conservation(day, &self.entries, tolerance)
    }

    /// Check conservation and hand-off continuity for `day`.
    pub fn verify_day_strict(&self, day: u64, tolerance: f64) -> ConservationResult {
        verify_day_conservation_strict(day, &self.entries, tolerance)
    }

    /// Drop every entry recorded before `day`.
    pub fn prune_before(&mut self, day: u64) {
        self.entries.retain(|e| e.day >= day);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
