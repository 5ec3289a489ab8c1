//! Helpers for building phase contexts in unit tests.

#![allow(clippy::unwrap_used)]

use chrono::{Days, NaiveDate};
use phenology_types::DailyInputs;

use crate::context::{PhaseContext, PhaseLayout, StageBounds, StagePosition};

/// `n` days after 1 May 2024. Day 0 is the default sowing date.
pub fn date(n: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .checked_add_days(Days::new(n))
        .unwrap()
}

fn bounds(name: &str, start: &str, end: &str) -> StageBounds {
    StageBounds {
        name: name.to_owned(),
        start: start.to_owned(),
        end: end.to_owned(),
    }
}

/// Owns the inputs and layout a [`PhaseContext`] borrows.
pub struct Harness {
    pub inputs: DailyInputs,
    pub layout: PhaseLayout,
    pub sowing: NaiveDate,
    pub index: usize,
}

impl Harness {
    pub fn new(inputs: DailyInputs) -> Self {
        Self {
            inputs,
            layout: PhaseLayout::from_bounds(vec![
                bounds("Germinating", "Sowing", "Germination"),
                bounds("Emerging", "Germination", "Emergence"),
                bounds("Juvenile", "Emergence", "TerminalSpikelet"),
                bounds("Reproductive", "TerminalSpikelet", "Flowering"),
                bounds("Ripening", "Flowering", "Maturity"),
            ]),
            sowing: date(0),
            index: 0,
        }
    }

    pub const fn at_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn ctx(&self) -> PhaseContext<'_> {
        PhaseContext::new(
            &self.inputs,
            self.sowing,
            StagePosition::new(&self.layout, self.index),
        )
    }
}
