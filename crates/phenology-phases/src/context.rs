//! Read-only view of the day and of the phase chain handed to each phase.
//!
//! A phase never holds a reference to the sequencer or to its siblings.
//! Instead, every call to [`Phase::do_time_step`] receives a
//! [`PhaseContext`]: today's collaborator snapshot plus a [`StagePosition`]
//! that answers "is the plant before or after stage X" against the
//! sequencer's [`PhaseLayout`].
//!
//! [`Phase::do_time_step`]: crate::Phase::do_time_step

use chrono::NaiveDate;
use phenology_types::DailyInputs;

use crate::phase::Phase;

// ---------------------------------------------------------------------------
// PhaseLayout
// ---------------------------------------------------------------------------

/// Name and bounding stages of one phase in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageBounds {
    /// Phase name.
    pub name: String,
    /// Stage that opens the phase.
    pub start: String,
    /// Stage that closes the phase.
    pub end: String,
}

/// The static shape of a phase chain: which stages bound which index.
///
/// Built once when the sequencer is assembled and never mutated, so phases
/// can query it while the sequencer holds the phases mutably.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseLayout {
    bounds: Vec<StageBounds>,
}

impl PhaseLayout {
    /// Capture the layout of an ordered phase list.
    pub fn from_phases(phases: &[Box<dyn Phase>]) -> Self {
        let bounds = phases
            .iter()
            .map(|p| StageBounds {
                name: p.name().to_owned(),
                start: p.start_stage().to_owned(),
                end: p.end_stage().to_owned(),
            })
            .collect();
        Self { bounds }
    }

    /// Build a layout from explicit bounds.
    pub const fn from_bounds(bounds: Vec<StageBounds>) -> Self {
        Self { bounds }
    }

    /// Number of phases in the chain.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Bounds of the phase at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&StageBounds> {
        self.bounds.get(index)
    }

    /// Iterate over the phase bounds in chain order.
    pub fn iter(&self) -> impl Iterator<Item = &StageBounds> {
        self.bounds.iter()
    }

    /// Index of the first phase starting at `stage`.
    pub fn start_index(&self, stage: &str) -> Option<usize> {
        self.bounds.iter().position(|b| b.start == stage)
    }

    /// Index of the first phase ending at `stage`.
    pub fn end_index(&self, stage: &str) -> Option<usize> {
        self.bounds.iter().position(|b| b.end == stage)
    }

    /// Index of the phase named `name` (case-insensitive).
    pub fn index_of_phase(&self, name: &str) -> Option<usize> {
        self.bounds
            .iter()
            .position(|b| b.name.eq_ignore_ascii_case(name))
    }

    /// The index at which the plant first sits at or beyond `stage`.
    ///
    /// A stage that opens a phase resolves to that phase's index. A stage
    /// that only closes a phase (typically the final stage) resolves to the
    /// index just past it.
    pub fn stage_reached_index(&self, stage: &str) -> Option<usize> {
        self.start_index(stage)
            .or_else(|| self.end_index(stage).map(|i| i.saturating_add(1)))
    }
}

// ---------------------------------------------------------------------------
// StagePosition
// ---------------------------------------------------------------------------

/// The plant's position in the chain, queryable by stage name.
#[derive(Debug, Clone, Copy)]
pub struct StagePosition<'a> {
    layout: &'a PhaseLayout,
    current: usize,
}

impl<'a> StagePosition<'a> {
    /// Position at phase `current` within `layout`.
    pub const fn new(layout: &'a PhaseLayout, current: usize) -> Self {
        Self { layout, current }
    }

    /// Index of the active phase.
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// The layout being queried.
    pub const fn layout(&self) -> &'a PhaseLayout {
        self.layout
    }

    /// Whether `stage` has not yet been reached. `None` if the stage is unknown.
    pub fn is_before_stage(&self, stage: &str) -> Option<bool> {
        self.layout
            .stage_reached_index(stage)
            .map(|idx| self.current < idx)
    }

    /// Whether `stage` has been reached or passed. `None` if the stage is unknown.
    pub fn is_after_stage(&self, stage: &str) -> Option<bool> {
        self.is_before_stage(stage).map(|before| !before)
    }
}

// ---------------------------------------------------------------------------
// PhaseContext
// ---------------------------------------------------------------------------

/// Everything a phase may read during one call to `do_time_step`.
#[derive(Debug, Clone, Copy)]
pub struct PhaseContext<'a> {
    /// Today's collaborator snapshot.
    pub inputs: &'a DailyInputs,
    /// Date the crop was sown.
    pub sowing_date: NaiveDate,
    /// The plant's position in the phase chain.
    pub stages: StagePosition<'a>,
}

impl<'a> PhaseContext<'a> {
    /// Assemble a context for one phase invocation.
    pub const fn new(
        inputs: &'a DailyInputs,
        sowing_date: NaiveDate,
        stages: StagePosition<'a>,
    ) -> Self {
        Self {
            inputs,
            sowing_date,
            stages,
        }
    }

    /// Whether today is the sowing day.
    pub fn is_sowing_day(&self) -> bool {
        self.inputs.date == self.sowing_date
    }
}
