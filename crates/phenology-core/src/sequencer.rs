//! The phase sequencer: drives a chain of phases one simulated day at a time.
//!
//! Each day the sequencer offers the whole day (fraction 1.0) to the active
//! phase. If the phase completes, the sequencer advances to the next phase
//! and offers it the fraction the previous phase left unused, repeating
//! until a phase reports it is not complete or nothing of the day is left.
//! A phase may instead request a jump to the phase opening a named stage;
//! the jump takes no time, and the phase jumped to is offered the same fraction.
//!
//! Every hand-off is recorded in a [`DayLedger`] and the day is checked for
//! conservation: the fractions consumed by all phases visited add up to one.
//!
//! The phase list is a graph with indexed nodes: normal completion follows
//! the edge to `index + 1`, a jump follows an explicit edge to the phase
//! whose start stage matches. Jump targets are resolved when the sequencer
//! is built, so a misnamed target fails fast.

use chrono::NaiveDate;
use phenology_ledger::{ConservationResult, DEFAULT_TOLERANCE, DayLedger, StepOutcome};
use phenology_phases::{Phase, PhaseContext, PhaseLayout, StagePosition, Transition};
use phenology_types::{DailyInputs, PhaseKind, PhaseTableRow};
use tracing::{debug, info, warn};

use crate::error::SequencerError;
use crate::event::PhenologyEvent;

/// Default bound on phase transitions within one simulated day.
pub const DEFAULT_MAX_TRANSITIONS_PER_DAY: usize = 64;

// ---------------------------------------------------------------------------
// Settings and reports
// ---------------------------------------------------------------------------

/// Knobs for a [`Sequencer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerSettings {
    /// Phase transitions allowed in one day before the chain is declared
    /// misconfigured.
    pub max_transitions_per_day: usize,
    /// Tolerance for the end-of-day conservation check.
    pub conservation_tolerance: f64,
    /// Also check that each offer equals the previous phase's leftover.
    pub strict_conservation: bool,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            max_transitions_per_day: DEFAULT_MAX_TRANSITIONS_PER_DAY,
            conservation_tolerance: DEFAULT_TOLERANCE,
            strict_conservation: true,
        }
    }
}

/// What happened on one simulated day, read after the day has resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    /// Simulated day number (1 on the first day after sowing).
    pub day: u64,
    /// Calendar date.
    pub date: NaiveDate,
    /// Stages passed today, in order.
    pub stages_passed: Vec<String>,
    /// Events raised today.
    pub events: Vec<PhenologyEvent>,
    /// Phase transitions (completions and jumps) today.
    pub transitions: usize,
    /// End-of-day conservation check.
    pub conservation: ConservationResult,
    /// Stage number at the end of the day.
    pub stage: f64,
    /// Active phase at the end of the day.
    pub phase_name: String,
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Owns an ordered chain of phases and the index of the active one.
#[derive(Debug)]
pub struct Sequencer {
    phases: Vec<Box<dyn Phase>>,
    layout: PhaseLayout,
    settings: SequencerSettings,
    current: usize,
    sowing_date: Option<NaiveDate>,
    day: u64,
    accumulated_tt: f64,
    accumulated_emerged_tt: f64,
    stages_passed_today: Vec<String>,
    emerged_reported: bool,
    events: Vec<PhenologyEvent>,
    ledger: DayLedger,
}

impl Sequencer {
    /// Assemble a sequencer over `phases`.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError`] if the chain is empty, a phase name is
    /// repeated, a jump target names no phase's start stage, or the
    /// transition bound is zero.
    pub fn new(
        phases: Vec<Box<dyn Phase>>,
        settings: SequencerSettings,
    ) -> Result<Self, SequencerError> {
        if phases.is_empty() {
            return Err(SequencerError::EmptyChain);
        }
        if settings.max_transitions_per_day == 0 {
            return Err(SequencerError::InvalidTransitionBound);
        }
        for (i, phase) in phases.iter().enumerate() {
            let repeated = phases
                .iter()
                .skip(i.saturating_add(1))
                .any(|other| other.name().eq_ignore_ascii_case(phase.name()));
            if repeated {
                return Err(SequencerError::DuplicatePhase {
                    name: phase.name().to_owned(),
                });
            }
        }

        let layout = PhaseLayout::from_phases(&phases);
        for phase in &phases {
            if let Some(target) = phase.jump_target() {
                if layout.start_index(target).is_none() {
                    return Err(SequencerError::UnknownStage {
                        stage: target.to_owned(),
                    });
                }
            }
        }

        let mut sequencer = Self {
            phases,
            layout,
            settings,
            current: 0,
            sowing_date: None,
            day: 0,
            accumulated_tt: 0.0,
            accumulated_emerged_tt: 0.0,
            stages_passed_today: Vec::new(),
            emerged_reported: false,
            events: Vec::new(),
            ledger: DayLedger::new(),
        };
        sequencer.reset();
        Ok(sequencer)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Sow the crop on `date`, resetting the whole chain.
    pub fn sow(&mut self, date: NaiveDate) {
        self.sowing_date = Some(date);
        self.reset();
        self.events.push(PhenologyEvent::Sown { date });
        info!(%date, phases = self.phases.len(), "Crop sown");
    }

    /// Zero every phase and return to the first one. The sowing date is kept.
    pub fn reset(&mut self) {
        for phase in &mut self.phases {
            phase.reset_phase();
        }
        self.current = 0;
        self.day = 0;
        self.accumulated_tt = 0.0;
        self.accumulated_emerged_tt = 0.0;
        self.stages_passed_today.clear();
        if let Some(first) = self.layout.get(0) {
            self.stages_passed_today.push(first.start.clone());
        }
        self.emerged_reported = self.current_phase().is_some_and(|p| p.is_emerged());
        self.events.clear();
        self.ledger.clear();
        debug!("Phase chain reset");
    }

    /// Resolve one simulated day.
    ///
    /// The sequencer adds the day's thermal time to its running total, then
    /// hands the day to the active phase and on through any phases that
    /// complete, as described in the module documentation.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError`] if the crop is not sown, thermal time is
    /// negative, a phase fails, the last phase completes, or the day
    /// crosses more transitions than allowed. The day is abandoned.
    pub fn advance_one_day(&mut self, inputs: &DailyInputs) -> Result<DayReport, SequencerError> {
        let sowing = self.sowing_date.ok_or(SequencerError::NotSown)?;
        let tt = inputs.thermal_time;
        if !tt.is_finite() || tt < 0.0 {
            return Err(SequencerError::InvalidThermalTime { value: tt });
        }
        let day = self.day.checked_add(1).ok_or(SequencerError::DayOverflow)?;
        self.day = day;
        self.stages_passed_today.clear();
        self.accumulated_tt += tt;

        let mut fraction = 1.0_f64;
        let mut transitions = 0_usize;
        loop {
            let index = self.current;
            let (name, emerged, step) = {
                let Self {
                    phases,
                    layout,
                    current,
                    ..
                } = self;
                let phase = phases.get_mut(*current).ok_or(SequencerError::EmptyChain)?;
                let ctx = PhaseContext::new(inputs, sowing, StagePosition::new(layout, *current));
                let step = phase.do_time_step(&ctx, fraction)?;
                (phase.name().to_owned(), phase.is_emerged(), step)
            };

            let unused = step.unused_fraction;
            if emerged {
                self.accumulated_emerged_tt += tt * (fraction - unused);
            }
            let outcome = match step.transition {
                Transition::Remain => StepOutcome::Remained,
                Transition::Proceed => StepOutcome::Completed,
                Transition::JumpTo(_) => StepOutcome::Jumped,
            };
            self.ledger
                .record(day, inputs.date, (index, &name), fraction, unused, outcome)?;

            match step.transition {
                Transition::Remain => break,
                Transition::Proceed => {
                    transitions = self.count_transition(transitions, day)?;
                    self.advance_phase()?;
                    fraction = unused;
                    if fraction <= 0.0 {
                        break;
                    }
                }
                Transition::JumpTo(stage) => {
                    transitions = self.count_transition(transitions, day)?;
                    self.jump_to_stage(&stage)?;
                    fraction = unused;
                    if fraction <= 0.0 {
                        break;
                    }
                }
            }
        }

        let conservation = if self.settings.strict_conservation {
            self.ledger
                .verify_day_strict(day, self.settings.conservation_tolerance)
        } else {
            self.ledger
                .verify_day(day, self.settings.conservation_tolerance)
        };
        match &conservation {
            ConservationResult::Balanced => self.ledger.prune_before(day),
            ConservationResult::Anomaly(anomaly) => {
                warn!(day, consumed = anomaly.consumed, %anomaly, "Day conservation violated");
            }
        }

        let report = DayReport {
            day,
            date: inputs.date,
            stages_passed: self.stages_passed_today.clone(),
            events: std::mem::take(&mut self.events),
            transitions,
            conservation,
            stage: self.stage(),
            phase_name: self.current_phase_name().to_owned(),
        };
        debug!(
            day,
            date = %inputs.date,
            stage = report.stage,
            phase = %report.phase_name,
            transitions,
            "Day resolved"
        );
        Ok(report)
    }

    fn count_transition(&self, transitions: usize, day: u64) -> Result<usize, SequencerError> {
        let next = transitions.saturating_add(1);
        if next > self.settings.max_transitions_per_day {
            return Err(SequencerError::TransitionBoundExceeded {
                day,
                limit: self.settings.max_transitions_per_day,
            });
        }
        Ok(next)
    }

    /// Move from the active phase to the next one in order.
    fn advance_phase(&mut self) -> Result<(), SequencerError> {
        let from = self.current;
        let bounds = self
            .layout
            .get(from)
            .cloned()
            .ok_or(SequencerError::EmptyChain)?;
        let next = from.saturating_add(1);
        let Some(to) = self.layout.get(next).map(|b| b.name.clone()) else {
            return Err(SequencerError::NoMorePhases { phase: bounds.name });
        };

        self.enter(next);
        self.stages_passed_today.push(bounds.end.clone());
        info!(
            day = self.day,
            from = %bounds.name,
            to = %to,
            stage = %bounds.end,
            "Phase changed"
        );
        self.events.push(PhenologyEvent::PhaseChanged {
            from_phase: bounds.name,
            to_phase: to,
            stage: bounds.end,
        });
        self.check_emerged();
        Ok(())
    }

    /// Make phase `index` active, resetting it for re-entry.
    fn enter(&mut self, index: usize) {
        self.current = index;
        if let Some(phase) = self.phases.get_mut(index) {
            phase.reset_phase();
        }
    }

    fn check_emerged(&mut self) {
        if !self.emerged_reported && self.emerged() {
            self.emerged_reported = true;
            info!(day = self.day, "Plant emerged");
            self.events.push(PhenologyEvent::PlantEmerged);
        }
    }

    /// Make the phase opening `stage` active. Only the entered phase is reset.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::UnknownStage`] if no phase starts at `stage`.
    pub fn jump_to_stage(&mut self, stage: &str) -> Result<(), SequencerError> {
        let target = self
            .layout
            .start_index(stage)
            .ok_or_else(|| SequencerError::UnknownStage {
                stage: stage.to_owned(),
            })?;
        let from = self.current_phase_name().to_owned();
        self.enter(target);
        let to = self.current_phase_name().to_owned();
        self.stages_passed_today.push(stage.to_owned());
        info!(day = self.day, from = %from, to = %to, stage, "Jumped to stage");
        self.events.push(PhenologyEvent::StageJumped {
            from_phase: from,
            to_phase: to,
            stage: stage.to_owned(),
        });
        self.check_emerged();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Setting the stage externally
    // -----------------------------------------------------------------------

    /// Move the plant to stage number `stage`.
    ///
    /// The integer part selects the phase (1 is the first phase) and the
    /// fractional part sets the progress through it. Rewinding resets every
    /// phase from the new one back to the old one and removes their thermal
    /// time from the running totals. Fast-forwarding marks skipped
    /// thermal-time phases complete, adds their remaining thermal time, and
    /// records their end stages as passed today.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::InvalidStage`] unless `1 <= stage <= phases + 1`.
    pub fn set_to_stage(&mut self, stage: f64) -> Result<(), SequencerError> {
        let count = self.phases.len();
        let max = index_to_f64(count) + 1.0;
        if !stage.is_finite() || stage < 1.0 || stage > max {
            return Err(SequencerError::InvalidStage { stage, max });
        }
        let target = (0..count)
            .rev()
            .find(|&i| index_to_f64(i) + 1.0 <= stage)
            .unwrap_or(0);
        let within = (stage - index_to_f64(target) - 1.0).clamp(0.0, 1.0);
        let old = self.current;
        self.stages_passed_today.clear();

        if target < old {
            for phase in self
                .phases
                .iter_mut()
                .take(old.saturating_add(1))
                .skip(target)
                .rev()
            {
                if is_thermal(phase.kind()) {
                    self.accumulated_tt -= phase.progress();
                    if phase.is_emerged() {
                        self.accumulated_emerged_tt -= phase.progress();
                    }
                }
                phase.reset_phase();
            }
        } else if target > old {
            for phase in self.phases.iter_mut().take(target).skip(old) {
                if let Some(goal) = phase.target() {
                    if is_thermal(phase.kind()) {
                        let remaining = (goal - phase.progress()).max(0.0);
                        self.accumulated_tt += remaining;
                        if phase.is_emerged() {
                            self.accumulated_emerged_tt += remaining;
                        }
                    }
                    phase.set_progress(goal);
                }
                self.stages_passed_today.push(phase.end_stage().to_owned());
            }
            if let Some(phase) = self.phases.get_mut(target) {
                phase.reset_phase();
            }
        }

        self.current = target;
        if let Some(phase) = self.phases.get_mut(target) {
            if let Some(goal) = phase.target() {
                let before = phase.progress();
                phase.set_progress(goal * within);
                if is_thermal(phase.kind()) {
                    let delta = phase.progress() - before;
                    self.accumulated_tt += delta;
                    if phase.is_emerged() {
                        self.accumulated_emerged_tt += delta;
                    }
                }
            }
        }
        self.accumulated_tt = self.accumulated_tt.max(0.0);
        self.accumulated_emerged_tt = self.accumulated_emerged_tt.max(0.0);

        if self.emerged() {
            self.check_emerged();
        } else {
            self.emerged_reported = false;
        }
        self.events.push(PhenologyEvent::StageSet { stage });
        info!(stage, from_index = old, to_index = target, "Stage set");
        Ok(())
    }

    /// Move the plant to the start of the final phase.
    ///
    /// # Errors
    ///
    /// Propagates [`set_to_stage`](Self::set_to_stage) errors.
    pub fn set_to_end_stage(&mut self) -> Result<(), SequencerError> {
        self.set_to_stage(index_to_f64(self.phases.len()))
    }

    /// Harvest the crop: move to the final phase and raise
    /// [`PhenologyEvent::Harvested`].
    ///
    /// # Errors
    ///
    /// Propagates [`set_to_stage`](Self::set_to_stage) errors.
    pub fn harvest(&mut self) -> Result<(), SequencerError> {
        self.set_to_end_stage()?;
        self.events.push(PhenologyEvent::Harvested);
        info!(day = self.day, "Crop harvested");
        Ok(())
    }

    /// Take the events raised since the last report.
    pub fn drain_events(&mut self) -> Vec<PhenologyEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Position queries
    // -----------------------------------------------------------------------

    /// The active phase.
    pub fn current_phase(&self) -> Option<&dyn Phase> {
        self.phases.get(self.current).map(|p| &**p)
    }

    /// Index of the active phase.
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// Name of the active phase.
    pub fn current_phase_name(&self) -> &str {
        self.current_phase().map_or("", |p| p.name())
    }

    /// Start stage of the active phase if it was passed today, else empty.
    pub fn current_stage_name(&self) -> &str {
        match self.current_phase() {
            Some(phase) if self.on_start_day_of(phase.start_stage()) => phase.start_stage(),
            _ => "",
        }
    }

    /// Completion of the active phase in `[0, 1]`.
    pub fn fraction_in_current_phase(&self) -> f64 {
        self.current_phase().map_or(0.0, |p| p.fraction_complete())
    }

    /// Stage number: `index + 1 + fraction_complete`.
    pub fn stage(&self) -> f64 {
        index_to_f64(self.current) + 1.0 + self.fraction_in_current_phase()
    }

    /// Stages passed on the most recent day.
    pub fn stages_passed_today(&self) -> &[String] {
        &self.stages_passed_today
    }

    /// Whether `stage` was passed on the most recent day.
    pub fn on_start_day_of(&self, stage: &str) -> bool {
        self.stages_passed_today.iter().any(|s| s == stage)
    }

    /// Whether the active phase is named `name` (case-insensitive).
    pub fn in_phase(&self, name: &str) -> bool {
        self.current_phase_name().eq_ignore_ascii_case(name)
    }

    /// Whether `stage` has not been reached yet.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::UnknownStage`] if no phase is bounded by `stage`.
    pub fn is_before_stage(&self, stage: &str) -> Result<bool, SequencerError> {
        StagePosition::new(&self.layout, self.current)
            .is_before_stage(stage)
            .ok_or_else(|| SequencerError::UnknownStage {
                stage: stage.to_owned(),
            })
    }

    /// Whether `stage` has been reached or passed.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::UnknownStage`] if no phase is bounded by `stage`.
    pub fn is_after_stage(&self, stage: &str) -> Result<bool, SequencerError> {
        self.is_before_stage(stage).map(|before| !before)
    }

    /// Whether the active phase lies between the phase opening `start` and
    /// the phase closing `end`, inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError`] if either stage is unknown or `start`
    /// comes after `end`.
    pub fn between(&self, start: &str, end: &str) -> Result<bool, SequencerError> {
        let first = self.require_start_index(start)?;
        let last = self
            .layout
            .end_index(end)
            .ok_or_else(|| SequencerError::UnknownStage {
                stage: end.to_owned(),
            })?;
        if first > last {
            return Err(SequencerError::ReversedRange {
                start: start.to_owned(),
                end: end.to_owned(),
            });
        }
        Ok((first..=last).contains(&self.current))
    }

    /// Whether the active phase is past the phase opening `start`.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::UnknownStage`] if no phase starts at `start`.
    pub fn beyond(&self, start: &str) -> Result<bool, SequencerError> {
        Ok(self.current > self.require_start_index(start)?)
    }

    fn require_start_index(&self, stage: &str) -> Result<usize, SequencerError> {
        self.layout
            .start_index(stage)
            .ok_or_else(|| SequencerError::UnknownStage {
                stage: stage.to_owned(),
            })
    }

    /// The phase opening `stage`.
    pub fn phase_starting_with(&self, stage: &str) -> Option<&dyn Phase> {
        self.layout
            .start_index(stage)
            .and_then(|i| self.phases.get(i))
            .map(|p| &**p)
    }

    /// Index of the phase opening `stage`.
    pub fn start_stage_phase_index(&self, stage: &str) -> Option<usize> {
        self.layout.start_index(stage)
    }

    /// Index of the phase closing `stage`.
    pub fn end_stage_phase_index(&self, stage: &str) -> Option<usize> {
        self.layout.end_index(stage)
    }

    /// Index of the phase named `name` (case-insensitive).
    pub fn index_from_phase_name(&self, name: &str) -> Option<usize> {
        self.layout.index_of_phase(name)
    }

    // -----------------------------------------------------------------------
    // Chain description
    // -----------------------------------------------------------------------

    /// Every phase, in chain order.
    pub fn phases(&self) -> impl Iterator<Item = &dyn Phase> {
        self.phases.iter().map(|p| &**p)
    }

    /// Number of phases.
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// The first start stage followed by every end stage.
    pub fn stage_names(&self) -> Vec<String> {
        self.layout
            .get(0)
            .map(|first| first.start.clone())
            .into_iter()
            .chain(self.layout.iter().map(|b| b.end.clone()))
            .collect()
    }

    /// Integer codes matching [`stage_names`](Self::stage_names): 0 for the
    /// first start stage, then one per phase end.
    ///
    /// These are ordinal labels, not [`stage`](Self::stage) numbers, which
    /// start at 1.
    pub fn stage_codes(&self) -> Vec<usize> {
        (0..=self.phases.len()).collect()
    }

    /// One row per phase: number, name, start and end stage.
    pub fn phase_table(&self) -> Vec<PhaseTableRow> {
        self.layout
            .iter()
            .enumerate()
            .map(|(i, b)| PhaseTableRow {
                number: i.saturating_add(1),
                name: b.name.clone(),
                start_stage: b.start.clone(),
                end_stage: b.end.clone(),
            })
            .collect()
    }

    /// Write one summary line per phase.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying writer.
    pub fn write_summaries(&self, out: &mut dyn core::fmt::Write) -> core::fmt::Result {
        for phase in &self.phases {
            phase.write_summary(out)?;
            writeln!(out)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Running totals
    // -----------------------------------------------------------------------

    /// Thermal time accumulated since sowing.
    pub const fn accumulated_thermal_time(&self) -> f64 {
        self.accumulated_tt
    }

    /// Thermal time accumulated while above ground.
    pub const fn accumulated_emerged_thermal_time(&self) -> f64 {
        self.accumulated_emerged_tt
    }

    /// Whether the active phase is above ground.
    pub fn emerged(&self) -> bool {
        self.current_phase().is_some_and(|p| p.is_emerged())
    }

    /// Whether the plant has reached the terminal phase.
    pub fn is_terminal(&self) -> bool {
        self.current_phase()
            .is_some_and(|p| p.kind() == PhaseKind::End)
    }

    /// Days simulated since sowing.
    pub const fn day(&self) -> u64 {
        self.day
    }

    /// The sowing date, once sown.
    pub const fn sowing_date(&self) -> Option<NaiveDate> {
        self.sowing_date
    }

    /// The hand-off ledger for the current planting.
    ///
    /// Once a day balances, every earlier day is pruned, so the ledger holds
    /// the latest day plus any unbalanced days after the last balanced one.
    pub const fn ledger(&self) -> &DayLedger {
        &self.ledger
    }

    /// The settings in force.
    pub const fn settings(&self) -> &SequencerSettings {
        &self.settings
    }
}

/// Phases whose progress is measured in thermal time.
const fn is_thermal(kind: PhaseKind) -> bool {
    matches!(kind, PhaseKind::Generic | PhaseKind::Emerging)
}

fn index_to_f64(index: usize) -> f64 {
    u32::try_from(index).map_or(f64::from(u32::MAX), f64::from)
}
