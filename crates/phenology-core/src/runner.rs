//! Season runner.
//!
//! This module provides [`run_season`], which sows a crop and drives its
//! [`Sequencer`] one day at a time until one of:
//!
//! - **Terminal phase**: the chain reached its end phase
//! - **Stop stage**: a configured stage was passed
//! - **Inputs exhausted**: the [`DailyInputSource`] has no more days
//! - **Day limit**: `max_days` days were simulated
//!
//! Daily forcing comes from a [`DailyInputSource`]; a [`DayCallback`] sees
//! every resolved day. Any sequencer error aborts the season.

use chrono::NaiveDate;
use phenology_ledger::{ConservationResult, DayAnomaly};
use phenology_types::{DailyInputs, PlantId};
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::{ClockError, SimulationClock};
use crate::config::SimulationSettings;
use crate::error::SequencerError;
use crate::sequencer::{DayReport, Sequencer};

/// Errors raised by an input source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The source produced inputs for a different day.
    #[error("inputs dated {found} supplied for {expected}")]
    DateMismatch {
        /// Date the runner asked for.
        expected: NaiveDate,
        /// Date on the inputs.
        found: NaiveDate,
    },

    /// The source failed.
    #[error("input source failed: {message}")]
    Source {
        /// Description of the failure.
        message: String,
    },
}

/// Errors that can occur during a season run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The sequencer rejected a day.
    #[error("sequencer error: {source}")]
    Sequencer {
        /// The underlying sequencer error.
        #[from]
        source: SequencerError,
    },

    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The input source failed.
    #[error("input error: {source}")]
    Input {
        /// The underlying input error.
        #[from]
        source: InputError,
    },
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Supplies each day's forcing.
///
/// Implementations might replay a weather file, query a soil-water model,
/// or generate synthetic weather.
pub trait DailyInputSource: Send {
    /// Inputs for simulated day `day` falling on `date`, or `None` when the
    /// source has no more days.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] if the inputs cannot be produced.
    fn inputs_for(&mut self, day: u64, date: NaiveDate) -> Result<Option<DailyInputs>, InputError>;
}

/// A fixed, pre-computed forcing series, one entry per day from sowing.
#[derive(Debug, Clone, Default)]
pub struct ForcingSeries {
    days: std::collections::VecDeque<DailyInputs>,
}

impl ForcingSeries {
    /// Wrap a series of daily inputs.
    pub fn new(days: impl IntoIterator<Item = DailyInputs>) -> Self {
        Self {
            days: days.into_iter().collect(),
        }
    }

    /// Days still to be supplied.
    pub fn remaining(&self) -> usize {
        self.days.len()
    }
}

impl DailyInputSource for ForcingSeries {
    fn inputs_for(
        &mut self,
        _day: u64,
        date: NaiveDate,
    ) -> Result<Option<DailyInputs>, InputError> {
        let Some(inputs) = self.days.pop_front() else {
            return Ok(None);
        };
        if inputs.date != date {
            return Err(InputError::DateMismatch {
                expected: date,
                found: inputs.date,
            });
        }
        Ok(Some(inputs))
    }
}

/// Callback invoked after each day resolves.
pub trait DayCallback: Send {
    /// Called with the day's report and the sequencer state after the day.
    fn on_day(&mut self, report: &DayReport, sequencer: &Sequencer);
}

/// A no-op day callback.
pub struct NoOpCallback;

impl DayCallback for NoOpCallback {
    fn on_day(&mut self, _report: &DayReport, _sequencer: &Sequencer) {}
}

// ---------------------------------------------------------------------------
// Limits and results
// ---------------------------------------------------------------------------

/// When to stop a season besides reaching the terminal phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonLimits {
    /// Stop after this many simulated days.
    pub max_days: u64,
    /// Stop once this stage is passed.
    pub stop_stage: Option<String>,
}

impl SeasonLimits {
    /// Limits from the `simulation` config section.
    pub fn from_settings(settings: &SimulationSettings) -> Self {
        Self {
            max_days: settings.max_days,
            stop_stage: settings.stop_stage.clone(),
        }
    }
}

/// Why a season ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonEndReason {
    /// The terminal phase was reached.
    Terminal,
    /// The configured stop stage was passed.
    StopStage(String),
    /// The input source ran out of days.
    InputsExhausted,
    /// The day limit was reached.
    MaxDays,
}

/// The day a stage was passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageDate {
    /// Stage name.
    pub stage: String,
    /// Simulated day (0 for the stage registered at sowing).
    pub day: u64,
    /// Calendar date.
    pub date: NaiveDate,
}

/// Outcome of one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonResult {
    /// The plant instance.
    pub plant_id: PlantId,
    /// Why the season ended.
    pub end_reason: SeasonEndReason,
    /// Days simulated.
    pub days: u64,
    /// Stage number at the end.
    pub final_stage: f64,
    /// Active phase at the end.
    pub final_phase: String,
    /// Thermal time since sowing.
    pub thermal_time: f64,
    /// Thermal time since emergence.
    pub emerged_thermal_time: f64,
    /// Every stage passed, in order.
    pub stage_dates: Vec<StageDate>,
    /// Days that failed the conservation check.
    pub anomalies: Vec<DayAnomaly>,
}

impl SeasonResult {
    /// Date `stage` was passed, if it was.
    pub fn date_of(&self, stage: &str) -> Option<NaiveDate> {
        self.stage_dates
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.date)
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Sow on `sowing_date` and run until a stop condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if the clock, the input source or the sequencer
/// fails. The season is abandoned on the failing day.
pub fn run_season(
    plant_id: PlantId,
    sequencer: &mut Sequencer,
    sowing_date: NaiveDate,
    source: &mut dyn DailyInputSource,
    limits: &SeasonLimits,
    callback: &mut dyn DayCallback,
) -> Result<SeasonResult, RunnerError> {
    sequencer.sow(sowing_date);
    let mut clock = SimulationClock::new(sowing_date);
    info!(
        plant = %plant_id,
        %sowing_date,
        phases = sequencer.phase_count(),
        max_days = limits.max_days,
        "Season starting"
    );

    let mut stage_dates: Vec<StageDate> = sequencer
        .stages_passed_today()
        .iter()
        .map(|stage| StageDate {
            stage: stage.clone(),
            day: 0,
            date: sowing_date,
        })
        .collect();
    let mut anomalies = Vec::new();

    let end_reason = loop {
        if sequencer.is_terminal() {
            break SeasonEndReason::Terminal;
        }
        if clock.day() >= limits.max_days {
            break SeasonEndReason::MaxDays;
        }
        let (day, date) = clock.advance()?;
        let Some(inputs) = source.inputs_for(day, date)? else {
            break SeasonEndReason::InputsExhausted;
        };

        let report = sequencer.advance_one_day(&inputs)?;
        stage_dates.extend(report.stages_passed.iter().map(|stage| StageDate {
            stage: stage.clone(),
            day,
            date,
        }));
        if let ConservationResult::Anomaly(anomaly) = &report.conservation {
            anomalies.push(anomaly.clone());
        }
        callback.on_day(&report, sequencer);

        if let Some(stop) = &limits.stop_stage {
            if report.stages_passed.iter().any(|s| s == stop) {
                break SeasonEndReason::StopStage(stop.clone());
            }
        }
    };

    Ok(SeasonResult {
        plant_id,
        end_reason,
        days: sequencer.day(),
        final_stage: sequencer.stage(),
        final_phase: sequencer.current_phase_name().to_owned(),
        thermal_time: sequencer.accumulated_thermal_time(),
        emerged_thermal_time: sequencer.accumulated_emerged_thermal_time(),
        stage_dates,
        anomalies,
    })
}

/// Log the end of a season with one line per phase summary.
pub fn log_season_end(result: &SeasonResult, sequencer: &Sequencer) {
    info!(
        plant = %result.plant_id,
        reason = ?result.end_reason,
        days = result.days,
        stage = result.final_stage,
        phase = %result.final_phase,
        thermal_time = result.thermal_time,
        "Season ended"
    );
    if !result.anomalies.is_empty() {
        warn!(
            plant = %result.plant_id,
            anomalies = result.anomalies.len(),
            "Season had days that failed conservation"
        );
    }
    let mut summaries = String::new();
    if sequencer.write_summaries(&mut summaries).is_ok() {
        for line in summaries.lines() {
            info!(plant = %result.plant_id, "{line}");
        }
    }
}
