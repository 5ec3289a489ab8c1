//! Parallel replicate runs.
//!
//! Every replicate builds its own sequencer and weather generator from the
//! shared configuration and runs on the blocking pool; replicates share no
//! mutable state. A failing replicate fails the whole run.

use std::sync::Arc;

use phenology_core::runner::{self, DayCallback, SeasonLimits, SeasonResult};
use phenology_core::{DayReport, PhenologyConfig, Sequencer};
use phenology_types::{PlantId, RunId};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::weather::SyntheticWeather;

/// The outcome of one replicate.
#[derive(Debug, Clone, Serialize)]
pub struct ReplicateOutcome {
    /// Replicate run identifier.
    pub run_id: RunId,
    /// Replicate number, from 0.
    pub replicate: u32,
    /// Seed used for the replicate's weather.
    pub seed: u64,
    /// The season result.
    pub season: SeasonResult,
}

/// Logs every stage boundary as it is passed.
struct StageLogger {
    run_id: RunId,
}

impl DayCallback for StageLogger {
    fn on_day(&mut self, report: &DayReport, _sequencer: &Sequencer) {
        for stage in &report.stages_passed {
            debug!(
                run = %self.run_id,
                day = report.day,
                date = %report.date,
                stage = %stage,
                "Stage passed"
            );
        }
    }
}

/// Run one replicate to completion on the current thread.
///
/// # Errors
///
/// Returns [`EngineError`] if the phase chain cannot be built or the season
/// fails.
pub fn run_replicate(
    config: &PhenologyConfig,
    replicate: u32,
) -> Result<ReplicateOutcome, EngineError> {
    let run_id = RunId::new();
    let seed = config.simulation.seed.wrapping_add(u64::from(replicate));
    let mut sequencer = config.build_sequencer()?;
    let mut weather = SyntheticWeather::new(seed, config.weather.clone());
    let limits = SeasonLimits::from_settings(&config.simulation);
    let mut callback = StageLogger { run_id };

    info!(run = %run_id, replicate, seed, "Replicate starting");
    let season = runner::run_season(
        PlantId::new(),
        &mut sequencer,
        config.crop.sowing_date,
        &mut weather,
        &limits,
        &mut callback,
    )?;
    runner::log_season_end(&season, &sequencer);

    Ok(ReplicateOutcome {
        run_id,
        replicate,
        seed,
        season,
    })
}

/// Run every configured replicate concurrently. Outcomes are returned in
/// replicate order.
///
/// # Errors
///
/// Returns the first [`EngineError`] raised by a replicate, or
/// [`EngineError::Join`] if a worker panicked.
pub async fn run_replicates(
    config: Arc<PhenologyConfig>,
) -> Result<Vec<ReplicateOutcome>, EngineError> {
    let mut workers = JoinSet::new();
    for replicate in 0..config.simulation.replicates {
        let config = Arc::clone(&config);
        workers.spawn_blocking(move || run_replicate(&config, replicate));
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = workers.join_next().await {
        let outcome = joined.map_err(|e| EngineError::Join {
            message: e.to_string(),
        })??;
        outcomes.push(outcome);
    }
    outcomes.sort_by_key(|o| o.replicate);
    Ok(outcomes)
}
