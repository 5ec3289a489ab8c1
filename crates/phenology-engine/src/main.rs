//! Replicate runner binary for the crop phenology engine.
//!
//! Loads the configuration, then runs independent replicate seasons of the
//! configured crop in parallel, each with its own seeded synthetic weather,
//! and prints the season results as JSON on stdout.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `phenology-config.yaml` (or the path given as
//!    the first argument), falling back to defaults
//! 2. Initialize structured logging (tracing)
//! 3. Validate the phase chain
//! 4. Run the replicates
//! 5. Print the results

mod error;
mod replicate;
mod weather;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use phenology_core::PhenologyConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "phenology-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a replicate fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember where it came from.
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, loaded_from) = load_config(&path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("phenology-engine starting");
    match &loaded_from {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!(path = %path.display(), "Config file not found, using defaults"),
    }
    info!(
        name = config.simulation.name,
        seed = config.simulation.seed,
        replicates = config.simulation.replicates,
        max_days = config.simulation.max_days,
        sowing_date = %config.crop.sowing_date,
        "Run configured"
    );

    // 3. Validate the phase chain once before fanning out.
    let sequencer = config.build_sequencer()?;
    for row in sequencer.phase_table() {
        info!(
            number = row.number,
            phase = %row.name,
            start = %row.start_stage,
            end = %row.end_stage,
            "Phase"
        );
    }

    // 4. Run the replicates.
    let outcomes = replicate::run_replicates(Arc::new(config)).await?;

    // 5. Print the results.
    let json = serde_json::to_string_pretty(&outcomes).map_err(|e| EngineError::Output {
        message: e.to_string(),
    })?;
    println!("{json}");

    info!(replicates = outcomes.len(), "phenology-engine shutdown complete");
    Ok(())
}

/// Load configuration from `path`, or defaults if the file does not exist.
///
/// Returns the path actually read, if any.
fn load_config(path: &Path) -> Result<(PhenologyConfig, Option<PathBuf>), EngineError> {
    if path.exists() {
        let config = PhenologyConfig::from_file(path)?;
        Ok((config, Some(path.to_path_buf())))
    } else {
        Ok((PhenologyConfig::default(), None))
    }
}
