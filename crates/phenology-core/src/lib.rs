//! Phase sequencing, configuration, and season orchestration for the crop
//! phenology engine.
//!
//! This crate owns the daily cycle that moves a plant through its phase
//! chain: offer the day to the active phase, carry any unused fraction into
//! the next phase, record every hand-off, and check the day balanced.
//!
//! # Modules
//!
//! - [`sequencer`] -- [`Sequencer`]: the ordered phase chain, the day loop,
//!   jumps, stage setting, and position queries.
//! - [`clock`] -- Simulation clock counting days from sowing.
//! - [`config`] -- Configuration loading from `phenology-config.yaml` into
//!   strongly-typed structs, and the phase-chain builder.
//! - [`event`] -- [`PhenologyEvent`] raised at phase boundaries.
//! - [`runner`] -- [`run_season`] with the [`DailyInputSource`] and
//!   [`DayCallback`] seams.
//! - [`error`] -- [`SequencerError`].
//!
//! [`Sequencer`]: sequencer::Sequencer
//! [`PhenologyEvent`]: event::PhenologyEvent
//! [`run_season`]: runner::run_season
//! [`DailyInputSource`]: runner::DailyInputSource
//! [`DayCallback`]: runner::DayCallback
//! [`SequencerError`]: error::SequencerError

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod runner;
pub mod sequencer;

pub use config::{ConfigError, PhenologyConfig};
pub use error::SequencerError;
pub use event::PhenologyEvent;
pub use runner::{
    DailyInputSource, DayCallback, ForcingSeries, NoOpCallback, RunnerError, SeasonEndReason,
    SeasonLimits, SeasonResult, run_season,
};
pub use sequencer::{DayReport, Sequencer, SequencerSettings};
