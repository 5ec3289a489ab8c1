//! Events raised by the sequencer.
//!
//! Growth and reporting subsystems subscribe to these rather than polling
//! the phase chain. Events are collected while a day resolves and handed out
//! with the [`DayReport`](crate::sequencer::DayReport), or drained directly
//! after an out-of-band operation such as [`Sequencer::set_to_stage`].
//!
//! [`Sequencer::set_to_stage`]: crate::sequencer::Sequencer::set_to_stage

use chrono::NaiveDate;
use serde::Serialize;

/// Something that happened to the phase chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhenologyEvent {
    /// The crop was sown and the chain reset.
    Sown {
        /// Sowing date.
        date: NaiveDate,
    },
    /// The active phase completed and the next one became active.
    PhaseChanged {
        /// Phase that completed.
        from_phase: String,
        /// Phase that became active.
        to_phase: String,
        /// Stage passed at the boundary.
        stage: String,
    },
    /// Control jumped to the phase opening `stage`.
    StageJumped {
        /// Phase that was active before the jump.
        from_phase: String,
        /// Phase that became active.
        to_phase: String,
        /// Stage jumped to.
        stage: String,
    },
    /// The plant entered its first above-ground phase.
    PlantEmerged,
    /// The stage was set externally.
    StageSet {
        /// The new stage number.
        stage: f64,
    },
    /// The crop was harvested and moved to the final phase.
    Harvested,
}
