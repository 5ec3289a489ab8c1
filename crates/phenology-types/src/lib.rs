//! Shared type definitions for the crop phenology engine.
//!
//! This crate holds the values that cross crate boundaries: identifiers,
//! phase kinds, and the per-day input snapshots that external collaborators
//! (weather, soil water, leaf area, vernalisation) publish for the phase
//! engine to read.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for plants and replicate runs
//! - [`enums`] -- Phase kinds and photoperiod direction
//! - [`structs`] -- Daily input snapshots and phase-table rows

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{PhaseKind, PhotoperiodDirection};
pub use ids::{PlantId, RunId};
pub use structs::{
    CanopyState, DailyInputs, PhaseTableRow, SoilWaterState, VernalisationState,
};
