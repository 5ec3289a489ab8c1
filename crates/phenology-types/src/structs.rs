//! Daily input snapshots and reporting rows.
//!
//! The phase engine never computes weather, soil water, leaf appearance or
//! gene expression itself. Those collaborators publish one snapshot per
//! simulated day and the sequencer hands it to every phase it visits. A
//! snapshot is a plain value: phases only read from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Collaborator snapshots
// ---------------------------------------------------------------------------

/// Soil water at the layer holding the seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilWaterState {
    /// Volumetric water content at the seed layer (mm/mm).
    pub water_at_seed_layer: f64,
    /// Lower limit (wilting point) for the same layer (mm/mm).
    pub lower_limit: f64,
}

impl SoilWaterState {
    /// Create a soil-water snapshot.
    pub const fn new(water_at_seed_layer: f64, lower_limit: f64) -> Self {
        Self {
            water_at_seed_layer,
            lower_limit,
        }
    }

    /// Whether the seed layer is wetter than its lower limit.
    pub fn exceeds_lower_limit(&self) -> bool {
        self.water_at_seed_layer > self.lower_limit
    }
}

/// Main-stem leaf state published by the leaf-area model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanopyState {
    /// Number of leaf tips that have appeared (may be fractional).
    pub leaf_tip_number: f64,
    /// Leaves appearing per whole day at today's conditions.
    pub leaf_appearance_rate: f64,
    /// Current, provisional estimate of the final main-stem leaf number.
    pub final_leaf_number: f64,
    /// Number of fully senesced leaves.
    pub dead_leaf_number: f64,
}

/// Vernalisation state published by the gene-expression model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VernalisationState {
    /// Current methylated (persistent) Vrn1 expression.
    pub methylated_vrn1: f64,
    /// Vrn1 expression at which vernalisation saturates.
    pub saturation_target: f64,
    /// Current Haun stage, used for the minimum-duration indicator.
    pub haun_stage: f64,
    /// The model's own verdict on vernalisation saturation.
    pub is_vernalised: bool,
}

// ---------------------------------------------------------------------------
// DailyInputs
// ---------------------------------------------------------------------------

/// Everything the phase engine reads for one simulated day.
///
/// Thermal time is always required. The soil, canopy and vernalisation
/// snapshots are optional: a phase that needs an absent snapshot fails with
/// a configuration error on first use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInputs {
    /// Calendar date of this day.
    pub date: NaiveDate,
    /// Thermal time accrued over the whole day (degree-days).
    pub thermal_time: f64,
    /// Stress multiplier in `[0, 1]` applied by stress-sensitive phases.
    #[serde(default = "default_stress")]
    pub stress: f64,
    /// Day length in hours.
    #[serde(default)]
    pub photoperiod: f64,
    /// Soil water at the seed layer, if a soil model is attached.
    #[serde(default)]
    pub soil: Option<SoilWaterState>,
    /// Leaf state, if a leaf-area model is attached.
    #[serde(default)]
    pub canopy: Option<CanopyState>,
    /// Vernalisation state, if a gene-expression model is attached.
    #[serde(default)]
    pub vernalisation: Option<VernalisationState>,
}

impl DailyInputs {
    /// Create inputs for `date` carrying only thermal time.
    pub const fn new(date: NaiveDate, thermal_time: f64) -> Self {
        Self {
            date,
            thermal_time,
            stress: 1.0,
            photoperiod: 0.0,
            soil: None,
            canopy: None,
            vernalisation: None,
        }
    }

    /// Set the stress multiplier.
    #[must_use]
    pub const fn with_stress(mut self, stress: f64) -> Self {
        self.stress = stress;
        self
    }

    /// Set the day length in hours.
    #[must_use]
    pub const fn with_photoperiod(mut self, photoperiod: f64) -> Self {
        self.photoperiod = photoperiod;
        self
    }

    /// Attach a soil-water snapshot.
    #[must_use]
    pub const fn with_soil(mut self, soil: SoilWaterState) -> Self {
        self.soil = Some(soil);
        self
    }

    /// Attach a canopy snapshot.
    #[must_use]
    pub const fn with_canopy(mut self, canopy: CanopyState) -> Self {
        self.canopy = Some(canopy);
        self
    }

    /// Attach a vernalisation snapshot.
    #[must_use]
    pub const fn with_vernalisation(mut self, vernalisation: VernalisationState) -> Self {
        self.vernalisation = Some(vernalisation);
        self
    }
}

const fn default_stress() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// One row of the phase table: number, name, and bounding stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTableRow {
    /// One-based phase number.
    pub number: usize,
    /// Phase name.
    pub name: String,
    /// Stage at which the phase starts.
    pub start_stage: String,
    /// Stage at which the phase ends.
    pub end_stage: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn soil_water_threshold_is_strict() {
        assert!(SoilWaterState::new(0.20, 0.10).exceeds_lower_limit());
        assert!(!SoilWaterState::new(0.10, 0.10).exceeds_lower_limit());
        assert!(!SoilWaterState::new(0.05, 0.10).exceeds_lower_limit());
    }

    #[test]
    fn builder_sets_optional_snapshots() {
        let inputs = DailyInputs::new(day(), 12.0)
            .with_stress(0.5)
            .with_photoperiod(13.5)
            .with_soil(SoilWaterState::new(0.3, 0.1));
        assert!(inputs.soil.is_some());
        assert!(inputs.canopy.is_none());
        assert!((inputs.stress - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn stress_defaults_to_one_when_deserialized() {
        let json = r#"{"date":"2024-05-01","thermal_time":10.0}"#;
        let inputs: DailyInputs = serde_json::from_str(json).unwrap();
        assert!((inputs.stress - 1.0).abs() < f64::EPSILON);
        assert!(inputs.vernalisation.is_none());
    }
}
