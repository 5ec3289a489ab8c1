//! Configuration loading and typed config structures for the phenology engine.
//!
//! The canonical configuration lives in `phenology-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, a loader, and the builder that turns the `crop.phases`
//! list into a ready [`Sequencer`].
//!
//! Phase entries are tagged by `kind`. Rate and target sources are optional
//! at parse time so that a missing one is reported as
//! [`ConfigError::MissingField`] naming the phase, rather than as an opaque
//! YAML error.
//!
//! ```yaml
//! crop:
//!   sowing_date: 2024-05-01
//!   sowing_depth: 30.0
//!   phases:
//!     - { name: Germinating, start: Sowing, end: Germination, kind: germinating }
//!     - { name: Emerging, start: Germination, end: Emergence, kind: emerging,
//!         shoot_lag: 40.0, shoot_rate: 1.5 }
//!     - { name: Juvenile, start: Emergence, end: Flowering, kind: generic,
//!         rate: thermal_time, target: 400.0 }
//!     - { name: Mature, start: Flowering, end: Unused, kind: end }
//! ```

use std::path::Path;

use chrono::NaiveDate;
use phenology_phases::{
    ConstantRate, EmergingPhase, EndPhase, FixedTarget, GenericPhase, GerminatingPhase, GotoPhase,
    LeafAppearanceRate, LeafDeathPhase, LeafNumberPhase, LeafTarget, Phase, PhaseLabels,
    PhotoperiodPhase, ProgressSource, SowingDepthTarget, StressedThermalTime, ThermalTime,
    VernalisationPhase,
};
use phenology_types::PhotoperiodDirection;
use serde::Deserialize;

use crate::error::SequencerError;
use crate::sequencer::{DEFAULT_MAX_TRANSITIONS_PER_DAY, Sequencer, SequencerSettings};

/// Errors that can occur when loading configuration or building from it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A phase entry lacks a field its kind requires.
    #[error("phase `{phase}` is missing required field `{field}`")]
    MissingField {
        /// Phase name.
        phase: String,
        /// The missing field.
        field: &'static str,
    },

    /// A value is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What was wrong.
        reason: String,
    },

    /// The phase chain was rejected by the sequencer.
    #[error("invalid phase chain: {source}")]
    Sequencer {
        /// The underlying sequencer error.
        #[from]
        source: SequencerError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `phenology-config.yaml`. Every section has
/// defaults, so an empty file yields a runnable wheat-like simulation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PhenologyConfig {
    /// Run-level settings.
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// The crop: sowing details and the phase chain.
    #[serde(default)]
    pub crop: CropConfig,

    /// Synthetic weather used by replicate runs.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PhenologyConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.simulation.replicates == 0 {
            return invalid("simulation.replicates must be at least 1");
        }
        if self.simulation.max_days == 0 {
            return invalid("simulation.max_days must be at least 1");
        }
        if self.simulation.max_transitions_per_day == 0 {
            return invalid("simulation.max_transitions_per_day must be at least 1");
        }
        let tolerance = self.simulation.conservation_tolerance;
        if tolerance.is_nan() || tolerance <= 0.0 {
            return invalid("simulation.conservation_tolerance must be positive");
        }
        if !self.crop.sowing_depth.is_finite() || self.crop.sowing_depth < 0.0 {
            return invalid("crop.sowing_depth must be a non-negative number");
        }
        if self.crop.phases.is_empty() {
            return invalid("crop.phases must list at least one phase");
        }
        for phase in &self.crop.phases {
            phase.validate()?;
        }
        let unit = |p: f64| (0.0..=1.0).contains(&p);
        let weather = &self.weather;
        if !unit(weather.wet_soil_probability)
            || !unit(weather.stress_probability)
            || !unit(weather.stress_factor)
        {
            return invalid("weather probabilities and stress_factor must lie in [0, 1]");
        }
        let rates = [
            weather.mean_thermal_time,
            weather.thermal_time_spread,
            weather.leaf_appearance_rate,
            weather.final_leaf_number,
            weather.leaf_death_rate,
            weather.vernalisation_rate,
        ];
        if rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return invalid("weather rates must be non-negative numbers");
        }
        Ok(())
    }

    /// Sequencer settings from the `simulation` section.
    pub const fn sequencer_settings(&self) -> SequencerSettings {
        SequencerSettings {
            max_transitions_per_day: self.simulation.max_transitions_per_day,
            conservation_tolerance: self.simulation.conservation_tolerance,
            strict_conservation: self.simulation.strict_conservation,
        }
    }

    /// Build the configured phase chain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if a phase lacks a required
    /// rate or target.
    pub fn build_phases(&self) -> Result<Vec<Box<dyn Phase>>, ConfigError> {
        self.crop
            .phases
            .iter()
            .map(|spec| spec.build(&self.crop))
            .collect()
    }

    /// Build a sequencer over the configured chain. The crop is not sown.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a phase cannot be built or the chain is
    /// rejected (duplicate names, unresolved jump targets).
    pub fn build_sequencer(&self) -> Result<Sequencer, ConfigError> {
        Ok(Sequencer::new(
            self.build_phases()?,
            self.sequencer_settings(),
        )?)
    }
}

// ---------------------------------------------------------------------------
// simulation
// ---------------------------------------------------------------------------

/// Run-level settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationSettings {
    /// Human-readable run name.
    #[serde(default = "default_run_name")]
    pub name: String,

    /// Base random seed; replicate `n` uses `seed + n`.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of independent replicates.
    #[serde(default = "default_replicates")]
    pub replicates: u32,

    /// Hard stop after this many simulated days.
    #[serde(default = "default_max_days")]
    pub max_days: u64,

    /// Phase transitions allowed in one day.
    #[serde(default = "default_max_transitions_per_day")]
    pub max_transitions_per_day: usize,

    /// Tolerance for the daily conservation check.
    #[serde(default = "default_conservation_tolerance")]
    pub conservation_tolerance: f64,

    /// Also check the hand-off chain, not just the daily sum.
    #[serde(default = "default_strict_conservation")]
    pub strict_conservation: bool,

    /// End the season once this stage is passed.
    #[serde(default)]
    pub stop_stage: Option<String>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            name: default_run_name(),
            seed: default_seed(),
            replicates: default_replicates(),
            max_days: default_max_days(),
            max_transitions_per_day: default_max_transitions_per_day(),
            conservation_tolerance: default_conservation_tolerance(),
            strict_conservation: default_strict_conservation(),
            stop_stage: None,
        }
    }
}

fn default_run_name() -> String {
    "Wheat".to_owned()
}
const fn default_seed() -> u64 {
    42
}
const fn default_replicates() -> u32 {
    4
}
const fn default_max_days() -> u64 {
    400
}
const fn default_max_transitions_per_day() -> usize {
    DEFAULT_MAX_TRANSITIONS_PER_DAY
}
const fn default_conservation_tolerance() -> f64 {
    phenology_ledger::DEFAULT_TOLERANCE
}
const fn default_strict_conservation() -> bool {
    true
}

// ---------------------------------------------------------------------------
// crop
// ---------------------------------------------------------------------------

/// Sowing details and the ordered phase chain.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CropConfig {
    /// Sowing date (day 1 of the season).
    #[serde(default = "default_sowing_date")]
    pub sowing_date: NaiveDate,

    /// Sowing depth in millimetres.
    #[serde(default = "default_sowing_depth")]
    pub sowing_depth: f64,

    /// Force germination on this date.
    #[serde(default)]
    pub germination_date: Option<NaiveDate>,

    /// Force emergence on this date. Also forces germination on the
    /// sowing date unless a germination date is given.
    #[serde(default)]
    pub emergence_date: Option<NaiveDate>,

    /// The phase chain, in order.
    #[serde(default = "default_phases")]
    pub phases: Vec<PhaseSpec>,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            sowing_date: default_sowing_date(),
            sowing_depth: default_sowing_depth(),
            germination_date: None,
            emergence_date: None,
            phases: default_phases(),
        }
    }
}

impl CropConfig {
    /// The germination date in force after applying the emergence override.
    pub fn effective_germination_date(&self) -> Option<NaiveDate> {
        self.germination_date
            .or_else(|| self.emergence_date.map(|_| self.sowing_date))
    }
}

fn default_sowing_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_default()
}
const fn default_sowing_depth() -> f64 {
    30.0
}

/// A wheat-like chain from sowing to harvest-ripe.
fn default_phases() -> Vec<PhaseSpec> {
    let thermal = |name: &str, start: &str, end: &str, target: f64| {
        PhaseSpec::new(
            name,
            start,
            end,
            PhaseRule::Generic {
                rate: Some(RateSpec::ThermalTime),
                target: Some(target),
                below_ground: false,
            },
        )
    };
    vec![
        PhaseSpec::new("Germinating", "Sowing", "Germination", PhaseRule::Germinating),
        PhaseSpec::new(
            "Emerging",
            "Germination",
            "Emergence",
            PhaseRule::Emerging {
                shoot_lag: Some(40.0),
                shoot_rate: Some(1.5),
            },
        ),
        PhaseSpec::new(
            "Vegetative",
            "Emergence",
            "TerminalSpikelet",
            PhaseRule::Vernalisation {
                min_haun_stage: None,
                minimum_stage: None,
            },
        ),
        PhaseSpec::new(
            "StemElongation",
            "TerminalSpikelet",
            "FlagLeaf",
            PhaseRule::LeafAppearance {
                remaining_leaves: Some(0.0),
            },
        ),
        thermal("EarlyReproductive", "FlagLeaf", "Flowering", 200.0),
        thermal("GrainDevelopment", "Flowering", "StartGrainFill", 120.0),
        thermal("GrainFilling", "StartGrainFill", "EndGrainFill", 545.0),
        thermal("Maturing", "EndGrainFill", "Maturity", 35.0),
        thermal("Ripening", "Maturity", "HarvestRipe", 1.0),
        PhaseSpec::new("ReadyForHarvesting", "HarvestRipe", "Unused", PhaseRule::End),
    ]
}

/// One entry of `crop.phases`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhaseSpec {
    /// Phase name, unique within the chain.
    pub name: String,
    /// Stage that opens the phase.
    pub start: String,
    /// Stage that closes the phase.
    pub end: String,
    /// Kind-specific settings.
    #[serde(flatten)]
    pub rule: PhaseRule,
}

/// How a phase decides it is complete, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhaseRule {
    /// Rate accumulated towards a fixed target.
    Generic {
        /// Daily progress rate.
        rate: Option<RateSpec>,
        /// Target progress.
        target: Option<f64>,
        /// The plant is below ground during this phase.
        #[serde(default)]
        below_ground: bool,
    },
    /// Thermal time to a sowing-depth target.
    Emerging {
        /// Thermal time before shoot elongation (degree-days).
        shoot_lag: Option<f64>,
        /// Thermal time per millimetre of depth.
        shoot_rate: Option<f64>,
    },
    /// Soil-water gated germination.
    Germinating,
    /// Leaf tips until a set number of leaves remain to appear.
    LeafAppearance {
        /// Leaves still to appear at completion.
        remaining_leaves: Option<f64>,
    },
    /// Leaf tips until a fixed tip number.
    NodeNumber {
        /// Tip number at completion.
        leaf_number: Option<f64>,
    },
    /// Dead leaves until a share of the final leaf number.
    LeafDeath {
        /// Share of the final leaf number that must be dead.
        #[serde(default = "default_dead_leaf_fraction")]
        dead_leaf_fraction: f64,
    },
    /// The vernalisation model's own completion flag.
    Vernalisation {
        /// Minimum Haun stage for the duration indicator.
        min_haun_stage: Option<f64>,
        /// Do not complete before this stage.
        minimum_stage: Option<String>,
    },
    /// Day length crossing a threshold.
    Photoperiod {
        /// Day-length threshold in hours.
        threshold: Option<f64>,
        /// Which way day length must cross.
        #[serde(default)]
        direction: PhotoperiodDirection,
    },
    /// Jump to the phase opening `target_stage`.
    Goto {
        /// Stage to jump to.
        target_stage: Option<String>,
    },
    /// Terminal phase.
    End,
}

const fn default_dead_leaf_fraction() -> f64 {
    1.0
}

/// Daily progress rate of a generic phase.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSpec {
    /// Daily thermal time.
    ThermalTime,
    /// Daily thermal time scaled by the stress multiplier.
    StressedThermalTime,
    /// Leaf appearance rate from the canopy.
    LeafAppearance,
    /// A fixed amount per day.
    Constant(f64),
}

impl RateSpec {
    const fn constant(self) -> Option<f64> {
        match self {
            Self::Constant(rate) => Some(rate),
            Self::ThermalTime | Self::StressedThermalTime | Self::LeafAppearance => None,
        }
    }

    fn source(self) -> Box<dyn ProgressSource> {
        match self {
            Self::ThermalTime => Box::new(ThermalTime),
            Self::StressedThermalTime => Box::new(StressedThermalTime),
            Self::LeafAppearance => Box::new(LeafAppearanceRate),
            Self::Constant(rate) => Box::new(ConstantRate(rate)),
        }
    }
}

impl PhaseSpec {
    /// Create a phase entry.
    pub fn new(
        name: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        rule: PhaseRule,
    ) -> Self {
        Self {
            name: name.into(),
            start: start.into(),
            end: end.into(),
            rule,
        }
    }

    fn labels(&self) -> PhaseLabels {
        PhaseLabels::new(
            self.name.clone(),
            self.start.clone(),
            self.end.clone(),
        )
    }

    fn require<T>(&self, value: Option<T>, field: &'static str) -> Result<T, ConfigError> {
        value.ok_or_else(|| ConfigError::MissingField {
            phase: self.name.clone(),
            field,
        })
    }

    /// Reject negative or non-finite numeric settings. Absent fields are left
    /// to [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the phase and field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields: Vec<(&str, Option<f64>)> = match &self.rule {
            PhaseRule::Generic { rate, target, .. } => {
                vec![("target", *target), ("rate", rate.and_then(RateSpec::constant))]
            }
            PhaseRule::Emerging {
                shoot_lag,
                shoot_rate,
            } => vec![("shoot_lag", *shoot_lag), ("shoot_rate", *shoot_rate)],
            PhaseRule::LeafAppearance { remaining_leaves } => {
                vec![("remaining_leaves", *remaining_leaves)]
            }
            PhaseRule::NodeNumber { leaf_number } => vec![("leaf_number", *leaf_number)],
            PhaseRule::LeafDeath { dead_leaf_fraction } => {
                if !(0.0..=1.0).contains(dead_leaf_fraction) {
                    return Err(ConfigError::Invalid {
                        reason: format!(
                            "phase `{}`: dead_leaf_fraction must lie in [0, 1], got {dead_leaf_fraction}",
                            self.name
                        ),
                    });
                }
                Vec::new()
            }
            PhaseRule::Vernalisation { min_haun_stage, .. } => {
                vec![("min_haun_stage", *min_haun_stage)]
            }
            PhaseRule::Photoperiod { threshold, .. } => vec![("threshold", *threshold)],
            PhaseRule::Germinating | PhaseRule::Goto { .. } | PhaseRule::End => Vec::new(),
        };
        for (field, value) in fields {
            if let Some(v) = value.filter(|v| !v.is_finite() || *v < 0.0) {
                return Err(ConfigError::Invalid {
                    reason: format!(
                        "phase `{}`: {field} must be a non-negative number, got {v}",
                        self.name
                    ),
                });
            }
        }
        Ok(())
    }

    /// Build the phase this entry describes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if a required field is absent,
    /// or [`ConfigError::Invalid`] if a numeric setting is negative.
    pub fn build(&self, crop: &CropConfig) -> Result<Box<dyn Phase>, ConfigError> {
        self.validate()?;
        let labels = self.labels();
        let phase: Box<dyn Phase> = match &self.rule {
            PhaseRule::Generic {
                rate,
                target,
                below_ground,
            } => {
                let rate = self.require(*rate, "rate")?;
                let target = self.require(*target, "target")?;
                let phase =
                    GenericPhase::new(labels, rate.source(), Box::new(FixedTarget(target)));
                if *below_ground {
                    Box::new(phase.below_ground())
                } else {
                    Box::new(phase)
                }
            }
            PhaseRule::Emerging {
                shoot_lag,
                shoot_rate,
            } => {
                let target = SowingDepthTarget {
                    shoot_lag: self.require(*shoot_lag, "shoot_lag")?,
                    shoot_rate: self.require(*shoot_rate, "shoot_rate")?,
                    sowing_depth: crop.sowing_depth,
                };
                Box::new(EmergingPhase::new(labels, target).with_emergence_date(crop.emergence_date))
            }
            PhaseRule::Germinating => Box::new(
                GerminatingPhase::new(labels)
                    .with_germination_date(crop.effective_germination_date()),
            ),
            PhaseRule::LeafAppearance { remaining_leaves } => Box::new(LeafNumberPhase::new(
                labels,
                LeafTarget::RemainingLeaves(self.require(*remaining_leaves, "remaining_leaves")?),
            )),
            PhaseRule::NodeNumber { leaf_number } => Box::new(LeafNumberPhase::new(
                labels,
                LeafTarget::TipNumber(self.require(*leaf_number, "leaf_number")?),
            )),
            PhaseRule::LeafDeath { dead_leaf_fraction } => {
                Box::new(LeafDeathPhase::new(labels).with_dead_leaf_fraction(*dead_leaf_fraction))
            }
            PhaseRule::Vernalisation {
                min_haun_stage,
                minimum_stage,
            } => {
                let mut phase = VernalisationPhase::new(labels);
                if let Some(haun) = min_haun_stage {
                    phase = phase.with_min_haun_stage(*haun);
                }
                if let Some(stage) = minimum_stage {
                    phase = phase.with_minimum_stage(stage.clone());
                }
                Box::new(phase)
            }
            PhaseRule::Photoperiod {
                threshold,
                direction,
            } => Box::new(PhotoperiodPhase::new(
                labels,
                self.require(*threshold, "threshold")?,
                *direction,
            )),
            PhaseRule::Goto { target_stage } => Box::new(GotoPhase::new(
                labels,
                self.require(target_stage.clone(), "target_stage")?,
            )),
            PhaseRule::End => Box::new(EndPhase::new(labels)),
        };
        Ok(phase)
    }
}

// ---------------------------------------------------------------------------
// weather
// ---------------------------------------------------------------------------

/// Parameters of the synthetic daily forcing used by replicate runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherConfig {
    /// Mean daily thermal time (degree-days).
    #[serde(default = "default_mean_thermal_time")]
    pub mean_thermal_time: f64,

    /// Day-to-day spread of thermal time (degree-days).
    #[serde(default = "default_thermal_time_spread")]
    pub thermal_time_spread: f64,

    /// Day length on the sowing date (hours).
    #[serde(default = "default_initial_photoperiod")]
    pub initial_photoperiod: f64,

    /// Change in day length per day (hours).
    #[serde(default = "default_photoperiod_change")]
    pub photoperiod_change: f64,

    /// Probability that the seed layer is wetter than its lower limit.
    #[serde(default = "default_wet_soil_probability")]
    pub wet_soil_probability: f64,

    /// Probability of a stressed day.
    #[serde(default = "default_stress_probability")]
    pub stress_probability: f64,

    /// Stress multiplier applied on stressed days.
    #[serde(default = "default_stress_factor")]
    pub stress_factor: f64,

    /// Leaf tips per degree-day.
    #[serde(default = "default_leaf_appearance_rate")]
    pub leaf_appearance_rate: f64,

    /// Final leaf number of the main stem.
    #[serde(default = "default_final_leaf_number")]
    pub final_leaf_number: f64,

    /// Leaves dying per degree-day once all leaves have appeared.
    #[serde(default = "default_leaf_death_rate")]
    pub leaf_death_rate: f64,

    /// Vernalisation progress per degree-day while cool.
    #[serde(default = "default_vernalisation_rate")]
    pub vernalisation_rate: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            mean_thermal_time: default_mean_thermal_time(),
            thermal_time_spread: default_thermal_time_spread(),
            initial_photoperiod: default_initial_photoperiod(),
            photoperiod_change: default_photoperiod_change(),
            wet_soil_probability: default_wet_soil_probability(),
            stress_probability: default_stress_probability(),
            stress_factor: default_stress_factor(),
            leaf_appearance_rate: default_leaf_appearance_rate(),
            final_leaf_number: default_final_leaf_number(),
            leaf_death_rate: default_leaf_death_rate(),
            vernalisation_rate: default_vernalisation_rate(),
        }
    }
}

const fn default_mean_thermal_time() -> f64 {
    14.0
}
const fn default_thermal_time_spread() -> f64 {
    4.0
}
const fn default_initial_photoperiod() -> f64 {
    10.5
}
const fn default_photoperiod_change() -> f64 {
    0.03
}
const fn default_wet_soil_probability() -> f64 {
    0.6
}
const fn default_stress_probability() -> f64 {
    0.1
}
const fn default_stress_factor() -> f64 {
    0.7
}
const fn default_leaf_appearance_rate() -> f64 {
    0.01
}
const fn default_final_leaf_number() -> f64 {
    10.0
}
const fn default_leaf_death_rate() -> f64 {
    0.02
}
const fn default_vernalisation_rate() -> f64 {
    0.004
}

// ---------------------------------------------------------------------------
// logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive (overridden by `RUST_LOG`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use phenology_types::PhaseKind;

    use super::*;

    #[test]
    fn empty_yaml_gives_default_chain() {
        let config = PhenologyConfig::parse("{}").unwrap();
        assert_eq!(config.simulation.max_transitions_per_day, 64);
        assert_eq!(config.crop.phases.len(), 10);
        let seq = config.build_sequencer().unwrap();
        assert_eq!(seq.phase_count(), 10);
        assert!(seq.is_before_stage("Emergence").unwrap());
        let kinds: Vec<PhaseKind> = seq.phases().map(|p| p.kind()).collect();
        assert_eq!(kinds.first(), Some(&PhaseKind::Germinating));
        assert_eq!(kinds.last(), Some(&PhaseKind::End));
    }

    #[test]
    fn parses_phase_list() {
        let yaml = r"
simulation:
  name: Test
  seed: 7
  replicates: 2
crop:
  sowing_date: 2023-06-15
  sowing_depth: 40.0
  phases:
    - name: Germinating
      start: Sowing
      end: Germination
      kind: germinating
    - name: Emerging
      start: Germination
      end: Emergence
      kind: emerging
      shoot_lag: 40.0
      shoot_rate: 1.5
    - name: Juvenile
      start: Emergence
      end: Floral
      kind: generic
      rate: stressed_thermal_time
      target: 300.0
    - name: Daylength
      start: Floral
      end: Flowering
      kind: photoperiod
      threshold: 13.5
      direction: decreasing
    - name: Regrow
      start: Flowering
      end: Cut
      kind: goto
      target_stage: Emergence
";
        let config = PhenologyConfig::parse(yaml).unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(
            config.crop.sowing_date,
            NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()
        );
        assert_eq!(config.crop.phases.len(), 5);
        assert!(matches!(
            config.crop.phases.get(2).map(|p| &p.rule),
            Some(PhaseRule::Generic {
                rate: Some(RateSpec::StressedThermalTime),
                ..
            })
        ));
        let seq = config.build_sequencer().unwrap();
        let emerging = seq.phase_starting_with("Germination").unwrap();
        assert_eq!(emerging.kind(), PhaseKind::Emerging);
    }

    #[test]
    fn missing_target_is_reported_by_phase() {
        let yaml = r"
crop:
  phases:
    - { name: Juvenile, start: Emergence, end: Floral, kind: generic, rate: thermal_time }
    - { name: Done, start: Floral, end: Unused, kind: end }
";
        let config = PhenologyConfig::parse(yaml).unwrap();
        let err = config.build_phases().unwrap_err();
        match err {
            ConfigError::MissingField { phase, field } => {
                assert_eq!(phase, "Juvenile");
                assert_eq!(field, "target");
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_goto_is_a_chain_error() {
        let yaml = r"
crop:
  phases:
    - { name: Juvenile, start: Emergence, end: Floral, kind: generic, rate: thermal_time, target: 10.0 }
    - { name: Back, start: Floral, end: Never, kind: goto, target_stage: Nowhere }
";
        let config = PhenologyConfig::parse(yaml).unwrap();
        assert!(matches!(
            config.build_sequencer(),
            Err(ConfigError::Sequencer {
                source: SequencerError::UnknownStage { .. }
            })
        ));
    }

    #[test]
    fn negative_phase_settings_are_rejected() {
        for rule in [
            "kind: node_number, leaf_number: -3.0",
            "kind: leaf_appearance, remaining_leaves: -1.0",
            "kind: photoperiod, threshold: -2.0",
            "kind: vernalisation, min_haun_stage: -0.5",
            "kind: generic, rate: { constant: -1.0 }, target: 10.0",
            "kind: leaf_death, dead_leaf_fraction: 1.5",
        ] {
            let yaml = format!("crop:\n  phases:\n    - {{ name: Bad, start: A, end: B, {rule} }}\n");
            match PhenologyConfig::parse(&yaml) {
                Err(ConfigError::Invalid { reason }) => assert!(reason.contains("`Bad`"), "{reason}"),
                other => panic!("Expected Invalid for {rule}, got {other:?}"),
            }
        }
    }

    #[test]
    fn negative_settings_fail_at_build_without_parse() {
        let mut config = PhenologyConfig::default();
        config.crop.phases = vec![PhaseSpec::new(
            "Nodes",
            "Emergence",
            "FifthLeaf",
            PhaseRule::NodeNumber {
                leaf_number: Some(-3.0),
            },
        )];
        assert!(matches!(
            config.build_phases(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            PhenologyConfig::parse("simulation: { replicates: 0 }"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            PhenologyConfig::parse("crop: { sowing_depth: -1.0 }"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            PhenologyConfig::parse("simulation: [1, 2"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn emergence_override_forces_germination_on_sowing_date() {
        let crop = CropConfig {
            emergence_date: NaiveDate::from_ymd_opt(2024, 5, 10),
            ..CropConfig::default()
        };
        assert_eq!(crop.effective_germination_date(), Some(crop.sowing_date));

        let explicit = CropConfig {
            germination_date: NaiveDate::from_ymd_opt(2024, 5, 3),
            ..crop
        };
        assert_eq!(
            explicit.effective_germination_date(),
            NaiveDate::from_ymd_opt(2024, 5, 3)
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PhenologyConfig::from_file(Path::new("/nonexistent/phenology.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
