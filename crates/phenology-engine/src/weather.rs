//! Synthetic daily forcing for replicate runs.
//!
//! Each replicate owns a [`SyntheticWeather`] seeded from the run seed and
//! its replicate number, so the same configuration always reproduces the
//! same seasons. Besides thermal time, the generator carries the simple
//! collaborator states the phases read:
//!
//! | Input            | Model                                                    |
//! |------------------|----------------------------------------------------------|
//! | Thermal time     | `mean ± spread`, uniform, floored at 0                   |
//! | Stress           | `stress_factor` with probability `stress_probability`   |
//! | Photoperiod      | linear drift from `initial_photoperiod`, within 0..24 h |
//! | Seed-layer water | wet with probability `wet_soil_probability`             |
//! | Leaf tips        | `leaf_appearance_rate × tt`, capped at final leaf number |
//! | Dead leaves      | start once every leaf has appeared                       |
//! | Vernalisation    | `vernalisation_rate × tt`, saturating at 1              |

use chrono::NaiveDate;
use phenology_core::config::WeatherConfig;
use phenology_core::runner::{DailyInputSource, InputError};
use phenology_types::{CanopyState, DailyInputs, SoilWaterState, VernalisationState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Water content of a wet seed layer (mm/mm).
const WET_SOIL: f64 = 0.30;
/// Water content of a dry seed layer (mm/mm).
const DRY_SOIL: f64 = 0.05;
/// Lower limit of the seed layer (mm/mm).
const LOWER_LIMIT: f64 = 0.10;
/// Methylated Vrn1 at which the plant counts as vernalised.
const VERNALISATION_SATURATION: f64 = 1.0;

/// Seeded generator of [`DailyInputs`].
#[derive(Debug, Clone)]
pub struct SyntheticWeather {
    rng: StdRng,
    config: WeatherConfig,
    days: u32,
    leaf_tips: f64,
    dead_leaves: f64,
    methylated_vrn1: f64,
}

impl SyntheticWeather {
    /// Create a generator from `seed`.
    pub fn new(seed: u64, config: WeatherConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
            days: 0,
            leaf_tips: 0.0,
            dead_leaves: 0.0,
            methylated_vrn1: 0.0,
        }
    }

    /// Generate the inputs for `date` and advance the internal state.
    pub fn next_day(&mut self, date: NaiveDate) -> DailyInputs {
        let cfg = &self.config;
        let swing = self.rng.random::<f64>().mul_add(2.0, -1.0);
        let tt = swing.mul_add(cfg.thermal_time_spread, cfg.mean_thermal_time).max(0.0);

        let stress = if self.rng.random::<f64>() < cfg.stress_probability {
            cfg.stress_factor
        } else {
            1.0
        };
        let photoperiod = cfg
            .photoperiod_change
            .mul_add(f64::from(self.days), cfg.initial_photoperiod)
            .clamp(0.0, 24.0);
        let water = if self.rng.random::<f64>() < cfg.wet_soil_probability {
            WET_SOIL
        } else {
            DRY_SOIL
        };

        let appearance = cfg.leaf_appearance_rate * tt;
        let fln = cfg.final_leaf_number;
        if self.leaf_tips >= fln {
            self.dead_leaves = cfg.leaf_death_rate.mul_add(tt, self.dead_leaves).min(fln);
        }
        self.leaf_tips = (self.leaf_tips + appearance).min(fln);
        self.methylated_vrn1 = cfg
            .vernalisation_rate
            .mul_add(tt, self.methylated_vrn1)
            .min(VERNALISATION_SATURATION);
        self.days = self.days.saturating_add(1);

        DailyInputs::new(date, tt)
            .with_stress(stress)
            .with_photoperiod(photoperiod)
            .with_soil(SoilWaterState::new(water, LOWER_LIMIT))
            .with_canopy(CanopyState {
                leaf_tip_number: self.leaf_tips,
                leaf_appearance_rate: appearance,
                final_leaf_number: fln,
                dead_leaf_number: self.dead_leaves,
            })
            .with_vernalisation(VernalisationState {
                methylated_vrn1: self.methylated_vrn1,
                saturation_target: VERNALISATION_SATURATION,
                haun_stage: self.leaf_tips,
                is_vernalised: self.methylated_vrn1 >= VERNALISATION_SATURATION,
            })
    }
}

impl DailyInputSource for SyntheticWeather {
    fn inputs_for(
        &mut self,
        _day: u64,
        date: NaiveDate,
    ) -> Result<Option<DailyInputs>, InputError> {
        Ok(Some(self.next_day(date)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn season(seed: u64, days: usize) -> Vec<DailyInputs> {
        let mut weather = SyntheticWeather::new(seed, WeatherConfig::default());
        start().iter_days().take(days).map(|d| weather.next_day(d)).collect()
    }

    #[test]
    fn same_seed_same_season() {
        assert_eq!(season(42, 60), season(42, 60));
        assert_ne!(season(42, 60), season(43, 60));
    }

    #[test]
    fn inputs_stay_in_range() {
        let config = WeatherConfig::default();
        for inputs in season(7, 300) {
            assert!(inputs.thermal_time >= 0.0);
            assert!((0.0..=1.0).contains(&inputs.stress));
            assert!((0.0..=24.0).contains(&inputs.photoperiod));
            let canopy = inputs.canopy.unwrap();
            assert!(canopy.leaf_tip_number <= config.final_leaf_number);
            assert!(canopy.dead_leaf_number <= canopy.leaf_tip_number);
        }
    }

    #[test]
    fn leaves_and_vernalisation_only_grow() {
        let days = season(9, 200);
        for pair in days.windows(2) {
            if let [a, b] = pair {
                let (ca, cb) = (a.canopy.unwrap(), b.canopy.unwrap());
                assert!(cb.leaf_tip_number >= ca.leaf_tip_number);
                assert!(cb.dead_leaf_number >= ca.dead_leaf_number);
                let (va, vb) = (a.vernalisation.unwrap(), b.vernalisation.unwrap());
                assert!(vb.methylated_vrn1 >= va.methylated_vrn1);
            }
        }
        let last = days.last().unwrap().vernalisation.unwrap();
        assert!(last.is_vernalised);
    }
}
