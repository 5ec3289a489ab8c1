//! Injected rate and target sources.
//!
//! Target-accumulation phases are built by composition: a generic
//! accumulator paired with a [`ProgressSource`] (how much progress one whole
//! day is worth) and a [`TargetSource`] (how much progress completes the
//! phase). Both are sampled exactly once per invocation.

use crate::context::PhaseContext;
use crate::error::SourceError;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Supplies the raw progress rate for a whole day.
pub trait ProgressSource: core::fmt::Debug + Send {
    /// Progress units per whole day under today's conditions.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if an input is missing or invalid.
    fn daily_rate(&self, ctx: &PhaseContext<'_>) -> Result<f64, SourceError>;
}

/// Supplies the progress target that completes a phase.
pub trait TargetSource: core::fmt::Debug + Send {
    /// Target in the same units as the paired progress source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if an input is missing or invalid.
    fn target(&self, ctx: &PhaseContext<'_>) -> Result<f64, SourceError>;

    /// The target when it does not depend on the day, for reporting before
    /// the first step.
    fn known_target(&self) -> Option<f64> {
        None
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Reject non-finite or negative values.
pub fn non_negative(what: &'static str, value: f64) -> Result<f64, SourceError> {
    if !value.is_finite() {
        return Err(SourceError::NotFinite { what, value });
    }
    if value < 0.0 {
        return Err(SourceError::Negative { what, value });
    }
    Ok(value)
}

/// Reject values outside `[0, 1]`.
pub fn unit_interval(what: &'static str, value: f64) -> Result<f64, SourceError> {
    if !value.is_finite() {
        return Err(SourceError::NotFinite { what, value });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(SourceError::OutOfRange {
            what,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Progress sources
// ---------------------------------------------------------------------------

/// Daily thermal time, unscaled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalTime;

impl ProgressSource for ThermalTime {
    fn daily_rate(&self, ctx: &PhaseContext<'_>) -> Result<f64, SourceError> {
        non_negative("thermal time", ctx.inputs.thermal_time)
    }
}

/// Daily thermal time scaled by the day's stress multiplier.
#[derive(Debug, Clone, Copy, Default)]
pub struct StressedThermalTime;

impl ProgressSource for StressedThermalTime {
    fn daily_rate(&self, ctx: &PhaseContext<'_>) -> Result<f64, SourceError> {
        let tt = non_negative("thermal time", ctx.inputs.thermal_time)?;
        let stress = unit_interval("stress multiplier", ctx.inputs.stress)?;
        Ok(tt * stress)
    }
}

/// Leaves appearing per whole day, from the canopy snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeafAppearanceRate;

impl ProgressSource for LeafAppearanceRate {
    fn daily_rate(&self, ctx: &PhaseContext<'_>) -> Result<f64, SourceError> {
        let canopy = ctx
            .inputs
            .canopy
            .ok_or(SourceError::MissingInput("canopy"))?;
        non_negative("leaf appearance rate", canopy.leaf_appearance_rate)
    }
}

/// A fixed rate, independent of the day.
#[derive(Debug, Clone, Copy)]
pub struct ConstantRate(pub f64);

impl ProgressSource for ConstantRate {
    fn daily_rate(&self, _ctx: &PhaseContext<'_>) -> Result<f64, SourceError> {
        non_negative("constant rate", self.0)
    }
}

// ---------------------------------------------------------------------------
// Target sources
// ---------------------------------------------------------------------------

/// A target fixed at configuration time.
#[derive(Debug, Clone, Copy)]
pub struct FixedTarget(pub f64);

impl TargetSource for FixedTarget {
    fn target(&self, _ctx: &PhaseContext<'_>) -> Result<f64, SourceError> {
        non_negative("target", self.0)
    }

    fn known_target(&self) -> Option<f64> {
        Some(self.0)
    }
}

/// Thermal time for a shoot to reach the soil surface from the sowing depth:
/// `shoot_lag + sowing_depth * shoot_rate`.
#[derive(Debug, Clone, Copy)]
pub struct SowingDepthTarget {
    /// Thermal time before shoot elongation starts (degree-days).
    pub shoot_lag: f64,
    /// Thermal time per millimetre of depth (degree-days/mm).
    pub shoot_rate: f64,
    /// Sowing depth (mm).
    pub sowing_depth: f64,
}

impl TargetSource for SowingDepthTarget {
    fn target(&self, _ctx: &PhaseContext<'_>) -> Result<f64, SourceError> {
        let lag = non_negative("shoot lag", self.shoot_lag)?;
        let rate = non_negative("shoot rate", self.shoot_rate)?;
        let depth = non_negative("sowing depth", self.sowing_depth)?;
        Ok(rate.mul_add(depth, lag))
    }

    fn known_target(&self) -> Option<f64> {
        Some(self.shoot_rate.mul_add(self.sowing_depth, self.shoot_lag))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, date};
    use phenology_types::{CanopyState, DailyInputs};

    #[test]
    fn thermal_time_rejects_negative() {
        let h = Harness::new(DailyInputs::new(date(1), -1.0));
        let err = ThermalTime.daily_rate(&h.ctx()).unwrap_err();
        assert!(matches!(err, SourceError::Negative { .. }));
    }

    #[test]
    fn stress_scales_thermal_time() {
        let h = Harness::new(DailyInputs::new(date(1), 20.0).with_stress(0.25));
        let rate = StressedThermalTime.daily_rate(&h.ctx()).unwrap();
        assert!((rate - 5.0).abs() < 1e-12);
    }

    #[test]
    fn stress_outside_unit_interval_is_invalid() {
        let h = Harness::new(DailyInputs::new(date(1), 20.0).with_stress(1.5));
        let err = StressedThermalTime.daily_rate(&h.ctx()).unwrap_err();
        assert!(matches!(err, SourceError::OutOfRange { .. }));
    }

    #[test]
    fn leaf_rate_requires_canopy() {
        let h = Harness::new(DailyInputs::new(date(1), 20.0));
        let err = LeafAppearanceRate.daily_rate(&h.ctx()).unwrap_err();
        assert_eq!(err, SourceError::MissingInput("canopy"));

        let h = Harness::new(DailyInputs::new(date(1), 20.0).with_canopy(CanopyState {
            leaf_tip_number: 2.0,
            leaf_appearance_rate: 0.2,
            final_leaf_number: 10.0,
            dead_leaf_number: 0.0,
        }));
        assert!((LeafAppearanceRate.daily_rate(&h.ctx()).unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn sowing_depth_target() {
        let h = Harness::new(DailyInputs::new(date(1), 20.0));
        let target = SowingDepthTarget {
            shoot_lag: 40.0,
            shoot_rate: 1.5,
            sowing_depth: 30.0,
        };
        assert!((target.target(&h.ctx()).unwrap() - 85.0).abs() < 1e-12);
    }

    #[test]
    fn nan_is_rejected() {
        assert!(matches!(
            non_negative("x", f64::NAN),
            Err(SourceError::NotFinite { .. })
        ));
    }
}
