//! Per-guild responses to water and crowding.

use patient_world_core::{GrowthTuning, ProducerProfile};

use crate::factors::clamp01;

const MIN_BAND: f64 = 1e-3;

/// Growth multiplier of a guild at the given smoothed water level.
///
/// Zero outside the open tolerance band, one at the optimum, and a linear
/// ramp with a `0.15` floor in between so stressed guilds still creep forward.
#[must_use]
pub fn water_response(profile: &ProducerProfile, water: f64) -> f64 {
    let water = clamp01(water);
    let tolerance = profile.water_tolerance;
    let min = tolerance.min.min(tolerance.max - MIN_BAND).max(0.0);
    let max = tolerance.max.max(min + MIN_BAND).min(1.0);
    let optimum = profile.water_optimum.max(min).min(max);

    if water <= min || water >= max {
        return 0.0;
    }
    if water == optimum {
        return 1.0;
    }
    let normalized = if water < optimum {
        (water - min) / (optimum - min).max(MIN_BAND)
    } else {
        (max - water) / (max - optimum).max(MIN_BAND)
    };
    clamp01(0.15 + 0.85 * normalized)
}

/// Logistic growth penalty for a layer holding `total` against `capacity`.
#[must_use]
pub fn crowding_penalty(total: u32, capacity: u32, tuning: &GrowthTuning) -> f64 {
    let ratio = (f64::from(total) / f64::from(capacity.max(1))).min(tuning.crowding_ratio_cap);
    let logistic =
        1.0 / (1.0 + (tuning.crowding_steepness * (ratio - tuning.crowding_midpoint)).exp());
    logistic.max(tuning.crowding_floor)
}
