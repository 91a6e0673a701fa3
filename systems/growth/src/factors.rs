//! Environmental factors feeding the per-cell resource multiplier.

use std::f64::consts::PI;

use patient_world_core::{GrowthFactor, GrowthTuning, Layer, LimitingFactor};
use rand::Rng;

/// Smooth seasonal growth curve in `[0.25, 1]`, lowest at the start of the season.
#[must_use]
pub fn season_factor(phase: f64) -> f64 {
    clamp01(0.25 + 0.75 * (0.5 + 0.5 * (2.0 * PI * phase - PI / 2.0).sin()))
}

/// Ambient temperature of the season in `[0.4, 1]`.
#[must_use]
pub fn ambient_temperature(phase: f64) -> f64 {
    clamp01(0.4 + 0.6 * (0.5 + 0.5 * (2.0 * PI * phase).sin()))
}

/// Alignment between the ambient temperature and a cell's fixed temperature.
#[must_use]
pub fn temperature_factor(ambient: f64, cell_temperature: f64) -> f64 {
    let delta = (ambient - clamp01(cell_temperature)).abs();
    clamp01(1.0 - delta * 1.5)
}

/// Facilitation from the ground cover of a cell and its neighbours.
///
/// Cells without neighbours receive a neutral `0.5`.
#[must_use]
pub fn facilitation_factor(local_ground: u32, neighbor_ground: &[u32]) -> f64 {
    if neighbor_ground.is_empty() {
        return 0.5;
    }
    let cap = f64::from(Layer::Ground.base_capacity());
    let neighbor_total: f64 = neighbor_ground.iter().map(|total| f64::from(*total)).sum();
    let neighbor_density = neighbor_total / (neighbor_ground.len() as f64 * cap);
    let local_density = f64::from(local_ground) / cap;
    clamp01(0.2 + 0.5 * neighbor_density + 0.3 * local_density)
}

/// Factor values observed for one cell on one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FactorReadings {
    /// Soil fertility.
    pub fertility: f64,
    /// Temperature alignment.
    pub temperature: f64,
    /// Season factor.
    pub season: f64,
    /// Neighbour facilitation.
    pub facilitation: f64,
    /// Smoothed water; reported as limiting but never blocks the multiplier.
    pub water: f64,
}

impl FactorReadings {
    /// Value observed for `factor`.
    #[must_use]
    pub fn value(&self, factor: GrowthFactor) -> f64 {
        match factor {
            GrowthFactor::Facilitation => self.facilitation,
            GrowthFactor::Fertility => self.fertility,
            GrowthFactor::Season => self.season,
            GrowthFactor::Temperature => self.temperature,
            GrowthFactor::Water => self.water,
        }
    }

    /// Factor with the lowest value; ties go to the lexicographically first name.
    #[must_use]
    pub fn limiting(&self) -> LimitingFactor {
        let mut limiting = LimitingFactor {
            factor: GrowthFactor::ALL[0],
            value: self.value(GrowthFactor::ALL[0]),
        };
        for factor in GrowthFactor::ALL.into_iter().skip(1) {
            let value = self.value(factor);
            if value < limiting.value {
                limiting = LimitingFactor { factor, value };
            }
        }
        limiting
    }

    fn blocking(&self) -> [f64; 4] {
        [self.fertility, self.temperature, self.season, self.facilitation]
    }
}

/// Combines the blocking factors into one growth multiplier.
///
/// Returns `0` when any factor sits at or below the block threshold or the
/// running product of clamped terms falls to the multiplier block threshold.
/// Noise is drawn only for multipliers that survive both checks.
pub fn resource_multiplier(
    readings: &FactorReadings,
    tuning: &GrowthTuning,
    rng: &mut impl Rng,
) -> f64 {
    let factors = readings.blocking();
    if factors
        .iter()
        .any(|value| *value <= tuning.factor_block_threshold)
    {
        return 0.0;
    }

    let mut multiplier = 1.0;
    for value in factors {
        multiplier *= (0.5 + value * 0.9).clamp(tuning.multiplier_min, tuning.multiplier_max);
        if multiplier <= tuning.multiplier_block_threshold {
            return 0.0;
        }
    }

    if tuning.noise_enabled() {
        multiplier *= 1.0 + rng.gen_range(-tuning.noise_scale..=tuning.noise_scale);
    }
    multiplier
}

pub(crate) fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
