//! Tuning knobs for every simulation system, loadable from TOML.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of water samples kept per cell.
pub const DEFAULT_WATER_HISTORY_WINDOW: usize = 14;

/// Aggregated tuning for one simulation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Producer growth and resource competition.
    pub growth: GrowthTuning,
    /// Animal breeding modifiers.
    pub fauna: FaunaTuning,
    /// Lateral movement of mobile species.
    pub diffusion: DiffusionTuning,
    /// Water smoothing and drought reporting.
    pub water: WaterTuning,
}

impl SimulationConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// Missing sections and keys fall back to their defaults; unknown keys are rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every knob lies in its meaningful range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.growth.validate()?;
        self.fauna.validate()?;
        self.diffusion.validate()?;
        self.water.validate()
    }
}

/// Failures raised while loading a [`SimulationConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text could not be parsed into the configuration shape.
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value was parsed but lies outside its valid range.
    #[error("invalid simulation config: {0}")]
    Invalid(&'static str),
}

/// Parameters of the per-cell growth engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrowthTuning {
    /// Days in one recurring season.
    pub season_length: u32,
    /// Any environmental factor at or below this blocks growth for the tick.
    pub factor_block_threshold: f64,
    /// Running multiplier at or below this blocks growth for the tick.
    pub multiplier_block_threshold: f64,
    /// Lower clamp of each per-factor multiplier term.
    pub multiplier_min: f64,
    /// Upper clamp of each per-factor multiplier term.
    pub multiplier_max: f64,
    /// Half-width of the symmetric growth noise; zero disables noise.
    pub noise_scale: f64,
    /// Occupancy ratio at which the crowding penalty reaches one half.
    pub crowding_midpoint: f64,
    /// Steepness of the logistic crowding curve.
    pub crowding_steepness: f64,
    /// Smallest crowding penalty ever applied.
    pub crowding_floor: f64,
    /// Occupancy ratios above this are treated as this value.
    pub crowding_ratio_cap: f64,
    /// Biomass retained per tick when water is below the optimum and blocking.
    pub drought_stress_decay: f64,
    /// Biomass retained per tick when water is above the optimum and blocking.
    pub waterlog_stress_decay: f64,
    /// Fraction of the seed floor forced into an empty guild that failed to grow.
    pub extinction_seed_fraction: f64,
}

impl Default for GrowthTuning {
    fn default() -> Self {
        Self {
            season_length: 120,
            factor_block_threshold: 0.15,
            multiplier_block_threshold: 0.1,
            multiplier_min: 0.35,
            multiplier_max: 1.6,
            noise_scale: 0.10,
            crowding_midpoint: 0.85,
            crowding_steepness: 6.0,
            crowding_floor: 0.08,
            crowding_ratio_cap: 1.5,
            drought_stress_decay: 0.82,
            waterlog_stress_decay: 0.88,
            extinction_seed_fraction: 0.25,
        }
    }
}

impl GrowthTuning {
    /// Reports whether growth noise is injected.
    #[must_use]
    pub fn noise_enabled(&self) -> bool {
        self.noise_scale > 0.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.season_length == 0 {
            return Err(ConfigError::Invalid("growth.season_length must be positive"));
        }
        if !unit(self.factor_block_threshold) || !unit(self.multiplier_block_threshold) {
            return Err(ConfigError::Invalid(
                "growth block thresholds must lie in [0, 1]",
            ));
        }
        if !(self.multiplier_min > 0.0 && self.multiplier_min <= self.multiplier_max) {
            return Err(ConfigError::Invalid(
                "growth.multiplier_min must be positive and not exceed multiplier_max",
            ));
        }
        if !(0.0..1.0).contains(&self.noise_scale) {
            return Err(ConfigError::Invalid("growth.noise_scale must lie in [0, 1)"));
        }
        if !unit(self.crowding_floor) || self.crowding_ratio_cap <= 0.0 {
            return Err(ConfigError::Invalid(
                "growth crowding floor must lie in [0, 1] and ratio cap must be positive",
            ));
        }
        if !unit(self.drought_stress_decay) || !unit(self.waterlog_stress_decay) {
            return Err(ConfigError::Invalid(
                "growth stress decay factors must lie in [0, 1]",
            ));
        }
        if !unit(self.extinction_seed_fraction) {
            return Err(ConfigError::Invalid(
                "growth.extinction_seed_fraction must lie in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Modifiers applied on top of per-species breeding profiles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaunaTuning {
    /// Breeding odds gained per unit of relative ground cover.
    pub crowd_bonus_scale: f64,
    /// Largest breeding bonus from ground cover.
    pub crowd_bonus_cap: f64,
}

impl Default for FaunaTuning {
    fn default() -> Self {
        Self {
            crowd_bonus_scale: 0.1,
            crowd_bonus_cap: 0.25,
        }
    }
}

impl FaunaTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        if !unit(self.crowd_bonus_scale) || !unit(self.crowd_bonus_cap) {
            return Err(ConfigError::Invalid(
                "fauna crowd bonus values must lie in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Movement of non-herbivore entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffusionTuning {
    /// Probability that a mobile entity steps to a neighbouring cell each tick.
    pub move_chance: f64,
}

impl Default for DiffusionTuning {
    fn default() -> Self {
        Self { move_chance: 0.3 }
    }
}

impl DiffusionTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        if !unit(self.move_chance) {
            return Err(ConfigError::Invalid("diffusion.move_chance must lie in [0, 1]"));
        }
        Ok(())
    }
}

/// Water smoothing window and drought reporting threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaterTuning {
    /// Samples retained in each cell's water history.
    pub history_window: usize,
    /// Cells at or below this water level count as dry in statistics.
    pub low_water_threshold: f64,
}

impl Default for WaterTuning {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_WATER_HISTORY_WINDOW,
            low_water_threshold: 0.3,
        }
    }
}

impl WaterTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_window == 0 {
            return Err(ConfigError::Invalid("water.history_window must be positive"));
        }
        if !unit(self.low_water_threshold) {
            return Err(ConfigError::Invalid(
                "water.low_water_threshold must lie in [0, 1]",
            ));
        }
        Ok(())
    }
}

fn unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}
