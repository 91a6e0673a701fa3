#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory genesis of a fresh Patient World grid.

use std::ops::RangeInclusive;

use patient_world_core::{CellCoord, Guild, Species, DEFAULT_WATER_HISTORY_WINDOW};
use patient_world_grid::{Cell, GridError, GridState};
use rand::Rng;

const WATER_RANGE: RangeInclusive<f64> = 0.25..=0.95;
const FERTILITY_RANGE: RangeInclusive<f64> = 0.25..=0.9;
const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.2..=0.85;

/// Shape and starting populations of a generated world.
#[derive(Clone, Debug, PartialEq)]
pub struct BootstrapConfig {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Fast grass planted in every cell.
    pub fast_grass: u32,
    /// Slow shrubs planted in every cell.
    pub shrubs: u32,
    /// Rabbits scattered across the grid.
    pub rabbits: u32,
    /// Foxes scattered across the grid.
    pub foxes: u32,
    /// Water samples retained per cell.
    pub water_history_window: usize,
    /// Box-blur passes applied to the water noise.
    pub smooth_passes: usize,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            fast_grass: 5,
            shrubs: 0,
            rabbits: 50,
            foxes: 10,
            water_history_window: DEFAULT_WATER_HISTORY_WINDOW,
            smooth_passes: 2,
        }
    }
}

/// Builds new grids from a [`BootstrapConfig`] and an injected random generator.
#[derive(Clone, Debug, Default)]
pub struct Bootstrap {
    config: BootstrapConfig,
}

impl Bootstrap {
    /// Creates a bootstrapper for the provided configuration.
    #[must_use]
    pub fn new(config: BootstrapConfig) -> Self {
        Self { config }
    }

    /// Configuration used for generation.
    #[must_use]
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Generates a grid on day zero.
    ///
    /// Water comes from smoothed noise, fertility and temperature are drawn
    /// per cell, and animals are scattered uniformly.
    pub fn generate(&self, rng: &mut impl Rng) -> Result<GridState, GridError> {
        let config = &self.config;
        let mut state = GridState::new(config.width, config.height)?
            .with_water_window(config.water_history_window);

        let water = water_distribution(config.width, config.height, config.smooth_passes, rng);
        let coords: Vec<CellCoord> = state.coords().collect();
        for (coord, water) in coords.into_iter().zip(water) {
            let fertility = rng.gen_range(FERTILITY_RANGE);
            let temperature = rng.gen_range(TEMPERATURE_RANGE);
            let mut cell = Cell::new(water, fertility, temperature)
                .with_biomass(Guild::FastGrass, config.fast_grass)
                .with_biomass(Guild::SlowShrubs, config.shrubs);
            let _ = cell.clamp_layers();
            state.set_cell(coord, cell)?;
        }

        for (species, count) in [(Species::Rabbit, config.rabbits), (Species::Fox, config.foxes)] {
            for _ in 0..count {
                let coord = CellCoord::new(
                    rng.gen_range(0..config.width),
                    rng.gen_range(0..config.height),
                );
                let _ = state.spawn(species, coord)?;
            }
        }
        Ok(state)
    }
}

/// Row-major water field: uniform noise box-blurred `passes` times over each
/// 3x3 neighbourhood, then scaled into the initial water range.
pub fn water_distribution(
    width: u32,
    height: u32,
    passes: usize,
    rng: &mut impl Rng,
) -> Vec<f64> {
    let (width, height) = (width as usize, height as usize);
    let mut field: Vec<f64> = (0..width * height).map(|_| rng.gen::<f64>()).collect();

    for _ in 0..passes {
        let mut smoothed = Vec::with_capacity(field.len());
        for y in 0..height {
            for x in 0..width {
                let mut total = 0.0;
                let mut count = 0usize;
                for ny in y.saturating_sub(1)..(y + 2).min(height) {
                    for nx in x.saturating_sub(1)..(x + 2).min(width) {
                        total += field[ny * width + nx];
                        count += 1;
                    }
                }
                smoothed.push(total / count as f64);
            }
        }
        field = smoothed;
    }

    let (low, high) = (*WATER_RANGE.start(), *WATER_RANGE.end());
    field
        .into_iter()
        .map(|value| (low + value * (high - low)).clamp(0.0, 1.0))
        .collect()
}
