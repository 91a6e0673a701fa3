#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Producer growth and resource competition.
//!
//! Every cell reads its facilitation from ground cover frozen before the
//! pass, so the order in which cells are visited never changes the outcome
//! beyond the draws taken from the injected random generator.

mod factors;
mod response;

use patient_world_core::{
    season_phase, CapacityEvent, Guild, GrowthTuning, Layer, ProducerProfile,
};
use patient_world_grid::{Cell, GridState};
use rand::Rng;

pub use factors::{
    ambient_temperature, facilitation_factor, resource_multiplier, season_factor,
    temperature_factor, FactorReadings,
};
pub use response::{crowding_penalty, water_response};

/// Pure system that grows every guild of every cell by one day.
#[derive(Clone, Debug, Default)]
pub struct Growth {
    tuning: GrowthTuning,
}

impl Growth {
    /// Creates the growth system with the provided tuning.
    #[must_use]
    pub fn new(tuning: GrowthTuning) -> Self {
        Self { tuning }
    }

    /// Tuning driving the system.
    #[must_use]
    pub fn tuning(&self) -> &GrowthTuning {
        &self.tuning
    }

    /// Grows every cell, then clamps each layer and records the clamps.
    pub fn apply(&self, state: &mut GridState, rng: &mut impl Rng) {
        let day = state.day();
        let phase = season_phase(day, self.tuning.season_length);
        let season = season_factor(phase);
        let ambient = ambient_temperature(phase);

        let ground: Vec<u32> = state
            .cells()
            .map(|(_, cell)| cell.layer_total(Layer::Ground))
            .collect();
        let width = state.width() as usize;
        let facilitation: Vec<f64> = state
            .coords()
            .enumerate()
            .map(|(index, coord)| {
                let neighbors: Vec<u32> = state
                    .neighbors(coord)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|neighbor| {
                        ground[neighbor.y() as usize * width + neighbor.x() as usize]
                    })
                    .collect();
                facilitation_factor(ground[index], &neighbors)
            })
            .collect();

        let mut events = Vec::new();
        for (index, (coord, cell)) in state.cells_mut().enumerate() {
            let readings = FactorReadings {
                fertility: factors::clamp01(cell.fertility()),
                temperature: temperature_factor(ambient, cell.temperature()),
                season,
                facilitation: facilitation[index],
                water: factors::clamp01(cell.water_average()),
            };
            let multiplier = resource_multiplier(&readings, &self.tuning, rng);
            cell.set_limiting_factor(Some(readings.limiting()));

            for guild in Guild::ALL {
                self.grow_guild(cell, guild.profile(), phase, multiplier);
            }

            for clamp in cell.clamp_layers() {
                events.push(CapacityEvent {
                    day,
                    cell: coord,
                    layer: clamp.layer,
                    total: clamp.total,
                    capacity: clamp.capacity,
                });
            }
        }

        for event in events {
            state.record_capacity_event(event);
        }
    }

    fn grow_guild(&self, cell: &mut Cell, profile: &ProducerProfile, phase: f64, multiplier: f64) {
        let guild = profile.guild;
        let mut amount = cell.biomass(guild);
        if amount == 0 {
            if let Some(seeding) = profile.seeding {
                if cell.biomass(seeding.source) >= seeding.threshold {
                    amount = seeding.amount;
                }
            }
        }

        if let Some(window) = profile.seasonal_window {
            if !window.contains(phase) {
                let retain = (1.0 - profile.dormancy_decay).max(0.0);
                cell.set_biomass(guild, scale(amount, retain));
                return;
            }
        }

        let water = water_response(profile, cell.water_average());
        if water <= self.tuning.factor_block_threshold {
            let decay = if cell.water() < profile.water_optimum {
                self.tuning.drought_stress_decay
            } else {
                self.tuning.waterlog_stress_decay
            };
            cell.set_biomass(guild, scale(amount, decay));
            return;
        }

        let layer = profile.layer;
        let crowding = crowding_penalty(
            cell.layer_total(layer),
            cell.layer_capacity(layer),
            &self.tuning,
        );
        let source = amount.max(profile.seed_floor);
        let rate = profile.growth_rate * layer.growth_bias();
        let mut delta = scale(source, rate * multiplier * water * crowding);
        if delta == 0 && amount == 0 {
            let forced = f64::from(profile.seed_floor) * self.tuning.extinction_seed_fraction;
            delta = (forced.floor() as u32).max(1);
        }
        cell.set_biomass(
            guild,
            amount.saturating_add(delta).min(profile.max_density),
        );
    }
}

fn scale(amount: u32, factor: f64) -> u32 {
    (f64::from(amount) * factor).round_ties_even().max(0.0) as u32
}
