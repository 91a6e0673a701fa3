//! Read-only projections of population trends.

use patient_world_core::{Guild, Species};
use patient_world_grid::{query, GridError, GridState};
use rand::{seq::SliceRandom, Rng};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::TickScheduler;

/// Values at or below this count as extinct.
pub const EXTINCTION_THRESHOLD: f64 = 0.5;

const GRASS_NOISE: (f64, f64) = (0.97, 1.03);

/// Failures raised while preparing or running a forecast.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ForecastError {
    /// Forecasts must cover at least one day.
    #[error("forecast days must be positive")]
    ZeroDays,
    /// Samples must be taken at least every day.
    #[error("forecast step must be positive")]
    ZeroStep,
    /// The simulation rejected a mutation.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Totals observed on one day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ForecastSample {
    /// Day of the observation.
    pub day: u64,
    /// Fast grass biomass across the grid.
    pub grass: u64,
    /// Rabbit population.
    pub rabbits: u64,
    /// Fox population.
    pub foxes: u64,
}

/// Trend of one metric over the forecast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MetricSummary {
    /// Value before the first tick.
    pub start: u64,
    /// Value after the last tick.
    pub end: u64,
    /// Smallest value seen.
    pub min: u64,
    /// Largest value seen.
    pub max: u64,
    /// Ticks that ended at or below the extinction threshold.
    pub extinct_days: u32,
    /// First day the metric fell to the extinction threshold.
    pub first_extinction_day: Option<u64>,
}

impl MetricSummary {
    fn starting_at(value: u64) -> Self {
        Self {
            start: value,
            end: value,
            min: value,
            max: value,
            extinct_days: 0,
            first_extinction_day: None,
        }
    }

    fn observe(&mut self, day: u64, value: u64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.end = value;
        if value as f64 <= EXTINCTION_THRESHOLD {
            self.extinct_days += 1;
            let _ = self.first_extinction_day.get_or_insert(day);
        }
    }
}

/// Per-metric summaries of a forecast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ForecastMetrics {
    /// Fast grass biomass.
    pub grass: MetricSummary,
    /// Rabbit population.
    pub rabbits: MetricSummary,
    /// Fox population.
    pub foxes: MetricSummary,
}

/// Outcome of a forecast run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForecastResult {
    /// Days simulated.
    pub days: u64,
    /// Sampling interval in days.
    pub step: u64,
    /// Recorded samples, starting with the initial state and ending with the final day.
    pub samples: Vec<ForecastSample>,
    /// Per-metric trends.
    pub summary: ForecastMetrics,
}

/// Projection of `days` ticks sampled every `step` days.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Forecast {
    days: u64,
    step: u64,
}

impl Forecast {
    /// Validates the forecast horizon and sampling interval.
    pub fn new(days: u64, step: u64) -> Result<Self, ForecastError> {
        if days == 0 {
            return Err(ForecastError::ZeroDays);
        }
        if step == 0 {
            return Err(ForecastError::ZeroStep);
        }
        Ok(Self { days, step })
    }

    /// Simulates a copy of `state`; the input is left untouched.
    ///
    /// When `noise` is provided, grass and populations are perturbed after
    /// every tick using that generator alone, so the simulation stream in
    /// `rng` is identical with or without noise.
    pub fn run<R, N>(
        &self,
        scheduler: &TickScheduler,
        state: &GridState,
        rng: &mut R,
        mut noise: Option<&mut N>,
    ) -> Result<ForecastResult, ForecastError>
    where
        R: Rng,
        N: Rng,
    {
        let start_day = state.day();
        let end_day = start_day + self.days;
        let initial = sample(state);
        let mut summary = ForecastMetrics {
            grass: MetricSummary::starting_at(initial.grass),
            rabbits: MetricSummary::starting_at(initial.rabbits),
            foxes: MetricSummary::starting_at(initial.foxes),
        };
        let mut samples = vec![initial];

        let mut current = state.clone();
        while current.day() < end_day {
            current = scheduler.tick(&current, rng)?;
            if let Some(noise) = noise.as_deref_mut() {
                perturb(&mut current, noise)?;
            }

            let totals = sample(&current);
            summary.grass.observe(totals.day, totals.grass);
            summary.rabbits.observe(totals.day, totals.rabbits);
            summary.foxes.observe(totals.day, totals.foxes);

            if totals.day >= end_day || (totals.day - start_day) % self.step == 0 {
                debug!(
                    day = totals.day,
                    grass = totals.grass,
                    rabbits = totals.rabbits,
                    foxes = totals.foxes,
                    "forecast sample"
                );
                samples.push(totals);
            }
        }

        Ok(ForecastResult {
            days: self.days,
            step: self.step,
            samples,
            summary,
        })
    }
}

fn sample(state: &GridState) -> ForecastSample {
    ForecastSample {
        day: state.day(),
        grass: query::guild_total(state, Guild::FastGrass),
        rabbits: query::species_count(state, Species::Rabbit) as u64,
        foxes: query::species_count(state, Species::Fox) as u64,
    }
}

/// Grass noise never lifts a cell past the guild's density or its layer cap.
fn perturb(state: &mut GridState, rng: &mut impl Rng) -> Result<(), GridError> {
    let ceiling = Guild::FastGrass.profile().max_density;
    for (_, cell) in state.cells_mut() {
        let factor = rng.gen_range(GRASS_NOISE.0..=GRASS_NOISE.1);
        let grass = (f64::from(cell.biomass(Guild::FastGrass)) * factor).round_ties_even() as u32;
        cell.set_biomass(Guild::FastGrass, grass.min(ceiling));
        let _ = cell.clamp_layers();
    }
    scale_population(state, rng, &Cohort::RABBIT)?;
    scale_population(state, rng, &Cohort::FOX)
}

struct Cohort {
    species: Species,
    scale: (f64, f64),
    max_hunger: u32,
    max_age: u32,
}

impl Cohort {
    const RABBIT: Cohort = Cohort {
        species: Species::Rabbit,
        scale: (0.95, 1.05),
        max_hunger: 5,
        max_age: 20,
    };

    const FOX: Cohort = Cohort {
        species: Species::Fox,
        scale: (0.94, 1.06),
        max_hunger: 7,
        max_age: 30,
    };
}

fn scale_population(
    state: &mut GridState,
    rng: &mut impl Rng,
    cohort: &Cohort,
) -> Result<(), GridError> {
    let members = state.entity_ids_where(|entity| entity.species() == cohort.species);
    if members.is_empty() {
        return Ok(());
    }
    let current = members.len();
    let target = (current as f64 * rng.gen_range(cohort.scale.0..=cohort.scale.1))
        .round_ties_even() as usize;

    if target < current {
        let doomed: Vec<_> = members
            .choose_multiple(rng, current - target)
            .copied()
            .collect();
        for id in doomed {
            let _ = state.remove_entity(id)?;
        }
        return Ok(());
    }

    let homes: Vec<_> = members
        .iter()
        .filter_map(|id| state.entity(*id).map(|entity| entity.cell()))
        .collect();
    for _ in current..target {
        let Some(home) = homes.choose(rng).copied() else {
            break;
        };
        let hunger = rng.gen_range(0..=cohort.max_hunger);
        let age = rng.gen_range(0..=cohort.max_age);
        let _ = state.spawn_with(cohort.species, home, hunger, age)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use patient_world_core::{CellCoord, Layer};
    use patient_world_grid::Cell;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn perturbed_cells_stay_within_density_and_capacity() {
        let crowded = Cell::new(0.68, 0.2, 0.55)
            .with_biomass(Guild::FastGrass, 85)
            .with_biomass(Guild::MossCarpet, 90);
        let state = GridState::from_cells(1, 1, vec![crowded]).expect("grid");

        for seed in 0..20 {
            let mut noisy = state.clone();
            perturb(&mut noisy, &mut ChaCha8Rng::seed_from_u64(seed)).expect("perturb");
            let cell = noisy.cell(CellCoord::new(0, 0)).expect("cell");
            assert!(cell.biomass(Guild::FastGrass) <= Guild::FastGrass.profile().max_density);
            for layer in Layer::ALL {
                assert!(cell.layer_total(layer) <= cell.layer_capacity(layer));
            }
            assert!(noisy.capacity_events().is_empty(), "noise never logs clamps");
        }
    }
}
