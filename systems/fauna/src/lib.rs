#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Animal behaviour: grazing, hunting, breeding and starvation.
//!
//! Behaviour is looked up from each species' profile. Every pass iterates a
//! snapshot of the ids present when it starts, so offspring born during a
//! pass are first processed on the following tick.

use patient_world_core::{
    Diet, EntityId, FaunaTuning, Guild, HerbivoreProfile, Layer, PredatorProfile, Species,
};
use patient_world_grid::{Cell, Entity, GridError, GridState};
use rand::Rng;

/// Counters describing one run of the fauna passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaunaReport {
    /// Offspring spawned.
    pub births: usize,
    /// Prey removed by predators.
    pub kills: usize,
}

impl FaunaReport {
    fn merge(self, other: Self) -> Self {
        Self {
            births: self.births + other.births,
            kills: self.kills + other.kills,
        }
    }
}

/// Pure system advancing every animal by one day.
#[derive(Clone, Debug, Default)]
pub struct Fauna {
    tuning: FaunaTuning,
}

impl Fauna {
    /// Creates the fauna system with the provided tuning.
    #[must_use]
    pub fn new(tuning: FaunaTuning) -> Self {
        Self { tuning }
    }

    /// Runs the herbivore pass followed by the predator pass.
    pub fn apply(
        &self,
        state: &mut GridState,
        rng: &mut impl Rng,
    ) -> Result<FaunaReport, GridError> {
        let herbivores = self.herbivore_pass(state, rng)?;
        let predators = self.predator_pass(state, rng)?;
        Ok(herbivores.merge(predators))
    }

    /// Ages, feeds and breeds every herbivore present when the pass starts.
    pub fn herbivore_pass(
        &self,
        state: &mut GridState,
        rng: &mut impl Rng,
    ) -> Result<FaunaReport, GridError> {
        let mut report = FaunaReport::default();
        for id in state.entity_ids_where(|entity| entity.species().is_herbivore()) {
            let Some(entity) = state.entity(id) else {
                continue;
            };
            let (species, coord) = (entity.species(), entity.cell());
            let Diet::Herbivore(profile) = species.diet() else {
                continue;
            };

            let hunger = advance(state, id, profile.hunger_rate);
            let cell = state.cell_mut(coord)?;
            let eaten = graze(cell, profile.intake, profile.diet);
            let relief = meal_relief(profile, eaten);
            let ground = cell.layer_total(Layer::Ground);
            if let Some(entity) = state.entity_mut(id) {
                entity.relieve_hunger(relief);
            }

            let hunger = hunger.saturating_sub(relief);
            let age = state.entity(id).map_or(0, Entity::age);
            if hunger <= profile.reproduction_hunger && age > profile.reproduction_age {
                let chance = profile.reproduction_chance + self.crowd_bonus(ground);
                if rng.gen::<f64>() < chance {
                    let _ = state.spawn(species, coord)?;
                    report.births += 1;
                }
            }
        }
        Ok(report)
    }

    /// Ages every predator, lets it eat the hungriest prey in its cell, and
    /// attempts breeding.
    pub fn predator_pass(
        &self,
        state: &mut GridState,
        rng: &mut impl Rng,
    ) -> Result<FaunaReport, GridError> {
        let mut report = FaunaReport::default();
        for id in state.entity_ids_where(|entity| !entity.species().is_herbivore()) {
            let Some(entity) = state.entity(id) else {
                continue;
            };
            let (species, coord) = (entity.species(), entity.cell());
            let Diet::Predator(profile) = species.diet() else {
                continue;
            };

            let _ = advance(state, id, profile.hunger_rate);
            if let Some(prey) = hungriest_prey(state, id, profile)? {
                let _ = state.remove_entity(prey)?;
                report.kills += 1;
                if let Some(entity) = state.entity_mut(id) {
                    entity.relieve_hunger(profile.hunger_relief);
                }
            }

            let Some(entity) = state.entity(id) else {
                continue;
            };
            if entity.hunger() <= profile.reproduction_hunger
                && entity.age() > profile.reproduction_age
                && rng.gen::<f64>() < profile.reproduction_chance
            {
                let _ = state.spawn(species, coord)?;
                report.births += 1;
            }
        }
        Ok(report)
    }

    fn crowd_bonus(&self, ground: u32) -> f64 {
        let density = f64::from(ground) / f64::from(Layer::Ground.base_capacity().max(1));
        (density * self.tuning.crowd_bonus_scale).min(self.tuning.crowd_bonus_cap)
    }
}

/// Removes every entity whose hunger reached its species ceiling.
///
/// Returns the removed entities in ascending id order.
pub fn death_sweep(state: &mut GridState) -> Result<Vec<Entity>, GridError> {
    state
        .entity_ids_where(Entity::is_starving)
        .into_iter()
        .map(|id| state.remove_entity(id))
        .collect()
}

/// Consumes up to `intake` biomass from `cell`, walking `diet` in priority order.
///
/// Returns the amount actually eaten.
pub fn graze(cell: &mut Cell, intake: u32, diet: &[Guild]) -> u32 {
    let mut remaining = intake;
    for guild in diet {
        if remaining == 0 {
            break;
        }
        remaining -= cell.take_biomass(*guild, remaining);
    }
    intake - remaining
}

fn meal_relief(profile: &HerbivoreProfile, eaten: u32) -> u32 {
    if eaten >= profile.satiation_threshold {
        profile.hunger_relief
    } else if eaten > 0 {
        profile.partial_relief
    } else {
        0
    }
}

fn advance(state: &mut GridState, id: EntityId, hunger_rate: u32) -> u32 {
    state.entity_mut(id).map_or(0, |entity| {
        entity.age_one_day(hunger_rate);
        entity.hunger()
    })
}

/// Prey sharing the predator's cell with the highest hunger; the lowest id wins ties.
fn hungriest_prey(
    state: &GridState,
    predator: EntityId,
    profile: &PredatorProfile,
) -> Result<Option<EntityId>, GridError> {
    let Some(hunter) = state.entity(predator) else {
        return Ok(None);
    };
    let mut best: Option<&Entity> = None;
    for candidate in state.entities_at(hunter.cell())? {
        if candidate.id() == predator || !is_prey(profile, candidate.species()) {
            continue;
        }
        if best.map_or(true, |current| candidate.hunger() > current.hunger()) {
            best = Some(candidate);
        }
    }
    Ok(best.map(Entity::id))
}

fn is_prey(profile: &PredatorProfile, species: Species) -> bool {
    profile.prey.contains(&species)
}
