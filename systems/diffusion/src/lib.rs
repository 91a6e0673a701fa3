#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stochastic lateral movement of mobile animals.

use patient_world_core::DiffusionTuning;
use patient_world_grid::{GridError, GridState};
use rand::{seq::SliceRandom, Rng};

/// Pure system that lets every non-herbivore wander to an adjacent cell.
///
/// Herbivores stay put so grazing pressure remains local.
#[derive(Clone, Debug, Default)]
pub struct Diffusion {
    tuning: DiffusionTuning,
}

impl Diffusion {
    /// Creates the diffusion system with the provided tuning.
    #[must_use]
    pub fn new(tuning: DiffusionTuning) -> Self {
        Self { tuning }
    }

    /// Moves each mobile entity with the configured probability.
    ///
    /// Entities without neighbours never draw from `rng`. Returns the number
    /// of entities that moved.
    pub fn apply(&self, state: &mut GridState, rng: &mut impl Rng) -> Result<usize, GridError> {
        let mut moved = 0;
        for id in state.entity_ids_where(|entity| !entity.species().is_herbivore()) {
            let Some(entity) = state.entity(id) else {
                continue;
            };
            let neighbors = state.neighbors(entity.cell())?;
            if neighbors.is_empty() {
                continue;
            }
            if rng.gen::<f64>() >= self.tuning.move_chance {
                continue;
            }
            if let Some(target) = neighbors.choose(rng) {
                state.move_entity(id, *target)?;
                moved += 1;
            }
        }
        Ok(moved)
    }
}
