#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state for the Patient World simulation.
//!
//! [`GridState`] owns every cell and the entity registry. Cells only hold
//! back-references to the entities standing on them; the registry is the
//! source of truth for positions, and every mutation that touches both is
//! performed here so the two never drift apart.

mod cell;
mod snapshot;

use std::collections::BTreeMap;

use patient_world_core::{
    CapacityEvent, CellCoord, EntityId, Species, DEFAULT_WATER_HISTORY_WINDOW,
};
use thiserror::Error;

pub use cell::{Cell, LayerClamp};
pub use snapshot::StateError;

/// Failures raised by grid accessors and the entity mutation surface.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Coordinates fall outside the grid; grids never wrap.
    #[error("cell ({x}, {y}) lies outside the {width}x{height} grid")]
    OutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },
    /// Grids need at least one cell.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The cell vector does not match the declared dimensions.
    #[error("expected {expected} cells for a {width}x{height} grid, got {actual}")]
    CellCountMismatch {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Number of cells the dimensions require.
        expected: usize,
        /// Number of cells provided.
        actual: usize,
    },
    /// No live entity carries the identifier.
    #[error("unknown entity {0}")]
    UnknownEntity(u32),
    /// The identifier allocator cannot hand out another id.
    #[error("entity identifiers exhausted")]
    IdsExhausted,
}

/// Animal occupying a grid cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    species: Species,
    cell: CellCoord,
    hunger: u32,
    age: u32,
}

impl Entity {
    /// Identifier assigned at spawn; never reused.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Species tag selecting the behaviour profile.
    #[must_use]
    pub const fn species(&self) -> Species {
        self.species
    }

    /// Cell currently occupied by the entity.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Current hunger level.
    #[must_use]
    pub const fn hunger(&self) -> u32 {
        self.hunger
    }

    /// Age in ticks.
    #[must_use]
    pub const fn age(&self) -> u32 {
        self.age
    }

    /// Advances the entity by one day, adding `hunger_rate` to its hunger.
    pub fn age_one_day(&mut self, hunger_rate: u32) {
        self.age = self.age.saturating_add(1);
        self.hunger = self.hunger.saturating_add(hunger_rate);
    }

    /// Lowers hunger by `amount`, never below zero.
    pub fn relieve_hunger(&mut self, amount: u32) {
        self.hunger = self.hunger.saturating_sub(amount);
    }

    /// Reports whether hunger reached the species death ceiling.
    #[must_use]
    pub fn is_starving(&self) -> bool {
        self.hunger >= self.species.death_hunger()
    }
}

/// The simulated world: cells, entities, and the latest tick's capacity log.
#[derive(Clone, Debug, PartialEq)]
pub struct GridState {
    day: u64,
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    entities: BTreeMap<EntityId, Entity>,
    next_entity_id: u32,
    capacity_events: Vec<CapacityEvent>,
    water_window: usize,
}

impl GridState {
    /// Creates a grid of default cells.
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        let count = cell_count(width, height)?;
        Self::from_cells(width, height, vec![Cell::default(); count])
    }

    /// Creates a grid from row-major cells.
    ///
    /// Occupant sets of the provided cells are discarded; the new grid starts
    /// without entities.
    pub fn from_cells(width: u32, height: u32, mut cells: Vec<Cell>) -> Result<Self, GridError> {
        let expected = cell_count(width, height)?;
        if cells.len() != expected {
            return Err(GridError::CellCountMismatch {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }
        for cell in &mut cells {
            let _ = cell.take_occupants();
        }
        Ok(Self {
            day: 0,
            width,
            height,
            cells,
            entities: BTreeMap::new(),
            next_entity_id: 1,
            capacity_events: Vec::new(),
            water_window: DEFAULT_WATER_HISTORY_WINDOW,
        })
    }

    /// Returns the grid using `window` water samples per cell.
    ///
    /// Existing histories keep only their newest `window` samples.
    #[must_use]
    pub fn with_water_window(mut self, window: usize) -> Self {
        self.water_window = window.max(1);
        for cell in &mut self.cells {
            cell.trim_water_history(self.water_window);
        }
        self
    }

    /// Current simulated day.
    #[must_use]
    pub const fn day(&self) -> u64 {
        self.day
    }

    /// Overrides the day counter.
    pub fn set_day(&mut self, day: u64) {
        self.day = day;
    }

    /// Advances the day counter by one.
    pub fn advance_day(&mut self) {
        self.day = self.day.saturating_add(1);
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of water samples retained per cell.
    #[must_use]
    pub const fn water_window(&self) -> usize {
        self.water_window
    }

    /// Flat index of `coord`, rejecting coordinates outside the grid.
    pub fn index(&self, coord: CellCoord) -> Result<usize, GridError> {
        if coord.x() >= self.width || coord.y() >= self.height {
            return Err(GridError::OutOfBounds {
                x: coord.x(),
                y: coord.y(),
                width: self.width,
                height: self.height,
            });
        }
        Ok(coord.y() as usize * self.width as usize + coord.x() as usize)
    }

    /// Reads the cell at `coord`.
    pub fn cell(&self, coord: CellCoord) -> Result<&Cell, GridError> {
        let index = self.index(coord)?;
        Ok(&self.cells[index])
    }

    /// Mutable access to the cell at `coord`.
    pub fn cell_mut(&mut self, coord: CellCoord) -> Result<&mut Cell, GridError> {
        let index = self.index(coord)?;
        Ok(&mut self.cells[index])
    }

    /// Replaces the cell at `coord`, keeping its current occupants.
    pub fn set_cell(&mut self, coord: CellCoord, mut cell: Cell) -> Result<(), GridError> {
        let index = self.index(coord)?;
        let occupants = self.cells[index].take_occupants();
        cell.replace_occupants(occupants);
        self.cells[index] = cell;
        Ok(())
    }

    /// Iterates every cell with its coordinates in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (coord_at(index, self.width), cell))
    }

    /// Iterates every cell mutably with its coordinates in row-major order.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = (CellCoord, &mut Cell)> + '_ {
        let width = self.width;
        self.cells
            .iter_mut()
            .enumerate()
            .map(move |(index, cell)| (coord_at(index, width), cell))
    }

    /// Every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| CellCoord::new(x, y)))
    }

    /// Orthogonal neighbours of `coord` in north, south, west, east order.
    ///
    /// Edges do not wrap, so border cells have fewer neighbours.
    pub fn neighbors(&self, coord: CellCoord) -> Result<Vec<CellCoord>, GridError> {
        let _ = self.index(coord)?;
        let (x, y) = (coord.x(), coord.y());
        let mut neighbors = Vec::with_capacity(4);
        if y > 0 {
            neighbors.push(CellCoord::new(x, y - 1));
        }
        if y + 1 < self.height {
            neighbors.push(CellCoord::new(x, y + 1));
        }
        if x > 0 {
            neighbors.push(CellCoord::new(x - 1, y));
        }
        if x + 1 < self.width {
            neighbors.push(CellCoord::new(x + 1, y));
        }
        Ok(neighbors)
    }

    /// Sets the water level of a cell and records it in the cell history.
    pub fn set_water(&mut self, coord: CellCoord, value: f64) -> Result<(), GridError> {
        let window = self.water_window;
        self.cell_mut(coord)?.set_water(value, window);
        Ok(())
    }

    /// Sets the soil fertility of a cell.
    pub fn set_fertility(&mut self, coord: CellCoord, value: f64) -> Result<(), GridError> {
        self.cell_mut(coord)?.set_fertility(value);
        Ok(())
    }

    /// Sets the temperature of a cell.
    pub fn set_temperature(&mut self, coord: CellCoord, value: f64) -> Result<(), GridError> {
        self.cell_mut(coord)?.set_temperature(value);
        Ok(())
    }

    /// Spawns a newborn of `species` at `coord`.
    pub fn spawn(&mut self, species: Species, coord: CellCoord) -> Result<EntityId, GridError> {
        self.spawn_with(species, coord, 0, 0)
    }

    /// Spawns an entity with explicit hunger and age.
    pub fn spawn_with(
        &mut self,
        species: Species,
        coord: CellCoord,
        hunger: u32,
        age: u32,
    ) -> Result<EntityId, GridError> {
        let index = self.index(coord)?;
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id = self
            .next_entity_id
            .checked_add(1)
            .ok_or(GridError::IdsExhausted)?;
        self.cells[index].add_occupant(id);
        let _ = self.entities.insert(
            id,
            Entity {
                id,
                species,
                cell: coord,
                hunger,
                age,
            },
        );
        Ok(id)
    }

    /// Removes an entity from the registry and from its cell.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<Entity, GridError> {
        let entity = self
            .entities
            .remove(&id)
            .ok_or(GridError::UnknownEntity(id.get()))?;
        let index = self.index(entity.cell)?;
        self.cells[index].remove_occupant(id);
        Ok(entity)
    }

    /// Moves an entity to `to`, updating both cells' occupant sets.
    pub fn move_entity(&mut self, id: EntityId, to: CellCoord) -> Result<(), GridError> {
        let target = self.index(to)?;
        let from = self
            .entities
            .get(&id)
            .map(|entity| entity.cell)
            .ok_or(GridError::UnknownEntity(id.get()))?;
        let source = self.index(from)?;
        self.cells[source].remove_occupant(id);
        self.cells[target].add_occupant(id);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.cell = to;
        }
        Ok(())
    }

    /// Looks up a live entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable access to a live entity's hunger and age.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Iterates live entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Ids of the live entities matching `filter`, ascending.
    pub fn entity_ids_where(&self, filter: impl Fn(&Entity) -> bool) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|entity| filter(entity))
            .map(|entity| entity.id)
            .collect()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Entities standing on `coord`, ascending by id.
    pub fn entities_at(&self, coord: CellCoord) -> Result<Vec<&Entity>, GridError> {
        Ok(self
            .cell(coord)?
            .occupants()
            .filter_map(|id| self.entities.get(&id))
            .collect())
    }

    /// Identifier the next spawn will receive.
    #[must_use]
    pub const fn next_entity_id(&self) -> u32 {
        self.next_entity_id
    }

    /// Capacity clamps recorded during the latest tick.
    #[must_use]
    pub fn capacity_events(&self) -> &[CapacityEvent] {
        &self.capacity_events
    }

    /// Appends a capacity clamp to the current tick's log.
    pub fn record_capacity_event(&mut self, event: CapacityEvent) {
        self.capacity_events.push(event);
    }

    /// Empties the capacity log at the start of a tick.
    pub fn clear_capacity_events(&mut self) {
        self.capacity_events.clear();
    }
}

fn coord_at(index: usize, width: u32) -> CellCoord {
    let width = width as usize;
    CellCoord::new((index % width) as u32, (index / width) as u32)
}

fn cell_count(width: u32, height: u32) -> Result<usize, GridError> {
    if width == 0 || height == 0 {
        return Err(GridError::EmptyGrid { width, height });
    }
    Ok(width as usize * height as usize)
}

/// Query functions that provide read-only aggregates over the grid state.
pub mod query {
    use std::collections::BTreeMap;

    use super::GridState;
    use patient_world_core::{CapacityEvent, CellCoord, Guild, GrowthFactor, Layer, Species};

    /// Total biomass of `guild` across the grid.
    #[must_use]
    pub fn guild_total(state: &GridState, guild: Guild) -> u64 {
        state
            .cells
            .iter()
            .map(|cell| u64::from(cell.biomass(guild)))
            .sum()
    }

    /// Totals for every guild in catalog order.
    #[must_use]
    pub fn guild_totals(state: &GridState) -> Vec<(Guild, u64)> {
        Guild::ALL
            .into_iter()
            .map(|guild| (guild, guild_total(state, guild)))
            .collect()
    }

    /// Total biomass of `layer` across the grid.
    #[must_use]
    pub fn layer_total(state: &GridState, layer: Layer) -> u64 {
        state
            .cells
            .iter()
            .map(|cell| u64::from(cell.layer_total(layer)))
            .sum()
    }

    /// Total biomass across every guild and cell.
    #[must_use]
    pub fn total_biomass(state: &GridState) -> u64 {
        state.cells.iter().map(|cell| cell.total_biomass()).sum()
    }

    /// Number of live entities of `species`.
    #[must_use]
    pub fn species_count(state: &GridState, species: Species) -> usize {
        state
            .entities
            .values()
            .filter(|entity| entity.species == species)
            .count()
    }

    /// Population of every species in registry order.
    #[must_use]
    pub fn species_counts(state: &GridState) -> Vec<(Species, usize)> {
        Species::ALL
            .into_iter()
            .map(|species| (species, species_count(state, species)))
            .collect()
    }

    /// Summary of the water field.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct WaterStats {
        /// Mean water level.
        pub mean: f64,
        /// Driest cell.
        pub min: f64,
        /// Wettest cell.
        pub max: f64,
        /// Cells at or below the low-water threshold.
        pub low_cells: usize,
    }

    /// Water statistics, counting cells at or below `low_threshold` as dry.
    #[must_use]
    pub fn water_stats(state: &GridState, low_threshold: f64) -> WaterStats {
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut low_cells = 0;
        for cell in &state.cells {
            let water = cell.water();
            sum += water;
            min = min.min(water);
            max = max.max(water);
            if water <= low_threshold {
                low_cells += 1;
            }
        }
        WaterStats {
            mean: sum / state.cells.len() as f64,
            min,
            max,
            low_cells,
        }
    }

    /// Number of cells bound by each growth factor.
    #[must_use]
    pub fn limiting_factor_histogram(state: &GridState) -> BTreeMap<GrowthFactor, usize> {
        let mut histogram = BTreeMap::new();
        for limiting in state.cells.iter().filter_map(|cell| cell.limiting_factor()) {
            *histogram.entry(limiting.factor).or_insert(0) += 1;
        }
        histogram
    }

    /// Densest guild of every cell in row-major order.
    #[must_use]
    pub fn dominant_guilds(state: &GridState) -> Vec<(CellCoord, Option<Guild>)> {
        state
            .cells()
            .map(|(coord, cell)| (coord, cell.dominant_guild()))
            .collect()
    }

    /// Capacity clamps recorded by the latest tick.
    #[must_use]
    pub fn capacity_events(state: &GridState) -> &[CapacityEvent] {
        state.capacity_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(x: u32, y: u32) -> CellCoord {
        CellCoord::new(x, y)
    }

    #[test]
    fn zero_sized_grids_are_rejected() {
        assert_eq!(
            GridState::new(0, 4),
            Err(GridError::EmptyGrid {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn out_of_bounds_access_is_an_error() {
        let grid = GridState::new(3, 2).expect("grid");
        assert!(matches!(
            grid.cell(coord(3, 0)),
            Err(GridError::OutOfBounds { x: 3, y: 0, .. })
        ));
        assert!(grid.cell(coord(2, 1)).is_ok());
    }

    #[test]
    fn neighbours_follow_north_south_west_east_order() {
        let grid = GridState::new(3, 3).expect("grid");
        assert_eq!(
            grid.neighbors(coord(1, 1)).expect("inside"),
            vec![coord(1, 0), coord(1, 2), coord(0, 1), coord(2, 1)]
        );
        assert_eq!(
            grid.neighbors(coord(0, 0)).expect("inside"),
            vec![coord(0, 1), coord(1, 0)]
        );
    }

    #[test]
    fn cell_iterators_agree_on_coordinates() {
        let mut grid = GridState::new(3, 2).expect("grid");
        let read: Vec<CellCoord> = grid.cells().map(|(coord, _)| coord).collect();
        let written: Vec<CellCoord> = grid.cells_mut().map(|(coord, _)| coord).collect();
        assert_eq!(read, written);
        assert_eq!(read, grid.coords().collect::<Vec<_>>());
        assert_eq!(read[4], coord(1, 1));
    }

    #[test]
    fn narrowing_the_water_window_trims_histories() {
        let mut grid = GridState::new(1, 1).expect("grid");
        for value in [0.1, 0.2, 0.3] {
            grid.set_water(coord(0, 0), value).expect("set water");
        }
        let grid = grid.with_water_window(2);
        let history: Vec<f64> = grid.cell(coord(0, 0)).expect("cell").water_history().collect();
        assert_eq!(history, vec![0.2, 0.3]);
    }

    #[test]
    fn single_cell_grid_has_no_neighbours() {
        let grid = GridState::new(1, 1).expect("grid");
        assert!(grid.neighbors(coord(0, 0)).expect("inside").is_empty());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut grid = GridState::new(2, 2).expect("grid");
        let first = grid.spawn(Species::Rabbit, coord(0, 0)).expect("spawn");
        let _ = grid.remove_entity(first).expect("remove");
        let second = grid.spawn(Species::Rabbit, coord(0, 0)).expect("spawn");
        assert!(second > first);
        assert_eq!(grid.cell(coord(0, 0)).expect("cell").occupant_count(), 1);
    }

    #[test]
    fn spawning_outside_the_grid_fails_without_allocating() {
        let mut grid = GridState::new(2, 2).expect("grid");
        let next = grid.next_entity_id();
        assert!(grid.spawn(Species::Fox, coord(5, 5)).is_err());
        assert_eq!(grid.next_entity_id(), next);
        assert_eq!(grid.entity_count(), 0);
    }

    #[test]
    fn moving_updates_registry_and_both_cells() {
        let mut grid = GridState::new(2, 1).expect("grid");
        let fox = grid.spawn(Species::Fox, coord(0, 0)).expect("spawn");
        grid.move_entity(fox, coord(1, 0)).expect("move");

        assert_eq!(grid.entity(fox).map(Entity::cell), Some(coord(1, 0)));
        assert_eq!(grid.cell(coord(0, 0)).expect("cell").occupant_count(), 0);
        let occupants: Vec<EntityId> = grid.cell(coord(1, 0)).expect("cell").occupants().collect();
        assert_eq!(occupants, vec![fox]);
    }

    #[test]
    fn set_cell_keeps_occupants() {
        let mut grid = GridState::new(1, 1).expect("grid");
        let rabbit = grid.spawn(Species::Rabbit, coord(0, 0)).expect("spawn");
        grid.set_cell(coord(0, 0), Cell::new(0.2, 0.3, 0.4))
            .expect("set cell");

        let cell = grid.cell(coord(0, 0)).expect("cell");
        assert_eq!(cell.occupants().collect::<Vec<_>>(), vec![rabbit]);
        assert!((cell.water() - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn removing_unknown_entity_reports_its_id() {
        let mut grid = GridState::new(1, 1).expect("grid");
        assert_eq!(
            grid.remove_entity(EntityId::new(9)),
            Err(GridError::UnknownEntity(9))
        );
    }
}
