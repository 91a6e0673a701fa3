//! Per-square vegetation, environment, and occupant state.

use std::collections::{BTreeSet, VecDeque};

use patient_world_core::{EntityId, Guild, Layer, LimitingFactor, GUILD_COUNT};

const DEFAULT_WATER: f64 = 0.6;
const DEFAULT_FERTILITY: f64 = 0.6;
const DEFAULT_TEMPERATURE: f64 = 0.5;
const MIN_LAYER_CAPACITY: u32 = 8;

/// Mutable state of a single grid square.
///
/// Every guild always has a biomass slot. Environmental fields are clamped to
/// `[0, 1]` on every write, and the water history is never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    biomass: [u32; GUILD_COUNT],
    water: f64,
    fertility: f64,
    temperature: f64,
    water_history: VecDeque<f64>,
    limiting: Option<LimitingFactor>,
    occupants: BTreeSet<EntityId>,
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(DEFAULT_WATER, DEFAULT_FERTILITY, DEFAULT_TEMPERATURE)
    }
}

impl Cell {
    /// Creates an empty cell with the provided environment.
    #[must_use]
    pub fn new(water: f64, fertility: f64, temperature: f64) -> Self {
        let water = clamp01(water);
        Self {
            biomass: [0; GUILD_COUNT],
            water,
            fertility: clamp01(fertility),
            temperature: clamp01(temperature),
            water_history: VecDeque::from([water]),
            limiting: None,
            occupants: BTreeSet::new(),
        }
    }

    /// Returns the cell with `guild` set to `amount`.
    #[must_use]
    pub fn with_biomass(mut self, guild: Guild, amount: u32) -> Self {
        self.set_biomass(guild, amount);
        self
    }

    pub(crate) fn restore(
        biomass: [u32; GUILD_COUNT],
        water: f64,
        fertility: f64,
        temperature: f64,
        water_history: VecDeque<f64>,
        limiting: Option<LimitingFactor>,
    ) -> Self {
        Self {
            biomass,
            water,
            fertility,
            temperature,
            water_history,
            limiting,
            occupants: BTreeSet::new(),
        }
    }

    /// Biomass currently held by `guild`.
    #[must_use]
    pub fn biomass(&self, guild: Guild) -> u32 {
        self.biomass[guild.index()]
    }

    /// Overwrites the biomass of `guild`.
    ///
    /// Layer capacity is not enforced here; the growth pass clamps layers
    /// every tick, and [`Cell::clamp_layers`] can be called explicitly.
    pub fn set_biomass(&mut self, guild: Guild, amount: u32) {
        self.biomass[guild.index()] = amount;
    }

    /// Removes up to `wanted` biomass from `guild`, returning the amount taken.
    pub fn take_biomass(&mut self, guild: Guild, wanted: u32) -> u32 {
        let slot = &mut self.biomass[guild.index()];
        let taken = (*slot).min(wanted);
        *slot -= taken;
        taken
    }

    /// Iterates `(guild, biomass)` pairs in catalog order.
    pub fn producers(&self) -> impl Iterator<Item = (Guild, u32)> + '_ {
        Guild::ALL
            .into_iter()
            .map(move |guild| (guild, self.biomass[guild.index()]))
    }

    /// Total biomass held by the guilds of `layer`.
    #[must_use]
    pub fn layer_total(&self, layer: Layer) -> u32 {
        Guild::in_layer(layer)
            .map(|guild| self.biomass(guild))
            .fold(0u32, u32::saturating_add)
    }

    /// Total biomass across every guild.
    #[must_use]
    pub fn total_biomass(&self) -> u64 {
        self.biomass.iter().map(|amount| u64::from(*amount)).sum()
    }

    /// Densest guild in the cell, if any guild is present.
    ///
    /// Ties resolve to the guild listed first in the catalog.
    #[must_use]
    pub fn dominant_guild(&self) -> Option<Guild> {
        let mut best: Option<(Guild, u32)> = None;
        for (guild, amount) in self.producers() {
            if amount > best.map_or(0, |(_, value)| value) {
                best = Some((guild, amount));
            }
        }
        best.map(|(guild, _)| guild)
    }

    /// Current water level.
    #[must_use]
    pub fn water(&self) -> f64 {
        self.water
    }

    /// Soil fertility.
    #[must_use]
    pub fn fertility(&self) -> f64 {
        self.fertility
    }

    /// Fixed cell temperature.
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Sets the water level and records it in the history window.
    ///
    /// The oldest samples are evicted once more than `window` are held.
    pub fn set_water(&mut self, value: f64, window: usize) {
        self.water = clamp01(value);
        self.water_history.push_back(self.water);
        self.trim_water_history(window);
    }

    /// Sets the soil fertility, clamped to `[0, 1]`.
    pub fn set_fertility(&mut self, value: f64) {
        self.fertility = clamp01(value);
    }

    /// Sets the cell temperature, clamped to `[0, 1]`.
    pub fn set_temperature(&mut self, value: f64) {
        self.temperature = clamp01(value);
    }

    /// Recorded water samples, oldest first.
    pub fn water_history(&self) -> impl Iterator<Item = f64> + '_ {
        self.water_history.iter().copied()
    }

    /// Mean of the water history; smooths transient water noise.
    #[must_use]
    pub fn water_average(&self) -> f64 {
        if self.water_history.is_empty() {
            return self.water;
        }
        self.water_history.iter().sum::<f64>() / self.water_history.len() as f64
    }

    /// Most recently binding growth constraint.
    #[must_use]
    pub fn limiting_factor(&self) -> Option<LimitingFactor> {
        self.limiting
    }

    /// Stores the binding growth constraint, clamping its severity to `[0, 1]`.
    pub fn set_limiting_factor(&mut self, limiting: Option<LimitingFactor>) {
        self.limiting = limiting.map(|limiting| LimitingFactor {
            factor: limiting.factor,
            value: clamp01(limiting.value),
        });
    }

    /// Capacity of `layer` under the cell's current environment.
    ///
    /// Moisture, fertility, temperature alignment, limiting-factor severity,
    /// standing water and a canopy bias all scale the layer's base cap. The
    /// result never drops below a small positive floor.
    #[must_use]
    pub fn layer_capacity(&self, layer: Layer) -> u32 {
        let base = f64::from(layer.base_capacity().max(1));
        let moisture = 0.45 + 0.55 * self.water_average();
        let fertility = 0.4 + 0.6 * self.fertility;
        let delta = (self.temperature - layer.preferred_temperature()).abs();
        let alignment = (1.0 - (delta * 1.35).min(1.0)).max(0.0);
        let temperature = 0.5 + 0.5 * alignment;
        let severity = self.limiting.map_or(1.0, |limiting| limiting.value);
        let limiting = 0.6 + 0.4 * severity;
        let resilience = 0.85 + 0.3 * self.water;
        let bias = match layer {
            Layer::Ground => 1.0,
            Layer::Canopy => 0.9 + 0.2 * self.fertility,
        };
        let factor = (moisture * fertility * temperature * resilience * limiting * bias)
            .clamp(0.3, 1.4);
        let capacity = (base * factor).round_ties_even() as u32;
        capacity.max(MIN_LAYER_CAPACITY)
    }

    /// Scales `layer` down so it holds exactly `capacity` when it exceeds it.
    ///
    /// Shares are apportioned by largest remainder, ties going to the guild
    /// listed first in the catalog, so the clamped layer sums to `capacity`.
    pub fn clamp_layer(&mut self, layer: Layer, capacity: u32) -> Option<LayerClamp> {
        let total = self.layer_total(layer);
        if total <= capacity {
            return None;
        }

        if capacity == 0 {
            for guild in Guild::in_layer(layer) {
                self.set_biomass(guild, 0);
            }
            return Some(LayerClamp {
                layer,
                total,
                capacity,
            });
        }

        let total_wide = u64::from(total);
        let capacity_wide = u64::from(capacity);
        let mut assigned = 0u64;
        let mut remainders: Vec<(u64, Guild)> = Vec::new();
        for guild in Guild::in_layer(layer) {
            let scaled = u64::from(self.biomass(guild)) * capacity_wide;
            let share = scaled / total_wide;
            assigned += share;
            remainders.push((scaled % total_wide, guild));
            self.set_biomass(guild, share as u32);
        }

        remainders.sort_by(|left, right| right.0.cmp(&left.0).then(left.1.cmp(&right.1)));
        let leftover = capacity_wide.saturating_sub(assigned) as usize;
        for &(_, guild) in remainders.iter().take(leftover) {
            self.biomass[guild.index()] += 1;
        }

        Some(LayerClamp {
            layer,
            total,
            capacity,
        })
    }

    /// Clamps every layer to its current capacity.
    pub fn clamp_layers(&mut self) -> Vec<LayerClamp> {
        let mut clamps = Vec::new();
        for layer in Layer::ALL {
            let capacity = self.layer_capacity(layer);
            if let Some(clamp) = self.clamp_layer(layer, capacity) {
                clamps.push(clamp);
            }
        }
        clamps
    }

    /// Identifiers of the entities currently occupying the cell, ascending.
    pub fn occupants(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.occupants.iter().copied()
    }

    /// Number of entities occupying the cell.
    #[must_use]
    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    pub(crate) fn trim_water_history(&mut self, window: usize) {
        while self.water_history.len() > window.max(1) {
            let _ = self.water_history.pop_front();
        }
    }

    pub(crate) fn add_occupant(&mut self, id: EntityId) {
        let _ = self.occupants.insert(id);
    }

    pub(crate) fn remove_occupant(&mut self, id: EntityId) {
        let _ = self.occupants.remove(&id);
    }

    pub(crate) fn take_occupants(&mut self) -> BTreeSet<EntityId> {
        std::mem::take(&mut self.occupants)
    }

    pub(crate) fn replace_occupants(&mut self, occupants: BTreeSet<EntityId>) {
        self.occupants = occupants;
    }
}

/// Outcome of clamping one layer down to its capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerClamp {
    /// Layer that was clamped.
    pub layer: Layer,
    /// Layer biomass before the clamp.
    pub total: u32,
    /// Capacity the layer was clamped to.
    pub capacity: u32,
}

pub(crate) fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::Cell;
    use patient_world_core::{Guild, Layer};

    #[test]
    fn environment_is_clamped_on_write() {
        let mut cell = Cell::new(1.4, -0.2, 0.5);
        assert!((cell.water() - 1.0).abs() < f64::EPSILON);
        assert!(cell.fertility().abs() < f64::EPSILON);

        cell.set_temperature(3.0);
        assert!((cell.temperature() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn water_history_evicts_oldest_samples() {
        let mut cell = Cell::new(0.2, 0.5, 0.5);
        for value in [0.4, 0.6, 0.8] {
            cell.set_water(value, 3);
        }
        let history: Vec<f64> = cell.water_history().collect();
        assert_eq!(history, vec![0.4, 0.6, 0.8]);
        assert!((cell.water_average() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn take_biomass_saturates_at_zero() {
        let mut cell = Cell::default().with_biomass(Guild::FastGrass, 4);
        assert_eq!(cell.take_biomass(Guild::FastGrass, 6), 4);
        assert_eq!(cell.biomass(Guild::FastGrass), 0);
        assert_eq!(cell.take_biomass(Guild::FastGrass, 6), 0);
    }

    #[test]
    fn clamp_scales_layer_proportionally_to_capacity() {
        let mut cell = Cell::default()
            .with_biomass(Guild::FastGrass, 90)
            .with_biomass(Guild::MossCarpet, 60)
            .with_biomass(Guild::SlowShrubs, 40);

        let clamp = cell
            .clamp_layer(Layer::Ground, 100)
            .expect("ground layer exceeds capacity");

        assert_eq!(clamp.total, 150);
        assert_eq!(clamp.capacity, 100);
        assert_eq!(cell.biomass(Guild::FastGrass), 60);
        assert_eq!(cell.biomass(Guild::MossCarpet), 40);
        assert_eq!(cell.layer_total(Layer::Ground), 100);
        assert_eq!(cell.biomass(Guild::SlowShrubs), 40, "canopy untouched");
    }

    #[test]
    fn clamp_distributes_rounding_remainder_exactly() {
        let mut cell = Cell::default()
            .with_biomass(Guild::FastGrass, 10)
            .with_biomass(Guild::LichenCrust, 10)
            .with_biomass(Guild::MossCarpet, 10);

        let _ = cell.clamp_layer(Layer::Ground, 20);
        assert_eq!(cell.layer_total(Layer::Ground), 20);
        assert_eq!(cell.biomass(Guild::FastGrass), 7);
        assert_eq!(cell.biomass(Guild::LichenCrust), 7);
        assert_eq!(cell.biomass(Guild::MossCarpet), 6);
    }

    #[test]
    fn clamp_below_capacity_is_a_no_op() {
        let mut cell = Cell::default().with_biomass(Guild::FastGrass, 30);
        assert!(cell.clamp_layer(Layer::Ground, 100).is_none());
        assert_eq!(cell.biomass(Guild::FastGrass), 30);
    }

    #[test]
    fn capacity_never_collapses_below_floor() {
        let cell = Cell::new(0.0, 0.0, 1.0);
        assert!(cell.layer_capacity(Layer::Ground) >= 8);
        assert!(cell.layer_capacity(Layer::Canopy) >= 8);
    }

    #[test]
    fn dominant_guild_prefers_catalog_order_on_ties() {
        let cell = Cell::default()
            .with_biomass(Guild::MossCarpet, 12)
            .with_biomass(Guild::FastGrass, 12);
        assert_eq!(cell.dominant_guild(), Some(Guild::FastGrass));
        assert_eq!(Cell::default().dominant_guild(), None);
    }
}
