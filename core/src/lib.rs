#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Patient World simulation.
//!
//! This crate owns everything that is static or purely descriptive: the
//! producer catalog, species profiles, identifiers, coordinates, the capacity
//! event record, and the tuning surface. The authoritative grid lives in
//! `patient-world-grid`; systems read and mutate that grid using only the
//! vocabulary defined here, and thread an explicit random generator through
//! every stochastic decision.

mod catalog;
mod config;
mod species;

use serde::{Deserialize, Serialize};

pub use catalog::{
    season_phase, Guild, Layer, ProducerProfile, SeasonWindow, SeedingDependency,
    WaterTolerance, GUILD_COUNT,
};
pub use config::{
    ConfigError, DiffusionTuning, FaunaTuning, GrowthTuning, SimulationConfig, WaterTuning,
    DEFAULT_WATER_HISTORY_WINDOW,
};
pub use species::{Diet, HerbivoreProfile, PredatorProfile, Species};

/// Version tag written into every serialized grid state.
///
/// Payloads carrying an older tag must be migrated by external tooling
/// before the core will load them.
pub const STATE_FORMAT_VERSION: u32 = 3;

/// Unique identifier assigned to an entity; never reused.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

/// Environmental inputs that can bind producer growth.
///
/// Variants are declared in lexicographic order of their names so that the
/// derived ordering doubles as the deterministic tie-break.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GrowthFactor {
    /// Shading and moisture retention from surrounding ground cover.
    Facilitation,
    /// Soil fertility of the cell.
    Fertility,
    /// Position inside the recurring season.
    Season,
    /// Alignment of the cell temperature with the seasonal ambient temperature.
    Temperature,
    /// Smoothed water level of the cell.
    Water,
}

impl GrowthFactor {
    /// Every factor in lexicographic order.
    pub const ALL: [GrowthFactor; 5] = [
        GrowthFactor::Facilitation,
        GrowthFactor::Fertility,
        GrowthFactor::Season,
        GrowthFactor::Temperature,
        GrowthFactor::Water,
    ];

    /// Canonical lowercase name of the factor.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Facilitation => "facilitation",
            Self::Fertility => "fertility",
            Self::Season => "season",
            Self::Temperature => "temperature",
            Self::Water => "water",
        }
    }
}

/// Most recently binding growth constraint of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LimitingFactor {
    /// Factor with the lowest value.
    pub factor: GrowthFactor,
    /// Severity of the factor in `[0, 1]`; lower binds harder.
    pub value: f64,
}

/// Record of a layer being clamped down to its capacity during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapacityEvent {
    /// Day on which the clamp happened.
    pub day: u64,
    /// Cell whose layer was clamped.
    pub cell: CellCoord,
    /// Layer that exceeded its capacity.
    pub layer: Layer,
    /// Layer biomass before the clamp.
    pub total: u32,
    /// Capacity the layer was clamped to.
    pub capacity: u32,
}
