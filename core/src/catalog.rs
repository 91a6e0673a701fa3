//! Static producer catalog describing every vegetation guild.

use serde::{Deserialize, Serialize};

/// Number of guilds tracked by every cell.
pub const GUILD_COUNT: usize = 18;

/// Vertical stratum that shares one biomass capacity inside a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Low vegetation: grasses, forbs, mosses and mats.
    Ground,
    /// Woody and climbing vegetation above the ground layer.
    Canopy,
}

impl Layer {
    /// Every layer in evaluation order.
    pub const ALL: [Layer; 2] = [Layer::Ground, Layer::Canopy];

    /// Base capacity before environmental modifiers are applied.
    #[must_use]
    pub const fn base_capacity(self) -> u32 {
        match self {
            Self::Ground => 200,
            Self::Canopy => 150,
        }
    }

    /// Multiplier applied to the growth rate of guilds living in the layer.
    #[must_use]
    pub const fn growth_bias(self) -> f64 {
        match self {
            Self::Ground => 1.0,
            Self::Canopy => 1.12,
        }
    }

    /// Cell temperature at which the layer reaches its full capacity.
    #[must_use]
    pub const fn preferred_temperature(self) -> f64 {
        match self {
            Self::Ground => 0.55,
            Self::Canopy => 0.68,
        }
    }

    /// Canonical lowercase name of the layer.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::Canopy => "canopy",
        }
    }
}

/// Vegetation guild with its own growth profile.
///
/// Variants are declared in catalog order, which is also the order in which
/// the growth engine updates them each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guild {
    /// Fast-growing grass that anchors most ground cover.
    FastGrass,
    /// Short-lived annuals active early in the season.
    SeasonalAnnuals,
    /// Wildflowers that establish among dense grass.
    ForbWildflowers,
    /// Slow crust tolerant of dry ground.
    LichenCrust,
    /// Shrubs forming the first canopy stage.
    SlowShrubs,
    /// Deep-rooted trees following shrubs.
    DeepRoots,
    /// Moisture-loving moss mats.
    MossCarpet,
    /// Reeds that need near-saturated ground.
    ReedBeds,
    /// Sedges of boggy cells.
    BogSedges,
    /// Fungal mats following moss in the late season.
    FungalMat,
    /// Drought-tolerant succulents.
    SucculentCluster,
    /// Short desert bloom following succulents.
    DesertBloomers,
    /// Fruit-bearing trees following shrubs.
    FruitTrees,
    /// Conifers following deep-rooted trees.
    NeedleConifers,
    /// Brush colonising dense grassland.
    PioneerBrush,
    /// Seasonal vines climbing shrubs.
    VineCanopy,
    /// Palms following fruit trees in wet cells.
    PalmCrowns,
    /// Mangroves following bog sedges.
    MangroveCanopy,
}

impl Guild {
    /// Every guild in catalog order.
    pub const ALL: [Guild; GUILD_COUNT] = [
        Guild::FastGrass,
        Guild::SeasonalAnnuals,
        Guild::ForbWildflowers,
        Guild::LichenCrust,
        Guild::SlowShrubs,
        Guild::DeepRoots,
        Guild::MossCarpet,
        Guild::ReedBeds,
        Guild::BogSedges,
        Guild::FungalMat,
        Guild::SucculentCluster,
        Guild::DesertBloomers,
        Guild::FruitTrees,
        Guild::NeedleConifers,
        Guild::PioneerBrush,
        Guild::VineCanopy,
        Guild::PalmCrowns,
        Guild::MangroveCanopy,
    ];

    /// Dense index of the guild inside per-cell biomass arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Static growth profile for the guild.
    #[must_use]
    pub fn profile(self) -> &'static ProducerProfile {
        &PROFILES[self.index()]
    }

    /// Layer the guild competes in.
    #[must_use]
    pub fn layer(self) -> Layer {
        self.profile().layer
    }

    /// Canonical snake_case key of the guild.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FastGrass => "fast_grass",
            Self::SeasonalAnnuals => "seasonal_annuals",
            Self::ForbWildflowers => "forb_wildflowers",
            Self::LichenCrust => "lichen_crust",
            Self::SlowShrubs => "slow_shrubs",
            Self::DeepRoots => "deep_roots",
            Self::MossCarpet => "moss_carpet",
            Self::ReedBeds => "reed_beds",
            Self::BogSedges => "bog_sedges",
            Self::FungalMat => "fungal_mat",
            Self::SucculentCluster => "succulent_cluster",
            Self::DesertBloomers => "desert_bloomers",
            Self::FruitTrees => "fruit_trees",
            Self::NeedleConifers => "needle_conifers",
            Self::PioneerBrush => "pioneer_brush",
            Self::VineCanopy => "vine_canopy",
            Self::PalmCrowns => "palm_crowns",
            Self::MangroveCanopy => "mangrove_canopy",
        }
    }

    /// Resolves a guild from its canonical key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|guild| guild.key() == key)
    }

    /// Iterates the guilds belonging to `layer` in catalog order.
    pub fn in_layer(layer: Layer) -> impl Iterator<Item = Guild> {
        Self::ALL
            .into_iter()
            .filter(move |guild| guild.layer() == layer)
    }
}

/// Fractions of the season during which a guild is active.
///
/// A window whose start exceeds its end wraps around the end of the year.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeasonWindow {
    /// Phase at which activity begins.
    pub start: f64,
    /// Phase at which activity ends, inclusive.
    pub end: f64,
}

impl SeasonWindow {
    /// Reports whether `phase` falls inside the window.
    #[must_use]
    pub fn contains(&self, phase: f64) -> bool {
        if self.start <= self.end {
            self.start <= phase && phase <= self.end
        } else {
            phase >= self.start || phase <= self.end
        }
    }
}

/// Spontaneous establishment of a guild once another guild is dense enough.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedingDependency {
    /// Guild whose biomass gates seeding.
    pub source: Guild,
    /// Minimum biomass of `source` before seeding happens.
    pub threshold: u32,
    /// Biomass granted when seeding fires.
    pub amount: u32,
}

/// Water band inside which a guild can grow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterTolerance {
    /// Lower edge; smoothed water at or below it blocks growth.
    pub min: f64,
    /// Upper edge; smoothed water at or above it blocks growth.
    pub max: f64,
}

/// Immutable growth traits of a guild.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProducerProfile {
    /// Guild described by the profile.
    pub guild: Guild,
    /// Layer sharing capacity with the guild.
    pub layer: Layer,
    /// Hard per-guild biomass ceiling.
    pub max_density: u32,
    /// Base proportional growth per tick.
    pub growth_rate: f64,
    /// Minimum biomass assumed when computing proportional growth.
    pub seed_floor: u32,
    /// Active part of the season; `None` means always active.
    pub seasonal_window: Option<SeasonWindow>,
    /// Fraction of biomass lost per tick outside the seasonal window.
    pub dormancy_decay: f64,
    /// Optional spontaneous seeding rule.
    pub seeding: Option<SeedingDependency>,
    /// Smoothed water level at which growth peaks.
    pub water_optimum: f64,
    /// Water band outside which growth stops.
    pub water_tolerance: WaterTolerance,
}

const BASE: ProducerProfile = ProducerProfile {
    guild: Guild::FastGrass,
    layer: Layer::Ground,
    max_density: 0,
    growth_rate: 0.0,
    seed_floor: 0,
    seasonal_window: None,
    dormancy_decay: 0.35,
    seeding: None,
    water_optimum: 0.6,
    water_tolerance: WaterTolerance {
        min: 0.2,
        max: 0.95,
    },
};

const fn window(start: f64, end: f64) -> Option<SeasonWindow> {
    Some(SeasonWindow { start, end })
}

const fn seeded_by(source: Guild, threshold: u32, amount: u32) -> Option<SeedingDependency> {
    Some(SeedingDependency {
        source,
        threshold,
        amount,
    })
}

const fn band(min: f64, max: f64) -> WaterTolerance {
    WaterTolerance { min, max }
}

static PROFILES: [ProducerProfile; GUILD_COUNT] = [
    ProducerProfile {
        guild: Guild::FastGrass,
        max_density: 85,
        growth_rate: 0.25,
        seed_floor: 8,
        water_optimum: 0.68,
        water_tolerance: band(0.32, 0.95),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::SeasonalAnnuals,
        max_density: 55,
        growth_rate: 0.35,
        seed_floor: 5,
        seasonal_window: window(0.15, 0.55),
        dormancy_decay: 0.55,
        water_optimum: 0.72,
        water_tolerance: band(0.38, 0.98),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::ForbWildflowers,
        max_density: 50,
        growth_rate: 0.23,
        seed_floor: 5,
        seasonal_window: window(0.2, 0.7),
        dormancy_decay: 0.52,
        seeding: seeded_by(Guild::FastGrass, 32, 5),
        water_optimum: 0.66,
        water_tolerance: band(0.32, 0.92),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::LichenCrust,
        max_density: 28,
        growth_rate: 0.13,
        seed_floor: 3,
        water_optimum: 0.24,
        water_tolerance: band(0.03, 0.55),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::SlowShrubs,
        layer: Layer::Canopy,
        max_density: 65,
        growth_rate: 0.12,
        seed_floor: 4,
        seeding: seeded_by(Guild::FastGrass, 40, 6),
        water_optimum: 0.46,
        water_tolerance: band(0.18, 0.88),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::DeepRoots,
        layer: Layer::Canopy,
        max_density: 70,
        growth_rate: 0.08,
        seed_floor: 3,
        seeding: seeded_by(Guild::SlowShrubs, 25, 4),
        water_optimum: 0.34,
        water_tolerance: band(0.08, 0.9),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::MossCarpet,
        max_density: 50,
        growth_rate: 0.2,
        seed_floor: 6,
        water_optimum: 0.82,
        water_tolerance: band(0.5, 1.0),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::ReedBeds,
        max_density: 45,
        growth_rate: 0.22,
        seed_floor: 4,
        water_optimum: 0.9,
        water_tolerance: band(0.6, 1.0),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::BogSedges,
        max_density: 60,
        growth_rate: 0.24,
        seed_floor: 4,
        water_optimum: 0.88,
        water_tolerance: band(0.55, 1.0),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::FungalMat,
        max_density: 25,
        growth_rate: 0.27,
        seed_floor: 5,
        seasonal_window: window(0.4, 0.9),
        dormancy_decay: 0.7,
        seeding: seeded_by(Guild::MossCarpet, 20, 5),
        water_optimum: 0.78,
        water_tolerance: band(0.45, 0.99),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::SucculentCluster,
        max_density: 35,
        growth_rate: 0.16,
        seed_floor: 4,
        water_optimum: 0.28,
        water_tolerance: band(0.05, 0.55),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::DesertBloomers,
        max_density: 40,
        growth_rate: 0.21,
        seed_floor: 3,
        seasonal_window: window(0.05, 0.45),
        dormancy_decay: 0.6,
        seeding: seeded_by(Guild::SucculentCluster, 18, 3),
        water_optimum: 0.33,
        water_tolerance: band(0.08, 0.62),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::FruitTrees,
        layer: Layer::Canopy,
        max_density: 55,
        growth_rate: 0.1,
        seed_floor: 3,
        seeding: seeded_by(Guild::SlowShrubs, 35, 4),
        water_optimum: 0.58,
        water_tolerance: band(0.3, 0.9),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::NeedleConifers,
        layer: Layer::Canopy,
        max_density: 60,
        growth_rate: 0.09,
        seed_floor: 3,
        seeding: seeded_by(Guild::DeepRoots, 25, 4),
        water_optimum: 0.4,
        water_tolerance: band(0.15, 0.85),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::PioneerBrush,
        layer: Layer::Canopy,
        max_density: 50,
        growth_rate: 0.13,
        seed_floor: 3,
        seeding: seeded_by(Guild::FastGrass, 45, 4),
        water_optimum: 0.54,
        water_tolerance: band(0.2, 0.85),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::VineCanopy,
        layer: Layer::Canopy,
        max_density: 45,
        growth_rate: 0.14,
        seed_floor: 4,
        seasonal_window: window(0.2, 0.8),
        dormancy_decay: 0.5,
        seeding: seeded_by(Guild::SlowShrubs, 20, 5),
        water_optimum: 0.65,
        water_tolerance: band(0.3, 0.95),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::PalmCrowns,
        layer: Layer::Canopy,
        max_density: 48,
        growth_rate: 0.11,
        seed_floor: 2,
        seeding: seeded_by(Guild::FruitTrees, 28, 3),
        water_optimum: 0.76,
        water_tolerance: band(0.48, 0.98),
        ..BASE
    },
    ProducerProfile {
        guild: Guild::MangroveCanopy,
        layer: Layer::Canopy,
        max_density: 52,
        growth_rate: 0.12,
        seed_floor: 3,
        seeding: seeded_by(Guild::BogSedges, 35, 4),
        water_optimum: 0.9,
        water_tolerance: band(0.6, 1.0),
        ..BASE
    },
];

/// Relative position inside a recurring season of `season_length` days, in `[0, 1)`.
#[must_use]
pub fn season_phase(day: u64, season_length: u32) -> f64 {
    let length = u64::from(season_length.max(1));
    (day % length) as f64 / length as f64
}
