//! Behavioural profiles for every animal species.

use serde::{Deserialize, Serialize};

use crate::Guild;

/// Animal species tag carried by every entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// Small, fast-breeding grazer.
    Rabbit,
    /// Large herd grazer preferring grass.
    Grazer,
    /// Browser preferring shrubs and young trees.
    Browser,
    /// Predator hunting rabbits.
    Fox,
}

impl Species {
    /// Every species in registry order.
    pub const ALL: [Species; 4] = [
        Species::Rabbit,
        Species::Grazer,
        Species::Browser,
        Species::Fox,
    ];

    /// Canonical lowercase name of the species.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rabbit => "rabbit",
            Self::Grazer => "grazer",
            Self::Browser => "browser",
            Self::Fox => "fox",
        }
    }

    /// Feeding role and the profile that drives it.
    #[must_use]
    pub fn diet(self) -> Diet {
        match self {
            Self::Rabbit => Diet::Herbivore(&RABBIT),
            Self::Grazer => Diet::Herbivore(&GRAZER),
            Self::Browser => Diet::Herbivore(&BROWSER),
            Self::Fox => Diet::Predator(&FOX),
        }
    }

    /// Reports whether the species grazes vegetation.
    #[must_use]
    pub fn is_herbivore(self) -> bool {
        matches!(self.diet(), Diet::Herbivore(_))
    }

    /// Hunger at which an individual of the species dies.
    #[must_use]
    pub fn death_hunger(self) -> u32 {
        match self.diet() {
            Diet::Herbivore(profile) => profile.death_hunger,
            Diet::Predator(profile) => profile.death_hunger,
        }
    }
}

/// Feeding role of a species.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Diet {
    /// Grazes producer biomass from its own cell.
    Herbivore(&'static HerbivoreProfile),
    /// Hunts prey sharing its cell.
    Predator(&'static PredatorProfile),
}

/// Grazing, hunger and breeding traits of a herbivore.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HerbivoreProfile {
    /// Guilds grazed in priority order.
    pub diet: &'static [Guild],
    /// Biomass an individual tries to consume per tick.
    pub intake: u32,
    /// Hunger gained per tick.
    pub hunger_rate: u32,
    /// Consumption that counts as a full meal.
    pub satiation_threshold: u32,
    /// Hunger removed by a full meal.
    pub hunger_relief: u32,
    /// Hunger removed by a partial meal.
    pub partial_relief: u32,
    /// Age that must be exceeded before breeding.
    pub reproduction_age: u32,
    /// Hunger at or below which breeding is attempted.
    pub reproduction_hunger: u32,
    /// Base breeding probability per eligible tick.
    pub reproduction_chance: f64,
    /// Hunger at which the individual dies.
    pub death_hunger: u32,
}

/// Hunting, hunger and breeding traits of a predator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PredatorProfile {
    /// Species hunted when sharing a cell.
    pub prey: &'static [Species],
    /// Hunger gained per tick.
    pub hunger_rate: u32,
    /// Hunger removed by a kill.
    pub hunger_relief: u32,
    /// Age that must be exceeded before breeding.
    pub reproduction_age: u32,
    /// Hunger at or below which breeding is attempted.
    pub reproduction_hunger: u32,
    /// Breeding probability per eligible tick.
    pub reproduction_chance: f64,
    /// Hunger at which the individual dies.
    pub death_hunger: u32,
}

const DEATH_HUNGER: u32 = 10;

static RABBIT: HerbivoreProfile = HerbivoreProfile {
    diet: &[
        Guild::SeasonalAnnuals,
        Guild::FastGrass,
        Guild::ForbWildflowers,
        Guild::ReedBeds,
        Guild::BogSedges,
        Guild::MossCarpet,
        Guild::SucculentCluster,
        Guild::DesertBloomers,
        Guild::SlowShrubs,
    ],
    intake: 6,
    hunger_rate: 1,
    satiation_threshold: 4,
    hunger_relief: 3,
    partial_relief: 1,
    reproduction_age: 5,
    reproduction_hunger: 2,
    reproduction_chance: 0.2,
    death_hunger: DEATH_HUNGER,
};

static GRAZER: HerbivoreProfile = HerbivoreProfile {
    diet: &[Guild::FastGrass, Guild::SeasonalAnnuals, Guild::SlowShrubs],
    intake: 9,
    hunger_rate: 2,
    satiation_threshold: 6,
    hunger_relief: 4,
    partial_relief: 1,
    reproduction_age: 12,
    reproduction_hunger: 3,
    reproduction_chance: 0.18,
    death_hunger: DEATH_HUNGER,
};

static BROWSER: HerbivoreProfile = HerbivoreProfile {
    diet: &[
        Guild::SlowShrubs,
        Guild::DeepRoots,
        Guild::FastGrass,
        Guild::SeasonalAnnuals,
    ],
    intake: 7,
    hunger_rate: 2,
    satiation_threshold: 5,
    hunger_relief: 4,
    partial_relief: 1,
    reproduction_age: 10,
    reproduction_hunger: 3,
    reproduction_chance: 0.16,
    death_hunger: DEATH_HUNGER,
};

static FOX: PredatorProfile = PredatorProfile {
    prey: &[Species::Rabbit],
    hunger_rate: 1,
    hunger_relief: 5,
    reproduction_age: 10,
    reproduction_hunger: 3,
    reproduction_chance: 0.15,
    death_hunger: DEATH_HUNGER,
};
