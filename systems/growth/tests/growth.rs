use patient_world_core::{
    CellCoord, Guild, GrowthFactor, GrowthTuning, Layer, LimitingFactor,
};
use patient_world_grid::{Cell, GridState};
use patient_world_system_growth::{
    ambient_temperature, crowding_penalty, facilitation_factor, resource_multiplier,
    season_factor, FactorReadings, Growth,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MID_SEASON: u64 = 60;

fn quiet() -> GrowthTuning {
    GrowthTuning {
        noise_scale: 0.0,
        ..GrowthTuning::default()
    }
}

fn single_cell(cell: Cell, day: u64) -> GridState {
    let mut state = GridState::new(1, 1).expect("grid");
    state.set_cell(CellCoord::new(0, 0), cell).expect("cell");
    state.set_day(day);
    state
}

fn origin(state: &GridState) -> &Cell {
    state.cell(CellCoord::new(0, 0)).expect("cell")
}

#[test]
fn aligned_cell_grows_from_seed_floor_without_clamping() {
    let profile = Guild::FastGrass.profile();
    let ambient = ambient_temperature(0.5);
    let cell = Cell::new(profile.water_optimum, 1.0, ambient)
        .with_biomass(Guild::FastGrass, profile.seed_floor);
    let mut state = single_cell(cell.clone(), MID_SEASON);
    let tuning = quiet();

    let readings = FactorReadings {
        fertility: 1.0,
        temperature: 1.0,
        season: season_factor(0.5),
        facilitation: facilitation_factor(profile.seed_floor, &[]),
        water: profile.water_optimum,
    };
    let multiplier = resource_multiplier(&readings, &tuning, &mut ChaCha8Rng::seed_from_u64(0));
    let mut expected_cell = cell;
    expected_cell.set_limiting_factor(Some(readings.limiting()));
    let crowding = crowding_penalty(
        profile.seed_floor,
        expected_cell.layer_capacity(Layer::Ground),
        &tuning,
    );
    let delta = (f64::from(profile.seed_floor) * profile.growth_rate * multiplier * crowding)
        .round_ties_even() as u32;

    Growth::new(tuning).apply(&mut state, &mut ChaCha8Rng::seed_from_u64(0));

    assert_eq!(
        origin(&state).biomass(Guild::FastGrass),
        (profile.seed_floor + delta).min(profile.max_density)
    );
    assert!(state.capacity_events().is_empty(), "no clamp expected");
    assert_eq!(
        origin(&state).limiting_factor().map(|limiting| limiting.factor),
        Some(GrowthFactor::Facilitation)
    );
}

#[test]
fn extinct_guild_reestablishes_within_a_few_ticks() {
    let cell = Cell::new(0.6, 0.7, 0.6);
    let mut state = single_cell(cell, 0);
    let growth = Growth::new(GrowthTuning::default());
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    let mut reestablished = None;
    for tick in 0..5 {
        growth.apply(&mut state, &mut rng);
        state.advance_day();
        if origin(&state).biomass(Guild::FastGrass) > 0 {
            reestablished = Some(tick);
            break;
        }
    }
    assert_eq!(reestablished, Some(0), "fast grass should return on the first tick");
}

#[test]
fn blocking_fertility_halts_established_growth_but_reseeds_empty_guilds() {
    let cell = Cell::new(0.68, 0.1, 0.6).with_biomass(Guild::FastGrass, 20);
    let mut state = single_cell(cell, MID_SEASON);

    Growth::new(quiet()).apply(&mut state, &mut ChaCha8Rng::seed_from_u64(3));

    let cell = origin(&state);
    assert_eq!(cell.biomass(Guild::FastGrass), 20);
    assert_eq!(cell.biomass(Guild::SeasonalAnnuals), 1, "in-season guild is forced back");
    assert_eq!(cell.biomass(Guild::LichenCrust), 0, "water outside its band");
    assert_eq!(
        cell.limiting_factor().map(|limiting| limiting.factor),
        Some(GrowthFactor::Fertility)
    );
}

#[test]
fn dormant_guilds_decay_outside_their_window() {
    let cell = Cell::new(0.72, 0.8, 0.6).with_biomass(Guild::SeasonalAnnuals, 40);
    let mut state = single_cell(cell, 0);

    Growth::new(quiet()).apply(&mut state, &mut ChaCha8Rng::seed_from_u64(5));

    assert_eq!(origin(&state).biomass(Guild::SeasonalAnnuals), 18);
}

#[test]
fn drought_stress_trims_water_loving_guilds() {
    let cell = Cell::new(0.3, 0.8, 0.6).with_biomass(Guild::MossCarpet, 40);
    let mut state = single_cell(cell, MID_SEASON);

    Growth::new(quiet()).apply(&mut state, &mut ChaCha8Rng::seed_from_u64(5));

    assert_eq!(origin(&state).biomass(Guild::MossCarpet), 33);
}

#[test]
fn overfull_ground_layer_is_clamped_with_one_event() {
    let cell = Cell::new(0.68, 0.2, 0.7)
        .with_biomass(Guild::FastGrass, 80)
        .with_biomass(Guild::ForbWildflowers, 40);
    let mut state = single_cell(cell, MID_SEASON);

    Growth::new(quiet()).apply(&mut state, &mut ChaCha8Rng::seed_from_u64(9));

    let events = state.capacity_events();
    assert_eq!(events.len(), 1, "only the ground layer overflows");
    let event = events[0];
    assert_eq!(event.layer, Layer::Ground);
    assert_eq!(event.day, MID_SEASON);
    assert!(event.total > event.capacity);

    let cell = origin(&state);
    assert_eq!(cell.layer_total(Layer::Ground), event.capacity);
    assert_eq!(cell.layer_capacity(Layer::Ground), event.capacity);
}

#[test]
fn layers_respect_capacity_after_every_tick() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut state = GridState::new(4, 4).expect("grid");
    let coords: Vec<CellCoord> = state.coords().collect();
    for coord in coords {
        let mut cell = Cell::new(
            rng.gen_range(0.2..0.95),
            rng.gen_range(0.2..0.9),
            rng.gen_range(0.2..0.85),
        );
        for guild in Guild::ALL {
            cell.set_biomass(guild, rng.gen_range(0..=guild.profile().max_density));
        }
        cell.set_limiting_factor(Some(LimitingFactor {
            factor: GrowthFactor::Water,
            value: rng.gen_range(0.0..1.0),
        }));
        state.set_cell(coord, cell).expect("cell");
    }

    let growth = Growth::default();
    for _ in 0..40 {
        state.clear_capacity_events();
        growth.apply(&mut state, &mut rng);
        for (coord, cell) in state.cells() {
            for layer in Layer::ALL {
                assert!(
                    cell.layer_total(layer) <= cell.layer_capacity(layer),
                    "{} layer of {coord:?} exceeds capacity on day {}",
                    layer.name(),
                    state.day()
                );
            }
            for guild in Guild::ALL {
                assert!(cell.biomass(guild) <= guild.profile().max_density);
            }
        }
        state.advance_day();
    }
}

#[test]
fn facilitation_reads_pre_tick_ground_cover() {
    let mut state = GridState::new(2, 1).expect("grid");
    state
        .set_cell(
            CellCoord::new(0, 0),
            Cell::new(0.68, 0.9, 0.7).with_biomass(Guild::FastGrass, 60),
        )
        .expect("cell");
    state
        .set_cell(CellCoord::new(1, 0), Cell::new(0.68, 0.9, 0.7))
        .expect("cell");
    state.set_day(MID_SEASON);
    let mut mirrored = GridState::new(2, 1).expect("grid");
    mirrored
        .set_cell(CellCoord::new(0, 0), Cell::new(0.68, 0.9, 0.7))
        .expect("cell");
    mirrored
        .set_cell(
            CellCoord::new(1, 0),
            Cell::new(0.68, 0.9, 0.7).with_biomass(Guild::FastGrass, 60),
        )
        .expect("cell");
    mirrored.set_day(MID_SEASON);

    let growth = Growth::new(quiet());
    growth.apply(&mut state, &mut ChaCha8Rng::seed_from_u64(1));
    growth.apply(&mut mirrored, &mut ChaCha8Rng::seed_from_u64(1));

    let cell = |grid: &GridState, x: u32| grid.cell(CellCoord::new(x, 0)).expect("cell").clone();
    assert_eq!(cell(&state, 0), cell(&mirrored, 1));
    assert_eq!(cell(&state, 1), cell(&mirrored, 0));
}
