use patient_world_core::{CellCoord, Guild, GrowthFactor, LimitingFactor, Species};
use patient_world_grid::{query, Cell, GridError, GridState, StateError};

fn populated_grid() -> GridState {
    let mut grid = GridState::new(3, 2).expect("grid").with_water_window(4);
    let mut lush = Cell::new(0.7, 0.8, 0.55)
        .with_biomass(Guild::FastGrass, 40)
        .with_biomass(Guild::SlowShrubs, 12);
    lush.set_limiting_factor(Some(LimitingFactor {
        factor: GrowthFactor::Season,
        value: 0.4,
    }));
    grid.set_cell(CellCoord::new(1, 0), lush).expect("set cell");
    grid.set_water(CellCoord::new(1, 0), 0.5).expect("set water");
    grid.set_day(42);

    let _ = grid
        .spawn_with(Species::Rabbit, CellCoord::new(1, 0), 3, 8)
        .expect("rabbit");
    let _ = grid
        .spawn_with(Species::Fox, CellCoord::new(2, 1), 1, 14)
        .expect("fox");
    grid
}

fn rewrite(json: &str, from: &str, to: &str) -> String {
    assert!(json.contains(from), "fixture missing `{from}`");
    json.replacen(from, to, 1)
}

#[test]
fn json_round_trip_preserves_state_and_rebuilds_occupants() {
    let grid = populated_grid();
    let json = grid.to_json().expect("encode");

    let restored = GridState::from_json(&json).expect("decode");

    assert_eq!(restored, grid);
    let occupants: Vec<_> = restored
        .cell(CellCoord::new(1, 0))
        .expect("cell")
        .occupants()
        .collect();
    assert_eq!(occupants.len(), 1, "rabbit occupancy rebuilt from registry");
    assert_eq!(restored.digest().expect("digest"), grid.digest().expect("digest"));
}

#[test]
fn digest_changes_with_state() {
    let grid = populated_grid();
    let mut advanced = grid.clone();
    advanced.advance_day();

    let digest = grid.digest().expect("digest");
    assert_eq!(digest.len(), 64);
    assert_ne!(digest, advanced.digest().expect("digest"));
}

#[test]
fn outdated_versions_direct_caller_to_migration() {
    let json = rewrite(&populated_grid().to_json().expect("encode"), "\"version\":3", "\"version\":2");

    let error = GridState::from_json(&json).expect_err("outdated payload must fail");
    assert!(matches!(
        error,
        StateError::OutdatedFormat {
            found: 2,
            expected: 3
        }
    ));
    assert!(error.to_string().contains("migration"));
}

#[test]
fn unversioned_payloads_are_treated_as_legacy() {
    let error = GridState::from_json(r#"{"width":1,"height":1,"cells":[]}"#)
        .expect_err("legacy payload must fail");
    assert!(matches!(error, StateError::OutdatedFormat { found: 0, .. }));
}

#[test]
fn newer_versions_are_unsupported() {
    let json = rewrite(&populated_grid().to_json().expect("encode"), "\"version\":3", "\"version\":4");
    assert!(matches!(
        GridState::from_json(&json),
        Err(StateError::UnsupportedFormat { found: 4, .. })
    ));
}

#[test]
fn cell_count_must_match_dimensions() {
    let json = rewrite(&populated_grid().to_json().expect("encode"), "\"height\":2", "\"height\":3");
    assert!(matches!(
        GridState::from_json(&json),
        Err(StateError::Grid(GridError::CellCountMismatch {
            expected: 9,
            actual: 6,
            ..
        }))
    ));
}

#[test]
fn missing_fields_fail_the_load() {
    let json = rewrite(
        &populated_grid().to_json().expect("encode"),
        "\"next_entity_id\":3,",
        "",
    );
    assert!(matches!(GridState::from_json(&json), Err(StateError::Json(_))));
}

#[test]
fn environmental_fields_outside_unit_range_are_rejected() {
    let json = rewrite(
        &populated_grid().to_json().expect("encode"),
        "\"fertility\":0.8",
        "\"fertility\":1.8",
    );
    assert!(matches!(
        GridState::from_json(&json),
        Err(StateError::FieldOutOfRange {
            index: 1,
            field: "fertility",
            ..
        })
    ));
}

#[test]
fn water_history_longer_than_the_window_is_rejected() {
    let json = rewrite(
        &populated_grid().to_json().expect("encode"),
        "\"water_window\":4",
        "\"water_window\":1",
    );
    assert!(matches!(
        GridState::from_json(&json),
        Err(StateError::WaterHistoryTooLong {
            index: 1,
            len: 2,
            window: 1
        })
    ));
}

#[test]
fn unknown_guilds_are_rejected() {
    let json = rewrite(
        &populated_grid().to_json().expect("encode"),
        "\"fast_grass\":40",
        "\"tall_grass\":40",
    );
    assert!(matches!(
        GridState::from_json(&json),
        Err(StateError::UnknownGuild { index: 1, .. })
    ));
}

#[test]
fn entities_outside_the_grid_are_rejected() {
    let json = rewrite(
        &populated_grid().to_json().expect("encode"),
        "\"x\":2,\"y\":1",
        "\"x\":7,\"y\":1",
    );
    assert!(matches!(
        GridState::from_json(&json),
        Err(StateError::EntityOutOfBounds { id: 2, x: 7, .. })
    ));
}

#[test]
fn allocator_must_stay_ahead_of_live_ids() {
    let json = rewrite(
        &populated_grid().to_json().expect("encode"),
        "\"next_entity_id\":3",
        "\"next_entity_id\":2",
    );
    assert!(matches!(
        GridState::from_json(&json),
        Err(StateError::StaleAllocator { next: 2, live: 2 })
    ));
}

#[test]
fn queries_aggregate_the_whole_grid() {
    let mut grid = populated_grid();
    grid.cell_mut(CellCoord::new(0, 1))
        .expect("cell")
        .set_biomass(Guild::FastGrass, 5);
    grid.set_water(CellCoord::new(2, 1), 0.1).expect("water");

    assert_eq!(query::guild_total(&grid, Guild::FastGrass), 45);
    assert_eq!(query::total_biomass(&grid), 57);
    assert_eq!(query::species_count(&grid, Species::Rabbit), 1);
    assert_eq!(query::species_count(&grid, Species::Grazer), 0);

    let water = query::water_stats(&grid, 0.3);
    assert!((water.min - 0.1).abs() < 1e-9);
    assert!((water.max - 0.6).abs() < 1e-9);
    assert_eq!(water.low_cells, 1);

    let histogram = query::limiting_factor_histogram(&grid);
    assert_eq!(histogram.get(&GrowthFactor::Season), Some(&1));

    let dominant = query::dominant_guilds(&grid);
    assert_eq!(dominant[1], (CellCoord::new(1, 0), Some(Guild::FastGrass)));
    assert_eq!(dominant[0].1, None);
}
