use patient_world_core::{Guild, SimulationConfig, Species};
use patient_world_grid::{query, Cell, GridState};
use patient_world_system_bootstrap::{Bootstrap, BootstrapConfig};
use patient_world_system_scheduler::{Forecast, ForecastError, TickScheduler};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn world(rabbits: u32, foxes: u32) -> GridState {
    Bootstrap::new(BootstrapConfig {
        width: 5,
        height: 5,
        rabbits,
        foxes,
        ..BootstrapConfig::default()
    })
    .generate(&mut ChaCha8Rng::seed_from_u64(2))
    .expect("generate")
}

#[test]
fn horizon_and_step_must_be_positive() {
    assert_eq!(Forecast::new(0, 1), Err(ForecastError::ZeroDays));
    assert_eq!(Forecast::new(5, 0), Err(ForecastError::ZeroStep));
    assert!(Forecast::new(1, 30).is_ok());
}

#[test]
fn samples_cover_start_steps_and_final_day() {
    let state = world(12, 2);
    let scheduler = TickScheduler::new(&SimulationConfig::default());
    let forecast = Forecast::new(10, 3).expect("forecast");

    let result = forecast
        .run(
            &scheduler,
            &state,
            &mut ChaCha8Rng::seed_from_u64(6),
            None::<&mut ChaCha8Rng>,
        )
        .expect("run");

    let days: Vec<u64> = result.samples.iter().map(|sample| sample.day).collect();
    assert_eq!(days, vec![0, 3, 6, 9, 10]);
    assert_eq!(result.samples[0].rabbits, 12);
    assert_eq!(result.summary.rabbits.start, 12);
    assert_eq!(result.summary.foxes.start, 2);
    assert_eq!(state.day(), 0, "forecasts run on a copy");
}

#[test]
fn forecast_matches_plain_ticks_without_noise() {
    let state = world(15, 3);
    let scheduler = TickScheduler::new(&SimulationConfig::default());

    let mut rng = ChaCha8Rng::seed_from_u64(31);
    let mut current = state.clone();
    for _ in 0..8 {
        current = scheduler.tick(&current, &mut rng).expect("tick");
    }

    let result = Forecast::new(8, 4)
        .expect("forecast")
        .run(
            &scheduler,
            &state,
            &mut ChaCha8Rng::seed_from_u64(31),
            None::<&mut ChaCha8Rng>,
        )
        .expect("run");

    let last = result.samples.last().expect("final sample");
    assert_eq!(last.day, 8);
    assert_eq!(last.rabbits, query::species_count(&current, Species::Rabbit) as u64);
    assert_eq!(last.foxes, query::species_count(&current, Species::Fox) as u64);
    assert_eq!(result.summary.rabbits.end, last.rabbits);
}

#[test]
fn absent_species_counts_as_extinct_every_day() {
    let state = world(10, 0);
    let scheduler = TickScheduler::new(&SimulationConfig::default());

    let result = Forecast::new(6, 2)
        .expect("forecast")
        .run(
            &scheduler,
            &state,
            &mut ChaCha8Rng::seed_from_u64(1),
            None::<&mut ChaCha8Rng>,
        )
        .expect("run");

    let foxes = result.summary.foxes;
    assert_eq!(foxes.start, 0);
    assert_eq!(foxes.max, 0);
    assert_eq!(foxes.extinct_days, 6);
    assert_eq!(foxes.first_extinction_day, Some(1));
}

#[test]
fn noisy_forecasts_replay_from_the_same_seeds() {
    let state = world(25, 5);
    let scheduler = TickScheduler::new(&SimulationConfig::default());
    let forecast = Forecast::new(12, 1).expect("forecast");
    let run = || {
        forecast
            .run(
                &scheduler,
                &state,
                &mut ChaCha8Rng::seed_from_u64(13),
                Some(&mut ChaCha8Rng::seed_from_u64(99)),
            )
            .expect("run")
    };

    let first = run();
    assert_eq!(first, run());
    assert_eq!(first.samples.len(), 13);
}

#[test]
fn grass_noise_never_exceeds_fast_grass_density() {
    let profile = Guild::FastGrass.profile();
    let mut state = GridState::from_cells(
        1,
        1,
        vec![Cell::new(profile.water_optimum, 1.0, 0.55)
            .with_biomass(Guild::FastGrass, profile.max_density)],
    )
    .expect("grid");
    state.set_day(60);
    let scheduler = TickScheduler::new(&SimulationConfig::default());
    let forecast = Forecast::new(3, 1).expect("forecast");

    for seed in 0..20 {
        let result = forecast
            .run(
                &scheduler,
                &state,
                &mut ChaCha8Rng::seed_from_u64(seed),
                Some(&mut ChaCha8Rng::seed_from_u64(seed)),
            )
            .expect("run");
        for sample in &result.samples {
            assert!(
                sample.grass <= u64::from(profile.max_density),
                "seed {seed}: {} fast grass on day {}",
                sample.grass,
                sample.day
            );
        }
    }
}

#[test]
fn result_serializes_for_reporting() {
    let state = world(4, 1);
    let scheduler = TickScheduler::new(&SimulationConfig::default());
    let result = Forecast::new(2, 1)
        .expect("forecast")
        .run(
            &scheduler,
            &state,
            &mut ChaCha8Rng::seed_from_u64(3),
            None::<&mut ChaCha8Rng>,
        )
        .expect("run");

    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(json["days"], 2);
    assert_eq!(json["samples"][0]["day"], 0);
    assert_eq!(json["summary"]["rabbits"]["start"], 4);
}
