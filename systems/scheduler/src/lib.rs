#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Orchestration of one simulated day and of multi-day runs.
//!
//! [`TickScheduler::tick`] never mutates its input: it clones the state once,
//! runs growth, fauna, diffusion and the death sweep on the clone, and
//! returns it. Given the same input and the same random stream the output is
//! identical.

mod forecast;

use patient_world_core::{SimulationConfig, WaterTuning};
use patient_world_grid::{query, GridError, GridState};
use patient_world_system_diffusion::Diffusion;
use patient_world_system_fauna::{death_sweep, Fauna};
use patient_world_system_growth::Growth;
use patient_world_system_telemetry::{summarize, CapacityTracker, DEFAULT_TOP_CELLS};
use rand::Rng;
use tracing::{debug, info};

pub use forecast::{
    Forecast, ForecastError, ForecastMetrics, ForecastResult, ForecastSample, MetricSummary,
    EXTINCTION_THRESHOLD,
};

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Day on which the tick ran; the returned state is one day later.
    pub day: u64,
    /// Offspring spawned by the fauna passes.
    pub births: usize,
    /// Prey taken by predators.
    pub kills: usize,
    /// Entities that moved to a neighbouring cell.
    pub moves: usize,
    /// Entities removed by the death sweep.
    pub deaths: usize,
    /// Layers clamped to their capacity.
    pub capacity_events: usize,
}

/// Runs the per-day pipeline in its fixed order.
#[derive(Clone, Debug, Default)]
pub struct TickScheduler {
    growth: Growth,
    fauna: Fauna,
    diffusion: Diffusion,
    water: WaterTuning,
}

impl TickScheduler {
    /// Creates a scheduler whose systems follow `config`.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            growth: Growth::new(config.growth.clone()),
            fauna: Fauna::new(config.fauna.clone()),
            diffusion: Diffusion::new(config.diffusion.clone()),
            water: config.water.clone(),
        }
    }

    /// Advances `state` by one day and returns the new state.
    pub fn tick(&self, state: &GridState, rng: &mut impl Rng) -> Result<GridState, GridError> {
        self.tick_with_report(state, rng).map(|(next, _)| next)
    }

    /// Advances `state` by one day, also reporting what changed.
    pub fn tick_with_report(
        &self,
        state: &GridState,
        rng: &mut impl Rng,
    ) -> Result<(GridState, TickReport), GridError> {
        let mut next = state.clone();
        let day = next.day();
        next.clear_capacity_events();

        self.growth.apply(&mut next, rng);
        let fauna = self.fauna.apply(&mut next, rng)?;
        let moves = self.diffusion.apply(&mut next, rng)?;
        let deaths = death_sweep(&mut next)?.len();
        next.advance_day();

        let report = TickReport {
            day,
            births: fauna.births,
            kills: fauna.kills,
            moves,
            deaths,
            capacity_events: next.capacity_events().len(),
        };
        debug!(
            day,
            births = report.births,
            kills = report.kills,
            moves = report.moves,
            deaths = report.deaths,
            "tick complete"
        );
        log_capacity(&next, day);
        Ok((next, report))
    }

    /// Runs `days` ticks, feeding every tick's capacity events into `tracker`.
    pub fn run(
        &self,
        state: &GridState,
        days: u64,
        rng: &mut impl Rng,
        tracker: &mut CapacityTracker,
    ) -> Result<GridState, GridError> {
        let mut current = state.clone();
        for _ in 0..days {
            current = self.tick(&current, rng)?;
            tracker.ingest(current.capacity_events());
        }
        Ok(current)
    }

    /// Water statistics using the configured low-water threshold.
    #[must_use]
    pub fn water_stats(&self, state: &GridState) -> query::WaterStats {
        query::water_stats(state, self.water.low_water_threshold)
    }
}

fn log_capacity(state: &GridState, day: u64) {
    let Some(summary) = summarize(state.capacity_events(), DEFAULT_TOP_CELLS) else {
        return;
    };
    let hotspots = summary
        .top_cells
        .iter()
        .map(|hotspot| format!("({},{})", hotspot.cell.x(), hotspot.cell.y()))
        .collect::<Vec<_>>()
        .join(", ");
    info!(
        day,
        limited = summary.total_events,
        %hotspots,
        "capacity limited layers"
    );
}
