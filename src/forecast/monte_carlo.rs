//! Outcome forecasting: many independently seeded battles of one matchup, aggregated.

use rayon::prelude::*;
use serde::Serialize;

use crate::combat::{simulate_battle, Army, BattleOutcome, Rng, Side, SimulationConfig, TraceMode};
use crate::error::BattleError;
use crate::parallel::batch_ranges;

/// Batches handed to each rayon thread; more batches smooth out uneven battle lengths.
const BATCHES_PER_THREAD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SideForecast {
    pub wins: usize,
    pub win_rate: f64,
    pub avg_survivors: f64,
    pub avg_kills: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub iterations: usize,
    pub base_seed: u64,
    pub attacker_name: String,
    pub defender_name: String,
    pub attacker: SideForecast,
    pub defender: SideForecast,
    pub draws: usize,
    pub draw_rate: f64,
    /// Battles decided by the turn cap, counted inside the nominal winner's wins as well.
    pub turn_limit_reached: usize,
    pub avg_turns: f64,
}

impl ForecastSummary {
    pub fn side(&self, side: Side) -> &SideForecast {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }
}

/// What one iteration contributes to the aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BattleSample {
    outcome: BattleOutcome,
    turns: u32,
    survivors: [f64; 2],
    kills: [f64; 2],
}

pub fn run_forecast(
    attacker: &Army,
    defender: &Army,
    config: SimulationConfig,
    iterations: usize,
    seed: u64,
) -> Result<ForecastSummary, BattleError> {
    run_forecast_with_parallelism(attacker, defender, config, iterations, seed, false)
}

/// Like [run_forecast] but spreads iterations across the current rayon pool. Results match
/// the sequential run exactly for the same seed.
pub fn run_forecast_parallel(
    attacker: &Army,
    defender: &Army,
    config: SimulationConfig,
    iterations: usize,
    seed: u64,
) -> Result<ForecastSummary, BattleError> {
    run_forecast_with_parallelism(attacker, defender, config, iterations, seed, true)
}

fn run_forecast_with_parallelism(
    attacker: &Army,
    defender: &Army,
    config: SimulationConfig,
    iterations: usize,
    seed: u64,
    parallel: bool,
) -> Result<ForecastSummary, BattleError> {
    let config = SimulationConfig {
        trace_mode: TraceMode::Off,
        ..config
    };
    let run_one = |iteration: usize| -> Result<BattleSample, BattleError> {
        let iteration_seed = seed.wrapping_add(iteration as u64);
        let result = simulate_battle(
            attacker.clone(),
            defender.clone(),
            config,
            Rng::new(iteration_seed),
        )?;
        let summary = |side: Side| {
            result
                .report
                .army(side)
                .map(|army| (army.survivors, army.total_kills))
                .unwrap_or_default()
        };
        let (attacker_survivors, attacker_kills) = summary(Side::Attacker);
        let (defender_survivors, defender_kills) = summary(Side::Defender);
        Ok(BattleSample {
            outcome: result.outcome,
            turns: result.turns,
            survivors: [attacker_survivors, defender_survivors],
            kills: [attacker_kills, defender_kills],
        })
    };

    let samples: Vec<BattleSample> = if parallel {
        let batches = batch_ranges(iterations, rayon::current_num_threads() * BATCHES_PER_THREAD);
        let chunks = batches
            .par_iter()
            .map(|&(start, end)| (start..end).map(&run_one).collect::<Result<Vec<_>, _>>())
            .collect::<Result<Vec<_>, _>>()?;
        chunks.into_iter().flatten().collect()
    } else {
        (0..iterations).map(&run_one).collect::<Result<_, _>>()?
    };

    let summary = aggregate(attacker, defender, &samples, seed);
    tracing::info!(
        iterations,
        seed,
        attacker_win_rate = summary.attacker.win_rate,
        defender_win_rate = summary.defender.win_rate,
        draw_rate = summary.draw_rate,
        avg_turns = summary.avg_turns,
        "forecast complete"
    );
    Ok(summary)
}

fn aggregate(
    attacker: &Army,
    defender: &Army,
    samples: &[BattleSample],
    seed: u64,
) -> ForecastSummary {
    let iterations = samples.len();
    let rate = |count: f64| {
        if iterations == 0 {
            0.0
        } else {
            count / iterations as f64
        }
    };

    let mut wins = [0usize; 2];
    let mut survivors = [0.0f64; 2];
    let mut kills = [0.0f64; 2];
    let mut draws = 0;
    let mut turn_limit_reached = 0;
    let mut turns = 0u64;
    for sample in samples {
        match sample.outcome.winner() {
            Some(side) => wins[side.index()] += 1,
            None => draws += 1,
        }
        if sample.outcome.by_turn_limit() {
            turn_limit_reached += 1;
        }
        turns += u64::from(sample.turns);
        for side in Side::BOTH {
            survivors[side.index()] += sample.survivors[side.index()];
            kills[side.index()] += sample.kills[side.index()];
        }
    }

    let forecast_for = |side: Side| SideForecast {
        wins: wins[side.index()],
        win_rate: rate(wins[side.index()] as f64),
        avg_survivors: rate(survivors[side.index()]),
        avg_kills: rate(kills[side.index()]),
    };

    ForecastSummary {
        iterations,
        base_seed: seed,
        attacker_name: attacker.name.clone(),
        defender_name: defender.name.clone(),
        attacker: forecast_for(Side::Attacker),
        defender: forecast_for(Side::Defender),
        draws,
        draw_rate: rate(draws as f64),
        turn_limit_reached,
        avg_turns: rate(turns as f64),
    }
}
