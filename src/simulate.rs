use crate::battle::{Battle, BattleResult, Winner};
use crate::catalogue::Catalogue;
use crate::model::Encounter;
use crate::options::BattleOptions;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

/// One auto-played battle.
#[derive(Clone, Debug, Serialize)]
pub struct BattleRun {
    pub seed: u64,
    pub turns: u32,
    pub result: Option<BattleResult>,
    pub log: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub battles: usize,
    pub player_wins: usize,
    pub enemy_wins: usize,
    pub escapes: usize,
    pub captures: usize,
    /// Battles that hit the turn cap, or where the player had nothing to use.
    pub unfinished: usize,
    pub average_turns: f64,
}

impl SimulationSummary {
    pub fn player_win_rate(&self) -> f64 {
        if self.battles == 0 {
            return 0.0;
        }
        self.player_wins as f64 / self.battles as f64
    }

    fn record(&mut self, run: &BattleRun) {
        self.battles += 1;
        match run.result.as_ref().map(|result| result.winner) {
            Some(Winner::Player) => self.player_wins += 1,
            Some(Winner::Enemy) => self.enemy_wins += 1,
            Some(Winner::Escape) => self.escapes += 1,
            Some(Winner::Capture) => self.captures += 1,
            None => self.unfinished += 1,
        }
    }
}

/// Plays one battle with both sides picking uniform-random skills.
pub fn run_battle(
    catalogue: Arc<Catalogue>,
    encounter: &Encounter,
    options: &BattleOptions,
    seed: u64,
    max_turns: u32,
) -> anyhow::Result<BattleRun> {
    let mut battle = Battle::seeded(catalogue, options.clone(), encounter, seed)?;
    while !battle.is_finished() && battle.turn() <= max_turns {
        let Some(action) = battle.auto_action() else {
            tracing::debug!(seed, "player has no active skills, stopping");
            break;
        };
        battle.submit_player_action(action);
    }
    Ok(BattleRun {
        seed,
        turns: battle.turn(),
        result: battle.result().cloned(),
        log: battle.log().to_vec(),
    })
}

/// Runs `sims` independent battles in parallel. Per-battle seeds come from
/// one master RNG, so the summary depends only on `seed`.
pub fn simulate(
    catalogue: Arc<Catalogue>,
    encounter: &Encounter,
    options: &BattleOptions,
    sims: usize,
    seed: u64,
    max_turns: u32,
) -> anyhow::Result<SimulationSummary> {
    if sims == 0 {
        anyhow::bail!("sims must be > 0");
    }
    let mut master = SmallRng::seed_from_u64(seed);
    let seeds: Vec<u64> = (0..sims).map(|_| master.gen()).collect();
    let runs: Vec<BattleRun> = seeds
        .par_iter()
        .map(|battle_seed| {
            run_battle(
                Arc::clone(&catalogue),
                encounter,
                options,
                *battle_seed,
                max_turns,
            )
        })
        .collect::<anyhow::Result<_>>()?;

    let mut summary = SimulationSummary::default();
    let mut total_turns = 0u64;
    for run in &runs {
        summary.record(run);
        total_turns += u64::from(run.turns);
    }
    summary.average_turns = total_turns as f64 / runs.len() as f64;
    tracing::info!(
        battles = summary.battles,
        player_wins = summary.player_wins,
        enemy_wins = summary.enemy_wins,
        "simulation finished"
    );
    Ok(summary)
}

/// Seed of the first battle `simulate` would run for `seed`.
pub fn first_battle_seed(seed: u64) -> u64 {
    SmallRng::seed_from_u64(seed).gen()
}
