pub mod ai;
pub mod battle;
pub mod battler;
pub mod capture;
pub mod catalogue;
pub mod condition;
pub mod damage;
pub mod effects;
pub mod ledger;
pub mod logger;
pub mod model;
pub mod options;
pub mod rng;
pub mod simulate;
pub mod synergy;

pub use crate::battle::{Action, Battle, BattlePhase, BattleResult, BattleSetup, TurnOutcome, Winner};
pub use crate::battler::{Battler, BattlerView, Side};
pub use crate::catalogue::Catalogue;
pub use crate::logger::BattleLogger;
pub use crate::model::{Encounter, MonsterRecord};
pub use crate::options::BattleOptions;
pub use crate::rng::{BattleRng, ScriptedRng};

use crate::simulate::{first_battle_seed, run_battle, simulate};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CliOptions {
    /// Directory of table files, or a single bundle file.
    pub catalogue_path: PathBuf,
    pub encounter_path: PathBuf,
    pub options_path: Option<PathBuf>,
    pub sims: usize,
    pub seed: u64,
    pub max_turns: u32,
    pub show_log: bool,
}

pub fn load_catalogue(path: &Path) -> anyhow::Result<Catalogue> {
    if path.is_dir() {
        Catalogue::load_dir(path)
    } else {
        Catalogue::load_bundle(path)
    }
}

pub fn load_encounter(path: &Path) -> anyhow::Result<Encounter> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read encounter file at {}", path.display()))?;
    let parsed: Encounter = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    if parsed.player.is_empty() || parsed.enemy.is_empty() {
        anyhow::bail!("Encounter needs at least one monster on each side");
    }
    Ok(parsed)
}

pub fn run(opts: CliOptions) -> anyhow::Result<()> {
    if opts.sims == 0 {
        anyhow::bail!("--sims must be > 0");
    }
    if opts.max_turns == 0 {
        anyhow::bail!("--max-turns must be > 0");
    }
    let catalogue = Arc::new(load_catalogue(&opts.catalogue_path)?);
    let encounter = load_encounter(&opts.encounter_path)?;
    let options = match &opts.options_path {
        Some(path) => BattleOptions::load(path)?,
        None => BattleOptions::default(),
    };

    if opts.show_log {
        let first = run_battle(
            Arc::clone(&catalogue),
            &encounter,
            &options,
            first_battle_seed(opts.seed),
            opts.max_turns,
        )?;
        for line in &first.log {
            println!("{line}");
        }
        println!();
    }

    let summary = simulate(
        catalogue,
        &encounter,
        &options,
        opts.sims,
        opts.seed,
        opts.max_turns,
    )?;
    println!(
        "{} battles: player {} / enemy {} / escaped {} / captured {} / unfinished {}",
        summary.battles,
        summary.player_wins,
        summary.enemy_wins,
        summary.escapes,
        summary.captures,
        summary.unfinished
    );
    println!(
        "Player win rate {:.4}, average turns {:.2}",
        summary.player_win_rate(),
        summary.average_turns
    );
    Ok(())
}
