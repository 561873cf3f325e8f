//! Turn state machine: one player action, the automatic counter, end of turn.

use crate::ai::{BattleAI, RandomAI};
use crate::battler::{Battler, BattlerView, Side};
use crate::capture::attempt_capture;
use crate::catalogue::Catalogue;
use crate::effects::{cast_skill, fire_passives, status_ticks, CastContext, EffectEnv, StatusRoles};
use crate::logger::BattleLogger;
use crate::model::{BattleMode, Encounter, FormId, ItemKind, MonsterRecord, Reward, SkillId, Trigger};
use crate::options::BattleOptions;
use crate::rng::BattleRng;
use anyhow::Context;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Skill(SkillId),
    Item(String),
    Run,
    /// Throws the ball item with the given code.
    Capture(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BattlePhase {
    AwaitingAction,
    Resolving,
    EnemyCounter,
    EndTurn,
    PlayerWin,
    EnemyWin,
    Escaped,
    Captured,
}

impl BattlePhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BattlePhase::PlayerWin | BattlePhase::EnemyWin | BattlePhase::Escaped | BattlePhase::Captured
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Winner {
    Player,
    Enemy,
    Escape,
    Capture,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BattleResult {
    pub winner: Winner,
    pub captured_form_id: Option<FormId>,
    pub reward: Option<Reward>,
}

/// What one submitted action produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnOutcome {
    /// Log lines appended while resolving the action.
    pub events: Vec<String>,
    /// False when the action was rejected and the same turn awaits another action.
    pub turn_consumed: bool,
    pub phase: BattlePhase,
    pub result: Option<BattleResult>,
}

/// Encounter-level settings that are not part of either roster.
#[derive(Clone, Debug, Default)]
pub struct BattleSetup {
    pub mode: BattleMode,
    pub allow_capture: bool,
    pub reward: Option<Reward>,
}

enum Resolution {
    /// The turn continues to the enemy counter.
    Continue,
    /// The battle ended during the action.
    Ended,
}

pub struct Battle<R: BattleRng = SmallRng> {
    catalogue: Arc<Catalogue>,
    options: BattleOptions,
    roles: StatusRoles,
    setup: BattleSetup,
    player: Battler,
    player_reserve: Vec<Battler>,
    enemy: Battler,
    phase: BattlePhase,
    turn: u32,
    cast: CastContext,
    result: Option<BattleResult>,
    logger: BattleLogger,
    rng: R,
    ai: RandomAI,
}

impl Battle<SmallRng> {
    pub fn seeded(
        catalogue: Arc<Catalogue>,
        options: BattleOptions,
        encounter: &Encounter,
        seed: u64,
    ) -> anyhow::Result<Self> {
        Self::init(catalogue, options, encounter, SmallRng::seed_from_u64(seed))
    }
}

impl<R: BattleRng> Battle<R> {
    /// Materializes both rosters from their records and starts the battle.
    pub fn init(
        catalogue: Arc<Catalogue>,
        options: BattleOptions,
        encounter: &Encounter,
        rng: R,
    ) -> anyhow::Result<Self> {
        let player = materialize(Side::Player, &encounter.player, &catalogue)?;
        let enemy = materialize(Side::Enemy, &encounter.enemy, &catalogue)?;
        let setup = BattleSetup {
            mode: encounter.mode,
            allow_capture: encounter.allow_capture,
            reward: encounter.reward.clone(),
        };
        Self::new(catalogue, options, setup, player, enemy, rng)
    }

    /// Starts a battle between already materialized rosters; the first entry
    /// of each roster is the active combatant.
    pub fn new(
        catalogue: Arc<Catalogue>,
        options: BattleOptions,
        setup: BattleSetup,
        player_roster: Vec<Battler>,
        enemy_roster: Vec<Battler>,
        rng: R,
    ) -> anyhow::Result<Self> {
        options.validate()?;
        let (player, player_reserve) = split_roster(player_roster).context("Player roster is empty")?;
        // Enemy reserves never enter play and are not written back.
        let (enemy, _) = split_roster(enemy_roster).context("Enemy roster is empty")?;
        let roles = StatusRoles::resolve(&catalogue, &options);
        let mut battle = Self {
            catalogue,
            options,
            roles,
            setup,
            player,
            player_reserve,
            enemy,
            phase: BattlePhase::AwaitingAction,
            turn: 1,
            cast: CastContext::default(),
            result: None,
            logger: BattleLogger::new(),
            rng,
            ai: RandomAI,
        };
        battle.start();
        Ok(battle)
    }

    fn start(&mut self) {
        self.player.battle_count += 1;
        self.enemy.battle_count += 1;
        tracing::debug!(
            player = %self.player.name,
            enemy = %self.enemy.name,
            mode = ?self.setup.mode,
            "battle started"
        );
        let (player, enemy) = (self.player.name.clone(), self.enemy.name.clone());
        self.logger.log_battle_start(&player, &enemy);
        self.fire_both(Trigger::BattleStart);
        self.check_faint();
    }

    pub fn submit_player_action(&mut self, action: Action) -> TurnOutcome {
        let start = self.logger.len();
        if self.is_finished() {
            self.logger.push("The battle is already over.");
            return self.outcome(start, false);
        }
        if let Some(reason) = self.rejection(&action) {
            tracing::debug!(?action, reason, "action rejected");
            self.logger.push(reason);
            return self.outcome(start, false);
        }

        self.phase = BattlePhase::Resolving;
        self.logger.log_turn(self.turn);
        self.fire_both(Trigger::TurnStart);
        if self.check_faint() {
            return self.outcome(start, true);
        }

        match self.resolve_player(action) {
            Resolution::Ended => return self.outcome(start, true),
            Resolution::Continue => {}
        }
        if self.check_faint() {
            return self.outcome(start, true);
        }

        self.phase = BattlePhase::EnemyCounter;
        self.enemy_counter();
        if self.check_faint() {
            return self.outcome(start, true);
        }

        self.phase = BattlePhase::EndTurn;
        self.end_turn();
        if !self.check_faint() {
            self.turn += 1;
            self.phase = BattlePhase::AwaitingAction;
        }
        self.outcome(start, true)
    }

    /// Picks a uniform-random skill for the player from the battle RNG.
    pub fn auto_action(&mut self) -> Option<Action> {
        let mut ai = self.ai;
        ai.choose_skill(&self.player, &self.enemy, &mut self.rng)
            .map(Action::Skill)
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&BattleResult> {
        self.result.as_ref()
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// Current turn number, starting at 1.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn mode(&self) -> BattleMode {
        self.setup.mode
    }

    pub fn battler(&self, side: Side) -> &Battler {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    pub fn battler_mut(&mut self, side: Side) -> &mut Battler {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    pub fn active_view(&self, side: Side) -> BattlerView {
        self.battler(side).view(&self.catalogue)
    }

    pub fn cast_context(&self) -> &CastContext {
        &self.cast
    }

    pub fn log(&self) -> &[String] {
        self.logger.log_lines()
    }

    pub fn logger(&self) -> &BattleLogger {
        &self.logger
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Copies HP and battle count back onto the player's records, in roster order.
    pub fn write_back(&self, records: &mut [MonsterRecord]) {
        let roster = std::iter::once(&self.player).chain(self.player_reserve.iter());
        for (record, battler) in records.iter_mut().zip(roster) {
            record.current_hp = Some(battler.hp());
            record.battle_count = battler.battle_count;
        }
    }

    fn rejection(&self, action: &Action) -> Option<&'static str> {
        let wild = self.setup.mode == BattleMode::Wild;
        match action {
            Action::Run if !wild => Some("You can't run from a trainer battle!"),
            Action::Capture(_) if !wild || !self.setup.allow_capture => {
                Some("You can't capture this monster!")
            }
            Action::Item(code) => match self.catalogue.item(code) {
                Some(item) if item.kind == ItemKind::Ball => {
                    Some("That item can only be thrown to capture.")
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn resolve_player(&mut self, action: Action) -> Resolution {
        match action {
            Action::Skill(skill_id) => {
                self.use_skill(Side::Player, Some(skill_id));
                Resolution::Continue
            }
            Action::Item(code) => {
                self.use_item(&code);
                Resolution::Continue
            }
            Action::Run => {
                let chance = self.options.run_base_chance;
                if self.rng.chance(chance) {
                    self.logger.push("Got away safely!");
                    self.finish(Winner::Escape);
                    Resolution::Ended
                } else {
                    self.logger.push("Couldn't get away!");
                    Resolution::Continue
                }
            }
            Action::Capture(ball) => self.throw_ball(&ball),
        }
    }

    fn throw_ball(&mut self, code: &str) -> Resolution {
        let modifier = match self.catalogue.item(code) {
            Some(item) if item.kind == ItemKind::Ball => {
                self.logger.push(format!("You threw a {}!", item.display_name()));
                item.capture_modifier
            }
            _ => {
                tracing::warn!(ball = code, "unknown ball, using plain modifier");
                self.logger.log_unknown(&format!("ball {code}"));
                1.0
            }
        };
        let roll = attempt_capture(
            &self.enemy,
            &self.catalogue,
            &self.options,
            modifier,
            &mut self.rng,
        );
        if roll.captured {
            let line = format!("Gotcha! {} was caught!", self.enemy.name);
            self.logger.push(line);
            self.finish(Winner::Capture);
            Resolution::Ended
        } else {
            let line = format!("Oh no! {} broke free!", self.enemy.name);
            self.logger.push(line);
            Resolution::Continue
        }
    }

    fn use_item(&mut self, code: &str) {
        let Some(item) = self.catalogue.item(code).cloned() else {
            tracing::warn!(item = code, "unknown item code");
            self.logger.log_unknown(&format!("item {code}"));
            return;
        };
        self.logger.push(format!("You used {}!", item.display_name()));
        self.with_env(|env, player, _enemy, _cast| match item.kind {
            ItemKind::Heal => {
                let healed = player.heal(item.value.max(0.0) as u32);
                env.logger
                    .log_heal(&player.name, healed, player.hp(), player.stats.max_hp);
            }
            ItemKind::HealRatio => {
                let amount = (player.stats.max_hp as f64 * item.value).floor().max(0.0) as u32;
                let healed = player.heal(amount);
                env.logger
                    .log_heal(&player.name, healed, player.hp(), player.stats.max_hp);
            }
            ItemKind::Cleanse => {
                let count = (item.value.max(1.0)) as u32;
                env.cleanse(player, count);
            }
            ItemKind::Ball | ItemKind::Other => {
                env.logger.log_unknown(&item.code);
            }
        });
    }

    /// Resolves one skill use by `side`, or the AI's pick when `skill_id` is None.
    fn use_skill(&mut self, side: Side, skill_id: Option<SkillId>) {
        let mut ai = self.ai;
        self.with_env(|env, player, enemy, cast| {
            let (actor, target) = match side {
                Side::Player => (player, enemy),
                Side::Enemy => (enemy, player),
            };
            if !can_act(env, actor) {
                return;
            }
            let chosen = skill_id.or_else(|| ai.choose_skill(actor, target, &mut *env.rng));
            match chosen {
                Some(id) => {
                    cast_skill(env, id, actor, target, cast);
                }
                None => env.logger.push(format!("{} has no moves to use.", actor.name)),
            }
        });
    }

    fn enemy_counter(&mut self) {
        self.use_skill(Side::Enemy, None);
    }

    fn end_turn(&mut self) {
        for side in [Side::Player, Side::Enemy] {
            self.with_env(|env, player, enemy, _cast| {
                let (owner, opponent) = match side {
                    Side::Player => (player, enemy),
                    Side::Enemy => (enemy, player),
                };
                fire_passives(env, Trigger::TurnEnd, owner, opponent);
                status_ticks(env, owner);
            });
        }
        for side in [Side::Player, Side::Enemy] {
            let expired = self.battler_mut(side).tick();
            for id in expired {
                let name = self.catalogue.status_name(id);
                let owner = self.battler(side).name.clone();
                self.logger.push(format!("{owner}'s {name} wore off."));
            }
        }
    }

    fn fire_both(&mut self, trigger: Trigger) {
        self.with_env(|env, player, enemy, _cast| {
            fire_passives(env, trigger, player, enemy);
            fire_passives(env, trigger, enemy, player);
        });
    }

    /// Enemy faint is checked first, so a double faint is a player win.
    fn check_faint(&mut self) -> bool {
        if self.is_finished() {
            return true;
        }
        let enemy_down = self.enemy.is_fainted();
        let player_down = self.player.is_fainted();
        if enemy_down {
            let name = self.enemy.name.clone();
            self.logger.log_faint(&name);
        }
        if player_down {
            let name = self.player.name.clone();
            self.logger.log_faint(&name);
        }
        if enemy_down {
            self.finish(Winner::Player);
        } else if player_down {
            self.finish(Winner::Enemy);
        }
        self.is_finished()
    }

    fn finish(&mut self, winner: Winner) {
        let rewarded = matches!(winner, Winner::Player | Winner::Capture);
        self.result = Some(BattleResult {
            winner,
            captured_form_id: (winner == Winner::Capture).then_some(self.enemy.form_id),
            reward: if rewarded { self.setup.reward.clone() } else { None },
        });
        self.phase = match winner {
            Winner::Player => BattlePhase::PlayerWin,
            Winner::Enemy => BattlePhase::EnemyWin,
            Winner::Escape => BattlePhase::Escaped,
            Winner::Capture => BattlePhase::Captured,
        };
        tracing::debug!(?winner, turn = self.turn, "battle finished");
    }

    fn outcome(&self, start: usize, turn_consumed: bool) -> TurnOutcome {
        TurnOutcome {
            events: self.logger.log_lines()[start..].to_vec(),
            turn_consumed,
            phase: self.phase,
            result: self.result.clone(),
        }
    }

    fn with_env<T>(
        &mut self,
        f: impl FnOnce(&mut EffectEnv<'_, R>, &mut Battler, &mut Battler, &mut CastContext) -> T,
    ) -> T {
        let mut env = EffectEnv {
            catalogue: &*self.catalogue,
            options: &self.options,
            roles: &self.roles,
            logger: &mut self.logger,
            rng: &mut self.rng,
        };
        f(&mut env, &mut self.player, &mut self.enemy, &mut self.cast)
    }
}

/// Rolls the skip-turn chance from statuses; draws only when it is positive.
fn can_act<R: BattleRng>(env: &mut EffectEnv<'_, R>, actor: &Battler) -> bool {
    let skip = actor.ledger().skip_chance(env.catalogue);
    if skip > 0.0 && env.rng.chance(skip) {
        env.logger.log_skip(&actor.name);
        return false;
    }
    true
}

fn materialize(
    side: Side,
    records: &[MonsterRecord],
    catalogue: &Catalogue,
) -> anyhow::Result<Vec<Battler>> {
    records
        .iter()
        .enumerate()
        .map(|(slot, record)| {
            Battler::from_record(side, record, catalogue)
                .with_context(|| format!("Failed to build {side:?} roster slot {slot}"))
        })
        .collect()
}

fn split_roster(roster: Vec<Battler>) -> Option<(Battler, Vec<Battler>)> {
    let mut roster = roster.into_iter();
    let active = roster.next()?;
    Some((active, roster.collect()))
}
