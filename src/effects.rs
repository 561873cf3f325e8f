//! Interpreter for declarative skill effects.
//!
//! Anything that cannot be resolved against the catalogue (unknown skill,
//! status or stat) is logged and skipped; the rest of the cast carries on.

use crate::battler::{Battler, PendingStatus};
use crate::catalogue::Catalogue;
use crate::condition::{evaluate, ConditionContext};
use crate::damage::{compute_damage, skill_facts};
use crate::ledger::{clamp_range, StatusMeta};
use crate::logger::BattleLogger;
use crate::model::{
    ComponentKind, EffectKind, ElementId, Scope, Skill, SkillEffect, SkillId, Stat, StatusId,
    Trigger,
};
use crate::options::BattleOptions;
use crate::rng::BattleRng;
use crate::synergy::run_synergy;

/// Status ids the engine needs by role, resolved once per battle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusRoles {
    pub shield: Option<StatusId>,
    pub buffs: Vec<StatusId>,
}

impl StatusRoles {
    pub fn resolve(catalogue: &Catalogue, options: &BattleOptions) -> Self {
        let shield = catalogue.status_id_by_name(&options.shield_status);
        if shield.is_none() {
            tracing::warn!(name = %options.shield_status, "shield status not in catalogue");
        }
        let buffs = options
            .buff_statuses
            .iter()
            .filter_map(|name| catalogue.status_id_by_name(name))
            .collect();
        Self { shield, buffs }
    }

    pub fn is_buff(&self, id: StatusId) -> bool {
        self.buffs.contains(&id)
    }
}

/// Scratch state of the most recent skill use; overwritten by the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CastContext {
    pub skill_id: Option<SkillId>,
    pub element_id: Option<ElementId>,
    pub ally_target: bool,
    pub last_damage: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CastOutcome {
    pub hit: bool,
    pub total_damage: u32,
}

pub struct EffectEnv<'a, R: BattleRng> {
    pub catalogue: &'a Catalogue,
    pub options: &'a BattleOptions,
    pub roles: &'a StatusRoles,
    pub logger: &'a mut BattleLogger,
    pub rng: &'a mut R,
}

impl<'a, R: BattleRng> EffectEnv<'a, R> {
    /// Applies `status_id` with refresh semantics. Duration comes from the
    /// caller, else the status default, else the configured fallback.
    pub fn apply_status(
        &mut self,
        target: &mut Battler,
        status_id: StatusId,
        duration: Option<u32>,
        meta: StatusMeta,
    ) -> bool {
        let Some(status) = self.catalogue.status(status_id) else {
            tracing::warn!(status = status_id, "unknown status id");
            self.logger.log_unknown(&format!("status #{status_id}"));
            return false;
        };
        let turns = duration
            .or(status.default_duration)
            .unwrap_or(self.options.default_status_duration);
        target.apply_status(status_id, turns, meta);
        let turns_left = target
            .ledger()
            .status(status_id)
            .map(|instance| instance.turns_left)
            .unwrap_or(turns);
        self.logger
            .log_status(&target.name, status.display_name(), turns_left);
        true
    }

    pub fn remove_status(&mut self, target: &mut Battler, status_id: StatusId) -> bool {
        if !target.remove_status(status_id) {
            return false;
        }
        let name = self.catalogue.status_name(status_id);
        self.logger.log_status_removed(&target.name, &name);
        true
    }

    /// Removes up to `count` debuffs (anything that is not a buff).
    pub fn cleanse(&mut self, target: &mut Battler, count: u32) -> usize {
        let roles = self.roles;
        let removed = target.cleanse(count, |id| roles.is_buff(id));
        for id in &removed {
            let name = self.catalogue.status_name(*id);
            self.logger.log_status_removed(&target.name, &name);
        }
        removed.len()
    }
}

/// Resolves one skill use by `caster` against `opponent`: accuracy, cast
/// effects in sequence order, then on-hit effects and the synergy pass when
/// the cast dealt damage.
pub fn cast_skill<R: BattleRng>(
    env: &mut EffectEnv<'_, R>,
    skill_id: SkillId,
    caster: &mut Battler,
    opponent: &mut Battler,
    cast: &mut CastContext,
) -> CastOutcome {
    let catalogue = env.catalogue;
    let Some(skill) = catalogue.skill(skill_id) else {
        tracing::warn!(skill = skill_id, "unknown skill id");
        env.logger.log_unknown(&format!("skill #{skill_id}"));
        return CastOutcome::default();
    };
    let facts = skill_facts(Some(skill), caster);
    *cast = CastContext {
        skill_id: Some(skill_id),
        element_id: facts.element_id,
        ally_target: facts.ally_target,
        last_damage: 0,
    };
    env.logger.log_skill(&caster.name, &skill.name);

    let accuracy = caster
        .ledger()
        .accuracy_multiplier(catalogue, env.options.accuracy_multiplier_range);
    let hit_chance = clamp_range(
        skill.accuracy / 100.0 * caster.stats.accuracy * accuracy,
        env.options.hit_chance_range,
    );
    let hit = env.rng.chance(hit_chance);
    tracing::debug!(caster = %caster.name, skill = %skill.name, hit_chance, hit, "accuracy rolled");
    if !hit {
        env.logger.log_miss(&caster.name);
        return CastOutcome {
            hit: false,
            total_damage: 0,
        };
    }

    let mut total = 0u32;
    for effect in catalogue
        .skill_effects(skill_id)
        .iter()
        .filter(|effect| effect.trigger == Trigger::OnCast)
    {
        total = total.saturating_add(execute_effect(env, effect, Some(skill), caster, opponent));
    }
    cast.last_damage = total;

    if total > 0 {
        for effect in catalogue
            .skill_effects(skill_id)
            .iter()
            .filter(|effect| effect.trigger == Trigger::OnHit)
        {
            execute_effect(env, effect, Some(skill), caster, opponent);
        }
        run_synergy(env, caster, opponent, cast);
    }
    CastOutcome {
        hit: true,
        total_damage: total,
    }
}

/// Runs every passive effect of `owner` bound to `trigger`.
pub fn fire_passives<R: BattleRng>(
    env: &mut EffectEnv<'_, R>,
    trigger: Trigger,
    owner: &mut Battler,
    opponent: &mut Battler,
) {
    let catalogue = env.catalogue;
    let passives = owner.passive_skills.clone();
    for skill_id in passives {
        let skill = catalogue.skill(skill_id);
        for effect in catalogue
            .skill_effects(skill_id)
            .iter()
            .filter(|effect| effect.trigger == trigger)
        {
            execute_effect(env, effect, skill, owner, opponent);
        }
    }
}

/// Damage-over-time and regeneration from the statuses on `battler`.
pub fn status_ticks<R: BattleRng>(env: &mut EffectEnv<'_, R>, battler: &mut Battler) {
    let ticks: Vec<(StatusId, ComponentKind, f64)> = battler
        .ledger()
        .components(env.catalogue)
        .filter(|c| {
            matches!(
                c.kind,
                ComponentKind::DotMaxhpRatio | ComponentKind::RegenMaxhpRatio
            )
        })
        .map(|c| (c.status_id, c.kind, c.value))
        .collect();
    for (status_id, kind, ratio) in ticks {
        let amount = ratio_of(battler.stats.max_hp, ratio);
        match kind {
            ComponentKind::DotMaxhpRatio => {
                if battler.is_fainted() {
                    continue;
                }
                let amount = amount.max(1);
                let report = battler.apply_damage(amount, None);
                let name = env.catalogue.status_name(status_id);
                env.logger
                    .push(format!("{} is hurt by {}!", battler.name, name));
                env.logger.log_damage(
                    &battler.name,
                    report.hp_lost,
                    battler.hp(),
                    battler.stats.max_hp,
                );
            }
            ComponentKind::RegenMaxhpRatio => {
                let healed = battler.heal(amount);
                if healed > 0 {
                    env.logger
                        .log_heal(&battler.name, healed, battler.hp(), battler.stats.max_hp);
                }
            }
            _ => {}
        }
    }
}

/// Executes one effect. Returns the damage it dealt to the opponent.
pub fn execute_effect<R: BattleRng>(
    env: &mut EffectEnv<'_, R>,
    effect: &SkillEffect,
    skill: Option<&Skill>,
    caster: &mut Battler,
    opponent: &mut Battler,
) -> u32 {
    let on_enemy = effect.target == Scope::Enemy;
    {
        let target: &Battler = if on_enemy { &*opponent } else { &*caster };
        let ctx = ConditionContext {
            attacker: &*caster,
            defender: &*opponent,
            target,
            skill: Some(skill_facts(skill, caster)),
        };
        if !evaluate(effect.condition.as_ref(), &ctx, env.catalogue) {
            tracing::debug!(effect = effect.id, "effect condition not met");
            return 0;
        }
    }

    match effect.effect_type {
        EffectKind::Damage => damage_effect(env, effect, skill, caster, opponent),
        EffectKind::ApplyStatus => {
            let Some(status_id) = effect.status_id else {
                env.logger.log_unknown("status");
                return 0;
            };
            if !env.rng.chance(effect.chance.unwrap_or(1.0)) {
                tracing::debug!(status = status_id, "status chance failed");
                return 0;
            }
            let target = if on_enemy { opponent } else { caster };
            env.apply_status(target, status_id, effect.duration, StatusMeta::default());
            0
        }
        EffectKind::StatMod => {
            let stat = match effect.stat {
                Some(stat) if stat != Stat::Unknown => stat,
                _ => {
                    env.logger.log_unknown("stat");
                    return 0;
                }
            };
            if !env.rng.chance(effect.chance.unwrap_or(1.0)) {
                return 0;
            }
            let delta = effect.value.unwrap_or(0.0);
            let turns = effect
                .duration
                .unwrap_or(env.options.default_status_duration);
            let target = if on_enemy { opponent } else { caster };
            target.push_modifier(stat, delta, turns);
            env.logger
                .log_stat_change(&target.name, stat_label(stat), delta, turns);
            0
        }
        EffectKind::ShieldMaxhpRatio => {
            let Some(shield_id) = env.roles.shield else {
                env.logger.log_unknown("shield");
                return 0;
            };
            let amount = ratio_of(caster.stats.max_hp, effect.value.unwrap_or(0.0));
            let target = if on_enemy { opponent } else { caster };
            env.apply_status(target, shield_id, effect.duration, StatusMeta::shield(amount));
            0
        }
        EffectKind::HealMaxhpRatio => {
            let target = if on_enemy { opponent } else { caster };
            let amount = ratio_of(target.stats.max_hp, effect.value.unwrap_or(0.0));
            let healed = target.heal(amount);
            env.logger
                .log_heal(&target.name, healed, target.hp(), target.stats.max_hp);
            0
        }
        EffectKind::CleanseDebuff => {
            let count = effect
                .count
                .or_else(|| effect.value.map(|v| v.max(0.0) as u32))
                .unwrap_or(1);
            let target = if on_enemy { opponent } else { caster };
            env.cleanse(target, count);
            0
        }
        EffectKind::NextHitApplyStatus => {
            let Some(status_id) = effect.status_id else {
                env.logger.log_unknown("status");
                return 0;
            };
            caster.pending_status = Some(PendingStatus {
                status_id,
                chance: effect.chance.unwrap_or(1.0),
                duration: effect.duration,
            });
            let name = env.catalogue.status_name(status_id);
            env.logger
                .push(format!("{}'s next hit will inflict {}.", caster.name, name));
            0
        }
        EffectKind::LifestealRatio | EffectKind::DamageMult | EffectKind::DamageTakenMult => {
            tracing::debug!(effect = effect.id, kind = ?effect.effect_type, "passive-only effect");
            0
        }
        EffectKind::Unsupported => {
            tracing::warn!(effect = effect.id, "unsupported effect kind");
            env.logger.log_unknown("effect");
            0
        }
    }
}

fn damage_effect<R: BattleRng>(
    env: &mut EffectEnv<'_, R>,
    effect: &SkillEffect,
    skill: Option<&Skill>,
    caster: &mut Battler,
    opponent: &mut Battler,
) -> u32 {
    let on_enemy = effect.target == Scope::Enemy;
    let roll = {
        let defender: &Battler = if on_enemy { &*opponent } else { &*caster };
        compute_damage(
            &*caster,
            defender,
            skill,
            effect.value,
            env.catalogue,
            env.options,
            &mut *env.rng,
        )
    };
    if roll.critical {
        env.logger.log_critical();
    }
    env.logger.log_effectiveness(roll.matchup);

    let shield = env.roles.shield;
    let target = if on_enemy { &mut *opponent } else { &mut *caster };
    let report = target.apply_damage(roll.amount, shield);
    if report.absorbed > 0 {
        env.logger.log_shield_absorb(&target.name, report.absorbed);
    }
    if report.shield_broken {
        env.logger.log_shield_broken(&target.name);
    }
    env.logger
        .log_damage(&target.name, report.hp_lost, target.hp(), target.stats.max_hp);
    if !on_enemy {
        return 0;
    }

    let ratio = lifesteal_ratio(caster, env.catalogue);
    if ratio > 0.0 && report.hp_lost > 0 {
        let healed = caster.heal(ratio_of(report.hp_lost, ratio));
        if healed > 0 {
            env.logger
                .log_heal(&caster.name, healed, caster.hp(), caster.stats.max_hp);
        }
    }

    if report.amount > 0 {
        if let Some(pending) = caster.pending_status.take() {
            if env.rng.chance(pending.chance) {
                env.apply_status(
                    opponent,
                    pending.status_id,
                    pending.duration,
                    StatusMeta::default(),
                );
            }
        }
    }
    report.amount
}

/// Sum of lifesteal ratios across the owner's passive skills.
pub fn lifesteal_ratio(owner: &Battler, catalogue: &Catalogue) -> f64 {
    owner
        .passive_skills
        .iter()
        .flat_map(|id| catalogue.skill_effects(*id).iter())
        .filter(|effect| effect.effect_type == EffectKind::LifestealRatio)
        .map(|effect| effect.value.unwrap_or(0.0))
        .sum()
}

fn ratio_of(total: u32, ratio: f64) -> u32 {
    (total as f64 * ratio).floor().max(0.0) as u32
}

fn stat_label(stat: Stat) -> &'static str {
    match stat {
        Stat::Hp => "HP",
        Stat::Atk => "attack",
        Stat::Def => "defense",
        Stat::Spd => "speed",
        Stat::Acc => "accuracy",
        Stat::Unknown => "stat",
    }
}
