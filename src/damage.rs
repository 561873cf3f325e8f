use crate::battler::Battler;
use crate::catalogue::Catalogue;
use crate::condition::{evaluate, ConditionContext, SkillFacts};
use crate::model::{ComponentKind, EffectKind, Skill, Stat, Trigger};
use crate::options::BattleOptions;
use crate::rng::BattleRng;

/// Every factor that went into one damage number, kept for logging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageRoll {
    pub base: f64,
    pub matchup: f64,
    pub attacker_multiplier: f64,
    pub defender_multiplier: f64,
    pub random_factor: f64,
    pub critical: bool,
    pub amount: u32,
}

pub fn base_damage(power: f64, atk: f64, def: f64) -> f64 {
    (power * (atk / 100.0) + power * 0.8 - def * 0.35).max(1.0)
}

pub fn skill_facts(skill: Option<&Skill>, attacker: &Battler) -> SkillFacts {
    match skill {
        Some(skill) => SkillFacts {
            element_id: skill.element_id.or(attacker.element_id),
            ally_target: skill.is_ally_target(),
        },
        None => SkillFacts {
            element_id: attacker.element_id,
            ally_target: false,
        },
    }
}

/// Product of the attacker's passive damage multipliers whose gate holds.
pub fn attacker_multiplier(
    attacker: &Battler,
    defender: &Battler,
    facts: SkillFacts,
    catalogue: &Catalogue,
) -> f64 {
    let ctx = ConditionContext::versus(attacker, defender, Some(facts));
    passive_product(attacker, EffectKind::DamageMult, Some(Trigger::OnDamageCalc), &ctx, catalogue)
}

/// Product of the defender's damage-taken multipliers, from statuses and passives.
pub fn defender_multiplier(
    attacker: &Battler,
    defender: &Battler,
    facts: SkillFacts,
    catalogue: &Catalogue,
) -> f64 {
    let ctx = ConditionContext::versus(attacker, defender, Some(facts));
    let from_status: f64 = defender
        .ledger()
        .components(catalogue)
        .filter(|c| c.kind == ComponentKind::DamageTakenMult)
        .filter(|c| evaluate(c.condition.as_ref(), &ctx, catalogue))
        .map(|c| c.value)
        .product();
    from_status * passive_product(defender, EffectKind::DamageTakenMult, None, &ctx, catalogue)
}

/// `trigger` of None accepts the effect whatever trigger it carries.
fn passive_product(
    owner: &Battler,
    kind: EffectKind,
    trigger: Option<Trigger>,
    ctx: &ConditionContext<'_>,
    catalogue: &Catalogue,
) -> f64 {
    owner
        .passive_skills
        .iter()
        .flat_map(|id| catalogue.skill_effects(*id).iter())
        .filter(|effect| effect.effect_type == kind)
        .filter(|effect| trigger.map_or(true, |t| effect.trigger == t))
        .filter(|effect| evaluate(effect.condition.as_ref(), ctx, catalogue))
        .map(|effect| effect.value.unwrap_or(1.0))
        .product()
}

/// Rolls one hit. Draws the random factor first, then the critical roll;
/// neither is drawn when its outcome is already certain.
pub fn compute_damage(
    attacker: &Battler,
    defender: &Battler,
    skill: Option<&Skill>,
    power_override: Option<f64>,
    catalogue: &Catalogue,
    options: &BattleOptions,
    rng: &mut impl BattleRng,
) -> DamageRoll {
    let power = power_override
        .or_else(|| skill.and_then(|s| s.power))
        .unwrap_or(options.default_skill_power);
    let atk = attacker.effective_stat(Stat::Atk, catalogue, options.stat_multiplier_range);
    let def = defender.effective_stat(Stat::Def, catalogue, options.stat_multiplier_range);
    let base = base_damage(power, atk, def);

    let facts = skill_facts(skill, attacker);
    let matchup = catalogue.matchup(facts.element_id, defender.element_id);
    let attacker_multiplier = attacker_multiplier(attacker, defender, facts, catalogue);
    let defender_multiplier = defender_multiplier(attacker, defender, facts, catalogue);

    let random_factor = if options.rand_max > options.rand_min {
        options.rand_min + rng.roll() * (options.rand_max - options.rand_min)
    } else {
        options.rand_min
    };
    let critical = rng.chance(options.crit_chance);
    let crit = if critical { options.crit_multiplier } else { 1.0 };

    let raw = base * matchup * attacker_multiplier * defender_multiplier * random_factor * crit;
    let amount = raw.floor().max(1.0) as u32;
    tracing::debug!(
        attacker = %attacker.name,
        defender = %defender.name,
        power,
        atk,
        def,
        base,
        matchup,
        attacker_multiplier,
        defender_multiplier,
        random_factor,
        critical,
        amount,
        "damage rolled"
    );
    DamageRoll {
        base,
        matchup,
        attacker_multiplier,
        defender_multiplier,
        random_factor,
        critical,
        amount,
    }
}
