use crate::battler::Battler;
use crate::condition::{evaluate, ConditionContext, SkillFacts};
use crate::effects::{CastContext, EffectEnv};
use crate::ledger::StatusMeta;
use crate::model::{SynergyModifier, Trigger};
use crate::rng::BattleRng;

/// Applies every cast-triggered synergy rule whose gate holds for the cast
/// just resolved. Rules run in catalogue order and see earlier rules' changes.
pub fn run_synergy<R: BattleRng>(
    env: &mut EffectEnv<'_, R>,
    attacker: &mut Battler,
    defender: &mut Battler,
    cast: &CastContext,
) -> usize {
    let catalogue = env.catalogue;
    let facts = SkillFacts {
        element_id: cast.element_id,
        ally_target: cast.ally_target,
    };
    let mut fired = 0;
    for rule in catalogue
        .synergy_rules()
        .iter()
        .filter(|rule| rule.trigger == Trigger::OnCast)
    {
        let holds = {
            let target: &Battler = if cast.ally_target { &*attacker } else { &*defender };
            let ctx = ConditionContext {
                attacker: &*attacker,
                defender: &*defender,
                target,
                skill: Some(facts),
            };
            evaluate(rule.condition.as_ref(), &ctx, catalogue)
        };
        if !holds || !env.rng.chance(rule.chance) {
            continue;
        }
        tracing::debug!(rule = rule.id, name = %rule.name, "synergy fired");
        apply_modifier(env, &rule.modifier, attacker, defender);
        fired += 1;
    }
    fired
}

fn apply_modifier<R: BattleRng>(
    env: &mut EffectEnv<'_, R>,
    modifier: &SynergyModifier,
    attacker: &mut Battler,
    defender: &mut Battler,
) {
    let catalogue = env.catalogue;
    if let Some(name) = modifier.remove_status.as_deref() {
        match catalogue.status_id_by_name(name) {
            Some(id) => {
                env.remove_status(defender, id);
            }
            None => env.logger.log_unknown(name),
        }
    }
    if let Some(name) = modifier.apply_status.as_deref() {
        match catalogue.status_id_by_name(name) {
            Some(id) => {
                env.apply_status(defender, id, modifier.apply_duration, StatusMeta::default());
            }
            None => env.logger.log_unknown(name),
        }
    }
    if let Some(name) = modifier.extend_status.as_deref() {
        let turns = modifier.extend_turns.unwrap_or(1);
        match catalogue.status_id_by_name(name) {
            Some(id) => {
                if defender.extend_status(id, turns) {
                    let left = defender
                        .ledger()
                        .status(id)
                        .map(|instance| instance.turns_left)
                        .unwrap_or(turns);
                    env.logger
                        .log_status(&defender.name, &catalogue.status_name(id), left);
                }
            }
            None => env.logger.log_unknown(name),
        }
    }
    if let Some(count) = modifier.cleanse_debuffs {
        env.cleanse(attacker, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battler::test_support::battler;
    use crate::battler::Side;
    use crate::catalogue::{Catalogue, CatalogueTables};
    use crate::effects::StatusRoles;
    use crate::logger::BattleLogger;
    use crate::options::BattleOptions;
    use crate::rng::ScriptedRng;

    fn catalogue(rules: &str) -> Catalogue {
        let json = format!(
            r#"{{
                "status_effects": [
                    {{"id": 1, "code": "wet", "default_duration": 2}},
                    {{"id": 2, "code": "freeze", "default_duration": 1}},
                    {{"id": 3, "code": "burn", "default_duration": 3}},
                    {{"id": 4, "code": "poison"}}
                ],
                "synergy_rules": {rules}
            }}"#
        );
        let tables: CatalogueTables = serde_json::from_str(&json).expect("tables parse");
        Catalogue::from_tables(tables)
    }

    fn run(
        catalogue: &Catalogue,
        rng: &mut ScriptedRng,
        attacker: &mut Battler,
        defender: &mut Battler,
        cast: CastContext,
    ) -> usize {
        let options = BattleOptions::deterministic();
        let roles = StatusRoles::resolve(catalogue, &options);
        let mut logger = BattleLogger::new();
        let mut env = EffectEnv {
            catalogue,
            options: &options,
            roles: &roles,
            logger: &mut logger,
            rng,
        };
        run_synergy(&mut env, attacker, defender, &cast)
    }

    fn ice_cast() -> CastContext {
        CastContext {
            skill_id: Some(1),
            element_id: Some(3),
            ally_target: false,
            last_damage: 20,
        }
    }

    #[test]
    fn wet_target_freezes_on_ice_hit() {
        let catalogue = catalogue(
            r#"[{"id": 1, "name": "Flash Freeze", "trigger": "ON_CAST",
                 "condition": {"defender_has_status": "Wet", "skill_element_id": 3},
                 "modifier": {"remove_status": "wet", "apply_status": "freeze"}}]"#,
        );
        let mut attacker = battler(Side::Player, 100, 100, 50);
        let mut defender = battler(Side::Enemy, 100, 100, 50);
        let mut rng = ScriptedRng::new([]);
        assert_eq!(run(&catalogue, &mut rng, &mut attacker, &mut defender, ice_cast()), 0);

        defender.apply_status(1, 2, StatusMeta::default());
        assert_eq!(run(&catalogue, &mut rng, &mut attacker, &mut defender, ice_cast()), 1);
        assert!(!defender.has_status(1));
        assert_eq!(defender.ledger().status(2).map(|s| s.turns_left), Some(1));
        assert_eq!(rng.drawn(), 0);
    }

    #[test]
    fn later_rules_see_earlier_changes() {
        let catalogue = catalogue(
            r#"[
                {"id": 1, "modifier": {"apply_status": "burn", "apply_duration": 2}},
                {"id": 2, "condition": {"defender_has_status": "burn"},
                 "modifier": {"extend_status": "burn", "extend_turns": 3, "cleanse_debuffs": 1}}
            ]"#,
        );
        let mut attacker = battler(Side::Player, 100, 100, 50);
        attacker.apply_status(4, 2, StatusMeta::default());
        let mut defender = battler(Side::Enemy, 100, 100, 50);
        let mut rng = ScriptedRng::new([]);
        assert_eq!(run(&catalogue, &mut rng, &mut attacker, &mut defender, ice_cast()), 2);
        assert_eq!(defender.ledger().status(3).map(|s| s.turns_left), Some(5));
        assert!(!attacker.has_status(4));
    }

    #[test]
    fn chance_gate_and_trigger_filter() {
        let catalogue = catalogue(
            r#"[
                {"id": 1, "chance": 0.3, "modifier": {"apply_status": "burn"}},
                {"id": 2, "trigger": "TURN_END", "modifier": {"apply_status": "poison"}}
            ]"#,
        );
        let mut attacker = battler(Side::Player, 100, 100, 50);
        let mut defender = battler(Side::Enemy, 100, 100, 50);
        let mut rng = ScriptedRng::new([0.5]);
        assert_eq!(run(&catalogue, &mut rng, &mut attacker, &mut defender, ice_cast()), 0);
        assert_eq!(rng.drawn(), 1);
        assert!(!defender.has_status(3));
        assert!(!defender.has_status(4));
    }
}
