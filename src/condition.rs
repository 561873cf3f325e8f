//! Gate predicates shared by conditional multipliers and synergy rules.

use crate::battler::Battler;
use crate::catalogue::Catalogue;
use crate::model::ElementId;
use serde::Deserialize;

/// Every present field must hold for the condition to pass.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub defender_has_status: Option<String>,
    #[serde(default)]
    pub target_has_status: Option<String>,
    #[serde(default)]
    pub skill_element_id: Option<ElementId>,
    #[serde(default)]
    pub is_ally_target: Option<bool>,
}

/// What is known about the skill being resolved.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SkillFacts {
    pub element_id: Option<ElementId>,
    pub ally_target: bool,
}

pub struct ConditionContext<'a> {
    pub attacker: &'a Battler,
    pub defender: &'a Battler,
    pub target: &'a Battler,
    pub skill: Option<SkillFacts>,
}

impl<'a> ConditionContext<'a> {
    /// Context where the effect target is the defender.
    pub fn versus(attacker: &'a Battler, defender: &'a Battler, skill: Option<SkillFacts>) -> Self {
        Self {
            attacker,
            defender,
            target: defender,
            skill,
        }
    }
}

pub fn evaluate(
    condition: Option<&Condition>,
    ctx: &ConditionContext<'_>,
    catalogue: &Catalogue,
) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    if let Some(name) = condition.defender_has_status.as_deref() {
        if !has_named_status(ctx.defender, name, catalogue) {
            return false;
        }
    }
    if let Some(name) = condition.target_has_status.as_deref() {
        if !has_named_status(ctx.target, name, catalogue) {
            return false;
        }
    }
    if let Some(required) = condition.skill_element_id {
        match ctx.skill {
            Some(facts) if facts.element_id == Some(required) => {}
            _ => return false,
        }
    }
    if let Some(required) = condition.is_ally_target {
        match ctx.skill {
            Some(facts) if facts.ally_target == required => {}
            _ => return false,
        }
    }
    true
}

fn has_named_status(battler: &Battler, name: &str, catalogue: &Catalogue) -> bool {
    match catalogue.status_id_by_name(name) {
        Some(id) => battler.has_status(id),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battler::test_support::{battler, catalogue_with_statuses};
    use crate::battler::Side;

    #[test]
    fn absent_condition_passes() {
        let catalogue = catalogue_with_statuses(&[]);
        let a = battler(Side::Player, 100, 100, 50);
        let d = battler(Side::Enemy, 100, 100, 50);
        assert!(evaluate(None, &ConditionContext::versus(&a, &d, None), &catalogue));
    }

    #[test]
    fn unresolved_status_names_fail_closed() {
        let catalogue = catalogue_with_statuses(&[(1, "burn")]);
        let a = battler(Side::Player, 100, 100, 50);
        let d = battler(Side::Enemy, 100, 100, 50);
        let condition = Condition {
            defender_has_status: Some("frostbite".to_string()),
            ..Condition::default()
        };
        assert!(!evaluate(
            Some(&condition),
            &ConditionContext::versus(&a, &d, None),
            &catalogue
        ));
    }

    #[test]
    fn defender_status_lookup_is_case_insensitive() {
        let catalogue = catalogue_with_statuses(&[(1, "burn")]);
        let a = battler(Side::Player, 100, 100, 50);
        let mut d = battler(Side::Enemy, 100, 100, 50);
        d.apply_status(1, 2, Default::default());
        let condition = Condition {
            defender_has_status: Some("Burn".to_string()),
            ..Condition::default()
        };
        assert!(evaluate(
            Some(&condition),
            &ConditionContext::versus(&a, &d, None),
            &catalogue
        ));
    }

    #[test]
    fn skill_gates_need_a_skill() {
        let catalogue = catalogue_with_statuses(&[]);
        let a = battler(Side::Player, 100, 100, 50);
        let d = battler(Side::Enemy, 100, 100, 50);
        let condition = Condition {
            skill_element_id: Some(3),
            is_ally_target: Some(false),
            ..Condition::default()
        };
        assert!(!evaluate(
            Some(&condition),
            &ConditionContext::versus(&a, &d, None),
            &catalogue
        ));
        let fire = SkillFacts {
            element_id: Some(3),
            ally_target: false,
        };
        assert!(evaluate(
            Some(&condition),
            &ConditionContext::versus(&a, &d, Some(fire)),
            &catalogue
        ));
        let self_buff = SkillFacts {
            element_id: Some(3),
            ally_target: true,
        };
        assert!(!evaluate(
            Some(&condition),
            &ConditionContext::versus(&a, &d, Some(self_buff)),
            &catalogue
        ));
    }
}
